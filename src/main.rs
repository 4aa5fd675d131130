use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::commands;

/// The main CLI command line interface.
#[derive(Parser)]
#[command(name = "storydesk")]
#[command(version)]
#[command(about = "Browse CMS stories and draft meeting notes from CRM company records")]
#[command(long_about = "Storydesk lists and searches the stories of a Storyblok space,\n\
    shows translation coverage, looks up HubSpot companies, and drafts\n\
    meeting notes seeded with company details.\n\n\
    Stories are cached for five minutes. Use 'storydesk shell' to keep\n\
    the cache across several commands.")]
#[command(after_help = "EXAMPLES:\n    \
    storydesk stories                    List published stories\n    \
    storydesk stories -q pricing         Search stories\n    \
    storydesk story 412345678            Show one story\n    \
    storydesk groups --missing-locales   Pages lacking translations\n    \
    storydesk company 39594287242        Look up a company\n    \
    storydesk notes --company-id 39594287242 --attendees Alice\n    \
    storydesk shell                      Interactive session\n\n\
    For more information about a command, run 'storydesk <command> --help'.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Commands {
    /// List and filter CMS stories
    #[command(long_about = "Fetches every story of the configured space (25 per page, up to\n\
        2500) or reuses the five-minute cache, then filters by content\n\
        type, publication status and free text.")]
    Stories(commands::stories::Args),

    /// Show one story in detail
    Story(commands::story::Args),

    /// Show translation groups and locale coverage
    #[command(long_about = "Groups stories that are translations of the same page and shows\n\
        which locales exist, which are published, and overall coverage.")]
    Groups(commands::groups::Args),

    /// Look up a CRM company by ID
    Company(commands::company::Args),

    /// Draft meeting notes for a company
    #[command(long_about = "Renders meeting notes from a fixed template. The company is\n\
        looked up in the CRM when an ID is given, directly or through an\n\
        entry link carrying hs_id. A failed lookup leaves the company\n\
        section empty.")]
    Notes(commands::notes::Args),

    /// Interactive session sharing one story cache
    Shell(commands::shell::Args),

    /// View configuration settings
    #[command(long_about = "Shows the effective configuration and where each API key comes\n\
        from. Configuration is stored in ~/.storydesk/config.yaml.")]
    Config(commands::config::Args),

    /// Manage API keys in the OS keyring
    Secrets(commands::secrets::Args),

    /// Generate shell completion scripts
    Completions(commands::completions::Args),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "storydesk=debug"
    } else {
        "storydesk=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Stories(args) => commands::stories::run(args),
        Commands::Story(args) => commands::story::run(args),
        Commands::Groups(args) => commands::groups::run(args),
        Commands::Company(args) => commands::company::run(args),
        Commands::Notes(args) => commands::notes::run(args),
        Commands::Shell(args) => commands::shell::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Secrets(args) => commands::secrets::run(args),
        Commands::Completions(args) => {
            commands::completions::generate_completions(&mut Cli::command(), args.shell);
            Ok(())
        }
    }
}
