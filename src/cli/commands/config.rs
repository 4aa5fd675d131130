//! Config command - show the effective configuration

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use storydesk::config::{find_credential, Config, KeyringStore, Service};

#[derive(clap::Args, Debug)]
#[command(after_help = "EXAMPLES:\n    \
    storydesk config           Show the effective configuration\n    \
    storydesk config path      Print the config file location\n\n\
    Set STORYDESK_CONFIG to use a different config file.")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<ConfigCommand>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration and credential sources
    Show,
    /// Print the config file path
    Path,
}

pub fn run(args: Args) -> Result<()> {
    match args.command {
        Some(ConfigCommand::Show) | None => show_config(),
        Some(ConfigCommand::Path) => {
            println!("{}", Config::config_path()?.display());
            Ok(())
        }
    }
}

fn show_config() -> Result<()> {
    let path = Config::config_path()?;
    let config = Config::load()?;

    println!("{}", "Storydesk Configuration".bold());
    println!();

    let file_note = if path.exists() { "" } else { " (not found, using defaults)" };
    println!(
        "  {}  {}{}",
        "File:".dimmed(),
        path.display(),
        file_note.dimmed()
    );

    println!();
    println!("{}", "CMS:".bold());
    println!("  {}  {}", "API:           ".dimmed(), config.cms.base_url);
    println!(
        "  {}  {}",
        "Space:         ".dimmed(),
        config
            .cms
            .space_id
            .as_deref()
            .unwrap_or("(not set)")
    );
    println!(
        "  {}  {}",
        "Published only:".dimmed(),
        config.cms.published_only
    );
    println!("  {}  {}", "Editor:        ".dimmed(), config.cms.editor_url);

    println!();
    println!("{}", "CRM:".bold());
    println!("  {}  {}", "API:   ".dimmed(), config.crm.base_url);
    println!("  {}  {}", "App:   ".dimmed(), config.crm.app_url);
    println!(
        "  {}  {}",
        "Portal:".dimmed(),
        config.crm.portal_id.as_deref().unwrap_or("(not set)")
    );

    println!();
    println!("{}", "HTTP:".bold());
    println!(
        "  {}  {}s connect, {}s request",
        "Timeouts:".dimmed(),
        config.http.connect_timeout_secs,
        config.http.request_timeout_secs
    );

    println!();
    println!("{}", "Credentials:".bold());
    print_credential_sources();

    Ok(())
}

/// Prints where each API key resolves from, never the key itself.
pub(crate) fn print_credential_sources() {
    for service in Service::ALL {
        let env = |name: &str| std::env::var(name).ok();
        match find_credential(service, env, &KeyringStore) {
            Ok(Some(cred)) => println!(
                "  {} {:<4} from {}",
                "✓".green(),
                service.to_string(),
                cred.source
            ),
            Ok(None) => println!(
                "  {} {:<4} {}",
                "✗".red(),
                service.to_string(),
                format!("not set ({} or keyring)", service.env_var()).dimmed()
            ),
            Err(e) => println!("  {} {:<4} {}", "✗".red(), service.to_string(), e),
        }
    }
}
