//! Story command - show one story in detail.

use anyhow::{bail, Result};
use colored::Colorize;

use storydesk::cms::{FetchSource, Story};
use storydesk::config::Config;

use crate::cli::commands::stories::report_fetch;
use crate::cli::context::CmsSession;
use crate::cli::{format_date, truncate_chars, OutputFormat};

/// Characters of flattened content shown in the preview.
const PREVIEW_CHARS: usize = 600;

/// Arguments for the story command.
#[derive(clap::Args, Debug, Clone)]
#[command(after_help = "EXAMPLES:\n    \
    storydesk story 412345678          Show a story\n    \
    storydesk story 412345678 --full   Show all content text\n    \
    storydesk story 412345678 -f json  Output as JSON")]
pub struct Args {
    /// Story ID
    #[arg(value_name = "ID")]
    pub id: u64,

    /// Show the full content text instead of a preview
    #[arg(long)]
    pub full: bool,

    /// Look among drafts as well as published stories
    #[arg(long)]
    pub include_drafts: bool,

    /// Fetch from the CMS even if the cache is fresh
    #[arg(short, long)]
    pub refresh: bool,

    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Executes the story command.
pub fn run(args: Args) -> Result<()> {
    let config = Config::load()?;
    let mut session = CmsSession::open(&config)?;
    execute(&mut session, &args)
}

/// Shows a story through an open session.
pub fn execute(session: &mut CmsSession, args: &Args) -> Result<()> {
    let fetch = session.stories(args.include_drafts, args.refresh);

    let Some(story) = fetch.stories.iter().find(|s| s.id == args.id) else {
        if fetch.source == FetchSource::Unavailable {
            report_fetch(&fetch);
        }
        bail!("No story with ID {}", args.id);
    };

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(story)?);
        return Ok(());
    }

    if fetch.error.is_some() {
        report_fetch(&fetch);
    }
    print_story(story, &session.editor_link(story), args.full);
    Ok(())
}

fn print_story(story: &Story, editor_link: &str, full: bool) {
    println!("{}", story.name.bold());
    println!();

    let status = if story.published {
        story.status().to_string().green()
    } else {
        story.status().to_string().yellow()
    };

    println!("  {}  {}", "ID:       ".dimmed(), story.id.to_string().cyan());
    println!("  {}  {}", "Type:     ".dimmed(), story.content_type());
    println!("  {}  {}", "Status:   ".dimmed(), status);
    println!("  {}  {}", "Slug:     ".dimmed(), story.full_slug);
    if let Some(group) = story.group_id.as_deref() {
        println!("  {}  {}", "Group:    ".dimmed(), group);
    }
    println!("  {}  {}", "Created:  ".dimmed(), format_date(story.created_at));
    println!("  {}  {}", "Updated:  ".dimmed(), format_date(story.updated_at));
    println!("  {}  {}", "Published:".dimmed(), format_date(story.published_at));
    println!("  {}  {}", "Editor:   ".dimmed(), editor_link);

    let text = story.content_text();
    println!();
    if text.trim().is_empty() {
        println!("{}", "(no text content)".dimmed());
    } else if full {
        println!("{text}");
    } else {
        println!("{}", truncate_chars(&text, PREVIEW_CHARS));
    }
}
