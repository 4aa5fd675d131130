//! Stories command - list and filter CMS stories.
//!
//! Fetches every story (or reuses the five-minute cache), applies the
//! type, status and text filters in memory, and prints one page of the
//! result.

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use storydesk::cms::filter::{content_types, paginate};
use storydesk::cms::{filter_stories, FetchSource, StatusFilter, Story, StoryFetch, StoryFilter};
use storydesk::config::Config;

use crate::cli::context::CmsSession;
use crate::cli::{format_date, truncate_chars, OutputFormat};

/// Arguments for the stories command.
#[derive(clap::Args, Debug, Clone)]
#[command(after_help = "EXAMPLES:\n    \
    storydesk stories                        List published stories\n    \
    storydesk stories --type case_study      Only case studies\n    \
    storydesk stories --status draft         List drafts\n    \
    storydesk stories -q pricing             Search names, slugs and content\n    \
    storydesk stories --refresh              Bypass the cache\n    \
    storydesk stories --format json          Output as JSON")]
pub struct Args {
    /// Only show stories of this content type
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub content_type: Option<String>,

    /// Only show published or draft stories (draft fetches drafts)
    #[arg(short, long, value_enum, default_value = "any")]
    pub status: StatusFilter,

    /// Case-insensitive text search
    #[arg(short, long, value_name = "TEXT")]
    #[arg(
        long_help = "Case-insensitive substring search over the story name, slug,\n\
        full slug and the text of its content."
    )]
    pub query: Option<String>,

    /// Fetch from the CMS even if the cache is fresh
    #[arg(short, long)]
    pub refresh: bool,

    /// Fetch drafts as well as published stories
    #[arg(long)]
    pub include_drafts: bool,

    /// Page of results to show
    #[arg(short, long, default_value = "1", value_name = "N")]
    pub page: usize,

    /// Stories per page (0 shows all)
    #[arg(long, default_value = "20", value_name = "N")]
    pub per_page: usize,

    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl Args {
    /// Drafts are fetched when asked for directly or when filtering on them.
    fn fetch_drafts(&self) -> bool {
        self.include_drafts || self.status == StatusFilter::Draft
    }

    fn filter(&self) -> StoryFilter {
        StoryFilter {
            content_type: self.content_type.clone(),
            status: self.status,
            query: self.query.clone(),
        }
    }
}

/// JSON shape of a story listing.
#[derive(Serialize)]
struct StoryListing<'a> {
    source: FetchSource,
    fetched_at: Option<DateTime<Utc>>,
    error: Option<String>,
    total: usize,
    matching: usize,
    page: usize,
    total_pages: usize,
    stories: Vec<&'a Story>,
}

/// Executes the stories command.
pub fn run(args: Args) -> Result<()> {
    let config = Config::load()?;
    let mut session = CmsSession::open(&config)?;
    execute(&mut session, &args)
}

/// Lists stories through an open session.
pub fn execute(session: &mut CmsSession, args: &Args) -> Result<()> {
    let fetch = session.stories(args.fetch_drafts(), args.refresh);
    let matches = filter_stories(&fetch.stories, &args.filter());
    let slice = paginate(&matches, args.page, args.per_page);

    if args.format == OutputFormat::Json {
        let listing = StoryListing {
            source: fetch.source,
            fetched_at: fetch.fetched_at,
            error: fetch.error.as_ref().map(|e| e.to_string()),
            total: fetch.stories.len(),
            matching: matches.len(),
            page: slice.page,
            total_pages: slice.total_pages,
            stories: slice.items.to_vec(),
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    report_fetch(&fetch);

    if fetch.stories.is_empty() {
        println!("{}", "No stories available.".dimmed());
        return Ok(());
    }

    if matches.is_empty() {
        println!("{}", "No stories match the current filters.".dimmed());
        let types = content_types(&fetch.stories);
        if !types.is_empty() {
            println!("Content types: {}", types.join(", "));
        }
        return Ok(());
    }

    const ID_WIDTH: usize = 12;
    const NAME_WIDTH: usize = 36;
    const TYPE_WIDTH: usize = 16;
    const STATUS_WIDTH: usize = 9;

    println!(
        "{}",
        format!(
            "{:<ID_WIDTH$}  {:<NAME_WIDTH$}  {:<TYPE_WIDTH$}  {:<STATUS_WIDTH$}  {}",
            "ID", "NAME", "TYPE", "STATUS", "UPDATED"
        )
        .bold()
    );

    for story in slice.items {
        let status = story.status().to_string();
        let status = if story.published {
            format!("{:<STATUS_WIDTH$}", status).green()
        } else {
            format!("{:<STATUS_WIDTH$}", status).yellow()
        };
        println!(
            "{:<ID_WIDTH$}  {:<NAME_WIDTH$}  {:<TYPE_WIDTH$}  {}  {}",
            story.id.to_string().cyan(),
            truncate_chars(&story.name, NAME_WIDTH),
            truncate_chars(story.content_type(), TYPE_WIDTH),
            status,
            format_date(story.updated_at).dimmed()
        );
    }

    println!();
    println!(
        "{}",
        format!(
            "Page {} of {} | {} of {} stories match",
            slice.page,
            slice.total_pages,
            matches.len(),
            fetch.stories.len()
        )
        .dimmed()
    );

    Ok(())
}

/// Prints where the stories came from and any fetch error.
pub(crate) fn report_fetch(fetch: &StoryFetch) {
    let fetched = format_date(fetch.fetched_at);
    match fetch.source {
        FetchSource::Cache => {
            println!("{}", format!("Using cached stories from {fetched}").dimmed());
        }
        FetchSource::Network => {
            println!("{}", format!("Fetched stories at {fetched}").dimmed());
        }
        FetchSource::Fallback => {
            println!(
                "{} {}",
                "Could not refresh stories:".yellow(),
                error_text(fetch)
            );
            println!(
                "{}",
                format!("Showing cached stories from {fetched}. Retry with --refresh.").dimmed()
            );
        }
        FetchSource::Unavailable => {
            println!("{} {}", "Could not fetch stories:".red(), error_text(fetch));
            println!("{}", "Retry with --refresh.".dimmed());
        }
    }
    println!();
}

fn error_text(fetch: &StoryFetch) -> String {
    fetch
        .error
        .as_ref()
        .map(|e| e.to_string())
        .unwrap_or_default()
}
