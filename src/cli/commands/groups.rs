//! Groups command - translation coverage across locales.
//!
//! Groups stories that share a translation group and shows, per page,
//! which locales exist and whether each variant is published.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use storydesk::cms::filter::paginate;
use storydesk::cms::grouping::{
    group_by_translation, sort_groups, summarize_groups, GroupFilter, GroupSort, GroupSummary,
    StoryGroup, DEFAULT_LOCALES,
};
use storydesk::config::Config;

use crate::cli::commands::stories::report_fetch;
use crate::cli::context::CmsSession;
use crate::cli::{truncate_chars, OutputFormat};

/// Arguments for the groups command.
#[derive(clap::Args, Debug, Clone)]
#[command(after_help = "EXAMPLES:\n    \
    storydesk groups                       All translation groups\n    \
    storydesk groups --missing-locales     Pages lacking a translation\n    \
    storydesk groups --include-drafts      Include unpublished variants\n    \
    storydesk groups --locales en,fr       Only consider English and French\n    \
    storydesk groups --name pricing        Groups with a matching page name\n    \
    storydesk groups --sort drafts --asc   Fewest draft variants first\n    \
    storydesk groups --page 2 --per-page 50")]
pub struct Args {
    /// Only show groups missing at least one locale
    #[arg(long)]
    pub missing_locales: bool,

    /// Only show groups with a published variant
    #[arg(long)]
    pub published: bool,

    /// Only show groups with a draft variant (fetches drafts)
    #[arg(long)]
    pub drafts: bool,

    /// Only show groups with a variant whose name contains this text
    #[arg(long, value_name = "TEXT")]
    pub name: Option<String>,

    /// Only show groups with a variant of this content type
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub content_type: Option<String>,

    /// Locales to check, in display order
    #[arg(long, value_delimiter = ',', value_name = "LOCALES")]
    pub locales: Vec<String>,

    /// Fetch drafts as well as published stories
    #[arg(long)]
    pub include_drafts: bool,

    /// Fetch from the CMS even if the cache is fresh
    #[arg(short, long)]
    pub refresh: bool,

    /// Order groups by locale, published or draft count
    #[arg(long, value_enum, default_value = "locales")]
    pub sort: GroupSort,

    /// Smallest counts first
    #[arg(long, conflicts_with = "desc")]
    pub asc: bool,

    /// Largest counts first (default)
    #[arg(long)]
    pub desc: bool,

    /// Page of groups to show
    #[arg(short, long, default_value = "1", value_name = "N")]
    pub page: usize,

    /// Groups per page (0 shows all)
    #[arg(long, default_value = "25", value_name = "N")]
    pub per_page: usize,

    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl Args {
    /// Drafts are fetched when asked for directly or when filtering on them.
    fn fetch_drafts(&self) -> bool {
        self.include_drafts || self.drafts
    }
}

#[derive(Serialize)]
struct GroupReport<'a> {
    summary: GroupSummary,
    matching: usize,
    page: usize,
    total_pages: usize,
    groups: Vec<&'a StoryGroup>,
}

/// Executes the groups command.
pub fn run(args: Args) -> Result<()> {
    let config = Config::load()?;
    let mut session = CmsSession::open(&config)?;
    execute(&mut session, &args)
}

/// Shows translation groups through an open session.
pub fn execute(session: &mut CmsSession, args: &Args) -> Result<()> {
    let fetch = session.stories(args.fetch_drafts(), args.refresh);

    let locales: Vec<&str> = if args.locales.is_empty() {
        DEFAULT_LOCALES.to_vec()
    } else {
        args.locales.iter().map(|l| l.trim()).filter(|l| !l.is_empty()).collect()
    };

    let groups = group_by_translation(&fetch.stories, &locales);
    let filter = GroupFilter {
        any_published: args.published,
        any_draft: args.drafts,
        missing_locales: args.missing_locales,
        name: args.name.clone(),
        content_type: args.content_type.clone(),
    };
    let mut shown: Vec<&StoryGroup> = groups
        .iter()
        .filter(|g| filter.matches(g, &locales))
        .collect();
    sort_groups(&mut shown, args.sort, !args.asc);
    let slice = paginate(&shown, args.page, args.per_page);
    let summary = summarize_groups(&groups, &locales);

    if args.format == OutputFormat::Json {
        let report = GroupReport {
            summary,
            matching: shown.len(),
            page: slice.page,
            total_pages: slice.total_pages,
            groups: slice.items.to_vec(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    report_fetch(&fetch);

    println!(
        "{} groups | {} pages | {} published | {:.0}% locale coverage",
        summary.total_groups.to_string().bold(),
        summary.total_pages.to_string().bold(),
        summary.published_pages.to_string().bold(),
        summary.coverage
    );
    println!();

    if shown.is_empty() {
        println!("{}", "No translation groups match the current filters.".dimmed());
        return Ok(());
    }

    const NAME_WIDTH: usize = 32;
    const LOCALE_WIDTH: usize = 6;

    let header: String = locales
        .iter()
        .map(|l| format!("{:<LOCALE_WIDTH$}", truncate_chars(l, LOCALE_WIDTH)))
        .collect::<Vec<_>>()
        .join(" ");
    println!("{}", format!("{:<NAME_WIDTH$}  {}  TYPES", "PAGE", header).bold());

    for group in slice.items {
        let cells: Vec<String> = locales
            .iter()
            .map(|locale| {
                let cell = match group.entry(locale) {
                    Some(e) if e.published => format!("{:<LOCALE_WIDTH$}", "✓").green(),
                    Some(_) => format!("{:<LOCALE_WIDTH$}", "○").yellow(),
                    None => format!("{:<LOCALE_WIDTH$}", "-").dimmed(),
                };
                cell.to_string()
            })
            .collect();

        let name = group.page_name(&locales);
        let name = if name.is_empty() { "(unnamed)" } else { name };

        println!(
            "{:<NAME_WIDTH$}  {}  {}",
            truncate_chars(name, NAME_WIDTH),
            cells.join(" "),
            group.content_types().dimmed()
        );
    }

    println!();
    println!("{}", "✓ published   ○ draft   - missing".dimmed());
    println!(
        "{}",
        format!(
            "Page {} of {} | {} of {} groups match",
            slice.page,
            slice.total_pages,
            shown.len(),
            groups.len()
        )
        .dimmed()
    );

    Ok(())
}
