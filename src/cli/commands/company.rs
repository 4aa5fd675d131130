//! Company command - look up a CRM company record.

use anyhow::{bail, Result};
use colored::Colorize;
use serde::Serialize;

use storydesk::config::Config;
use storydesk::crm::{Company, LookupError};

use crate::cli::context::CrmSession;
use crate::cli::OutputFormat;

/// Arguments for the company command.
#[derive(clap::Args, Debug, Clone)]
#[command(after_help = "EXAMPLES:\n    \
    storydesk company 39594287242          Show key properties\n    \
    storydesk company 39594287242 --all    Show every property\n    \
    storydesk company 39594287242 -f json  Output as JSON")]
pub struct Args {
    /// CRM company ID
    #[arg(value_name = "ID")]
    pub id: String,

    /// Show every property, not just the highlights
    #[arg(short, long)]
    pub all: bool,

    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct CompanyReport<'a> {
    #[serde(flatten)]
    company: &'a Company,
    record_url: Option<String>,
}

/// Executes the company command.
pub fn run(args: Args) -> Result<()> {
    let config = Config::load()?;
    let session = CrmSession::open(&config)?;
    execute(&session, &args)
}

/// Looks up a company through an open session.
pub fn execute(session: &CrmSession, args: &Args) -> Result<()> {
    let company = match session.lookup(&args.id) {
        Ok(company) => company,
        Err(e @ LookupError::Transient(_)) => {
            bail!("{e}\nThe CRM may be temporarily unavailable. Run the lookup again.")
        }
        Err(e) => bail!(e),
    };
    let record_url = session.record_link(&company.id);

    if args.format == OutputFormat::Json {
        let report = CompanyReport {
            company: &company,
            record_url,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let name = if company.name.is_empty() {
        "(unnamed company)"
    } else {
        company.name.as_str()
    };
    println!("{}", name.bold());
    println!();
    println!("  {}  {}", "ID:".dimmed(), company.id.cyan());

    if args.all {
        for (key, value) in &company.properties {
            println!("  {}  {}", format!("{key}:").dimmed(), value);
        }
    } else {
        for (label, value) in company.highlights() {
            println!("  {}  {}", format!("{label}:").dimmed(), value);
        }
    }

    if let Some(url) = record_url {
        println!();
        println!("  {}  {}", "Record:".dimmed(), url);
    }

    Ok(())
}
