//! Notes command - draft meeting notes for a company.
//!
//! The company id comes from `--company-id`, or from an entry link
//! carrying `hs_id`. When set, the company is looked up in the CRM and
//! its details seed the note. A failed lookup is reported and the note
//! is rendered with an empty company.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use colored::Colorize;
use serde_json::Value;

use storydesk::config::Config;
use storydesk::crm::{Company, LookupError};
use storydesk::notes::entry::initial_company_id;
use storydesk::notes::{parse_assignment, MeetingNote, NoteForm, NOTE_FIELDS};

use crate::cli::context::CrmSession;
use crate::cli::OutputFormat;

/// Arguments for the notes command.
#[derive(clap::Args, Debug, Clone)]
#[command(after_help = "EXAMPLES:\n    \
    storydesk notes --company-id 39594287242 --attendees \"Alice, Bob\"\n    \
    storydesk notes --link 'https://notes.example.com/?hs_id=39594287242'\n    \
    storydesk notes --field current_tms=Shippeo --field number_truckers=40\n    \
    storydesk notes --fields-file answers.yaml -f json\n    \
    storydesk notes --list-fields          Show every form field\n\n\
    A --company-id always wins over the id in --link.")]
pub struct Args {
    /// Entry link or query string carrying hs_id=<company id>
    #[arg(long, alias = "hs-id", value_name = "LINK")]
    pub link: Option<String>,

    /// CRM company ID (overrides the id from --link)
    #[arg(short, long, value_name = "ID")]
    pub company_id: Option<String>,

    /// Meeting attendees
    #[arg(short, long, value_name = "NAMES")]
    pub attendees: Option<String>,

    /// Meeting date (defaults to today)
    #[arg(short, long, value_name = "DATE")]
    pub date: Option<String>,

    /// Set a form field (repeatable)
    #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    pub fields: Vec<(String, String)>,

    /// Read form fields from a YAML or JSON mapping
    #[arg(long, value_name = "PATH")]
    pub fields_file: Option<PathBuf>,

    /// List the form fields and exit
    #[arg(long)]
    pub list_fields: bool,

    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Executes the notes command.
pub fn run(args: Args) -> Result<()> {
    if args.list_fields {
        list_fields();
        return Ok(());
    }

    let company_id = initial_company_id(args.link.as_deref(), args.company_id.as_deref());
    let session = if company_id.is_empty() {
        None
    } else {
        let config = Config::load()?;
        Some(CrmSession::open(&config)?)
    };
    execute(session.as_ref(), &args)
}

/// Renders a note, looking up the company through `session` when an id is
/// given.
pub fn execute(session: Option<&CrmSession>, args: &Args) -> Result<()> {
    if args.list_fields {
        list_fields();
        return Ok(());
    }

    let form = build_form(args)?;
    for key in form.unknown_keys() {
        eprintln!(
            "{} Unknown field '{}' is ignored. Run with --list-fields to see valid names.",
            "Warning:".yellow(),
            key
        );
    }

    let company_id = initial_company_id(args.link.as_deref(), args.company_id.as_deref());
    let company = match (session, company_id.is_empty()) {
        (_, true) => Company::default(),
        (Some(session), false) => lookup_or_empty(session, &company_id),
        (None, false) => {
            eprintln!(
                "{} No CRM connection, company {} was not looked up.",
                "Warning:".yellow(),
                company_id
            );
            Company::default()
        }
    };

    let note = MeetingNote::build(&company, &form);

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&note)?),
        OutputFormat::Text => print!("{}", note.render_text()),
    }

    Ok(())
}

fn lookup_or_empty(session: &CrmSession, company_id: &str) -> Company {
    match session.lookup(company_id) {
        Ok(company) => company,
        Err(e) => {
            let hint = match e {
                LookupError::Transient(_) => " Run the command again to retry.",
                _ => "",
            };
            eprintln!(
                "{} {}.{} Continuing with an empty company.",
                "Company lookup failed:".yellow(),
                e,
                hint
            );
            Company::default()
        }
    }
}

/// Collects form values: the fields file first, then `--field` values,
/// then the dedicated flags.
fn build_form(args: &Args) -> Result<NoteForm> {
    let mut form = NoteForm::new();

    if let Some(path) = &args.fields_file {
        for (key, value) in read_fields_file(path)? {
            form.set(key, value);
        }
    }
    for (key, value) in &args.fields {
        form.set(key.trim(), value.as_str());
    }
    if let Some(attendees) = &args.attendees {
        form.set("attendees", attendees.as_str());
    }

    let date = args
        .date
        .clone()
        .unwrap_or_else(|| Local::now().format("%Y-%m-%d").to_string());
    if form.get("date").is_none() || args.date.is_some() {
        form.set("date", date);
    }

    Ok(form)
}

/// Reads a flat mapping of field names to scalar values.
///
/// JSON is a subset of YAML, so one parser covers both.
fn read_fields_file(path: &Path) -> Result<BTreeMap<String, String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read fields file {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    let raw: BTreeMap<String, Value> = serde_saphyr::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Invalid fields file {}: {}", path.display(), e))?;

    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| scalar_text(&value).map(|text| (key, text)))
        .collect())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(scalar_text)
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        Value::Null | Value::Object(_) => None,
    }
}

fn list_fields() {
    println!("{}", "Note fields".bold());
    println!();
    for field in NOTE_FIELDS {
        let marker = if field.checklist {
            "*".cyan().to_string()
        } else {
            " ".to_string()
        };
        println!("  {} {:<30} {}", marker, field.key, field.label.dimmed());
    }
    println!();
    println!("{}", "* counted in the completion checklist".dimmed());
}
