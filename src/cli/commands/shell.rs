//! Shell command - interactive session over one story cache.
//!
//! Each input line runs one action. The CMS and CRM connections and the
//! story cache live for the whole session, so repeated listings within
//! five minutes reuse the same fetch.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use storydesk::config::Config;

use super::{company, groups, notes, stories, story};
use crate::cli::context::{CmsSession, CrmSession};

/// Arguments for the shell command.
#[derive(clap::Args, Debug)]
#[command(after_help = "EXAMPLES:\n    \
    storydesk shell\n    \
    storydesk> stories --type case_study\n    \
    storydesk> story 412345678\n    \
    storydesk> notes --company-id 39594287242 --attendees Alice\n    \
    storydesk> quit")]
pub struct Args {}

/// One line of shell input.
#[derive(Parser, Debug)]
#[command(
    name = "shell",
    no_binary_name = true,
    disable_version_flag = true,
    subcommand_required = true
)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    /// List and filter stories
    Stories(stories::Args),
    /// Show one story
    Story(story::Args),
    /// Show translation groups
    Groups(groups::Args),
    /// Look up a CRM company
    Company(company::Args),
    /// Draft meeting notes
    Notes(notes::Args),
    /// Fetch stories now, ignoring the cache
    Refresh,
    /// Drop the cached stories
    Clear,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

/// Executes the shell command.
pub fn run(_args: Args) -> Result<()> {
    let config = Config::load()?;
    let mut cms = CmsSession::open(&config)?;
    let crm = CrmSession::open(&config)?;

    println!("{}", "Storydesk shell".bold());
    println!(
        "{}",
        "Type 'help' for commands, 'quit' to leave.".dimmed()
    );

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut line = String::new();

    loop {
        print!("{} ", "storydesk>".cyan());
        io::stdout().flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            println!();
            break;
        }

        let words = match split_words(&line) {
            Ok(words) if words.is_empty() => continue,
            Ok(words) => words,
            Err(e) => {
                eprintln!("{} {}", "Error:".red(), e);
                continue;
            }
        };

        let parsed = match ShellLine::try_parse_from(&words) {
            Ok(parsed) => parsed,
            Err(e) => {
                // Help output and usage errors both arrive here
                if let Err(err) = e.print() {
                    tracing::debug!("Failed to print usage: {}", err);
                }
                continue;
            }
        };

        let result = match parsed.command {
            ShellCommand::Stories(args) => stories::execute(&mut cms, &args),
            ShellCommand::Story(args) => story::execute(&mut cms, &args),
            ShellCommand::Groups(args) => groups::execute(&mut cms, &args),
            ShellCommand::Company(args) => company::execute(&crm, &args),
            ShellCommand::Notes(args) => notes::execute(Some(&crm), &args),
            ShellCommand::Refresh => {
                let fetch = cms.stories(false, true);
                stories::report_fetch(&fetch);
                println!("{} stories", fetch.stories.len());
                Ok(())
            }
            ShellCommand::Clear => {
                cms.clear_cache();
                println!("{}", "Story cache cleared.".dimmed());
                Ok(())
            }
            ShellCommand::Quit => break,
        };

        if let Err(e) = result {
            eprintln!("{} {:#}", "Error:".red(), e);
        }
    }

    Ok(())
}

/// Splits a line into words, honouring single and double quotes and
/// backslash escapes.
fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('"'), '\\') | (None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_word = true;
            }
            (Some(_), c) => current.push(c),
            (None, '"') | (None, '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if let Some(q) = quote {
        return Err(format!("Unterminated {q} quote"));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
