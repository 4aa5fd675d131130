//! Secrets command - manage API keys in the OS keyring.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use colored::Colorize;

use storydesk::config::{KeyringStore, SecretStore, Service};

use super::config::print_credential_sources;

#[derive(clap::Args, Debug)]
#[command(after_help = "EXAMPLES:\n    \
    storydesk secrets set cms       Store the CMS management token\n    \
    storydesk secrets set crm       Store the CRM access token\n    \
    storydesk secrets status        Show where each key comes from\n    \
    storydesk secrets delete crm    Remove the stored CRM token\n\n\
    Environment variables STORYDESK_CMS_API_KEY and STORYDESK_CRM_API_KEY\n    \
    take precedence over the keyring.")]
pub struct Args {
    #[command(subcommand)]
    pub command: SecretsCommand,
}

#[derive(Subcommand, Debug)]
pub enum SecretsCommand {
    /// Prompt for an API key and store it in the keyring
    Set {
        #[arg(value_enum)]
        service: Service,
    },
    /// Remove an API key from the keyring
    Delete {
        #[arg(value_enum)]
        service: Service,
    },
    /// Show which source each API key resolves from
    Status,
}

pub fn run(args: Args) -> Result<()> {
    let store = KeyringStore;
    match args.command {
        SecretsCommand::Set { service } => set_secret(&store, service),
        SecretsCommand::Delete { service } => {
            if store.delete(service)? {
                println!("{} Removed the {} API key from the keyring", "✓".green(), service);
            } else {
                println!("{}", format!("No {service} API key stored in the keyring").dimmed());
            }
            Ok(())
        }
        SecretsCommand::Status => {
            println!("{}", "API keys".bold());
            print_credential_sources();
            Ok(())
        }
    }
}

/// Prompts for a key with hidden input and stores it.
fn set_secret(store: &dyn SecretStore, service: Service) -> Result<()> {
    print!("{} API key (hidden input): ", service.to_string().to_uppercase());
    io::stdout().flush()?;

    let key = rpassword::read_password().context("Failed to read API key")?;
    let key = key.trim();
    if key.is_empty() {
        bail!("No key entered, nothing stored");
    }

    store.set(service, key)?;

    let count = key.chars().count();
    let masked = if count > 4 {
        format!("...{}", key.chars().skip(count - 4).collect::<String>())
    } else {
        "****".to_string()
    };
    println!(
        "{} Stored {} API key {}",
        "✓".green(),
        service,
        masked.dimmed()
    );

    if std::env::var(service.env_var()).is_ok_and(|v| !v.trim().is_empty()) {
        println!(
            "{}",
            format!("Note: {} is set and takes precedence.", service.env_var()).yellow()
        );
    }

    Ok(())
}
