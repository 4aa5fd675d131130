//! Completions command - generate shell completion scripts.
//!
//! Generates shell completion scripts that can be installed to enable
//! tab-completion of Storydesk commands and options.

use clap::Command;
use clap_complete::{generate, Shell};
use std::io;

/// Arguments for the completions command.
#[derive(clap::Args, Debug)]
#[command(after_help = "EXAMPLES:\n    \
    storydesk completions bash > ~/.local/share/bash-completion/completions/storydesk\n    \
    storydesk completions zsh > ~/.zfunc/_storydesk\n    \
    storydesk completions fish > ~/.config/fish/completions/storydesk.fish")]
pub struct Args {
    /// Shell to generate completions for
    #[arg(value_name = "SHELL")]
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Writes completions for `cmd` to stdout.
///
/// Called from main.rs, which owns the top-level `Cli` definition.
pub fn generate_completions(cmd: &mut Command, shell: Shell) {
    generate(shell, cmd, "storydesk", &mut io::stdout());
}
