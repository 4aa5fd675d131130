//! CLI commands for Storydesk.
//!
//! Each submodule implements a single CLI command with its argument
//! parsing and execution logic. Commands that talk to a service also
//! expose an `execute` function used by the interactive shell.

/// Look up a CRM company.
pub mod company;

/// Shell completion scripts.
pub mod completions;

/// Configuration viewing.
pub mod config;

/// Translation groups and locale coverage.
pub mod groups;

/// Meeting-note drafting.
pub mod notes;

/// API key management.
pub mod secrets;

/// Interactive session sharing one story cache.
pub mod shell;

/// List and filter stories.
pub mod stories;

/// Show one story.
pub mod story;
