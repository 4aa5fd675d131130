//! Command-line interface for Storydesk.
//!
//! Provides the commands for browsing CMS stories, looking up CRM
//! companies and drafting meeting notes.

/// Individual CLI command implementations.
pub mod commands;

/// Service handles opened from the configuration.
pub mod context;

mod format;

pub use format::{format_date, truncate_chars, OutputFormat};
