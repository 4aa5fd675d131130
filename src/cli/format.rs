//! Output formatting utilities for CLI commands.
//!
//! Provides a unified `OutputFormat` enum and small display helpers shared
//! by the commands.

use chrono::{DateTime, Local, Utc};
use clap::ValueEnum;

/// Output format options for CLI commands.
///
/// - `Text` for human-readable terminal output (default)
/// - `Json` for machine-readable output and scripting
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default).
    #[default]
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Formats an optional timestamp as `YYYY-MM-DD HH:MM` in local time.
///
/// Returns "N/A" when the timestamp is absent.
pub fn format_date(value: Option<DateTime<Utc>>) -> String {
    match value {
        Some(dt) => dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        None => "N/A".to_string(),
    }
}

/// Truncates a string to at most `max_chars` characters, appending "..."
/// when anything was cut.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars <= 3 {
        return ".".repeat(max_chars);
    }
    let kept: String = s.chars().take(max_chars - 3).collect();
    format!("{kept}...")
}
