//! Story browsing over the CMS list endpoint.
//!
//! Fetches every story page by page, keeps the aggregated list in a
//! short-lived cache, and filters it in memory.
//!
//! # Submodules
//!
//! - `models` - Story records and structured content values
//! - `client` - HTTP client for the paginated list endpoint
//! - `cache` - Time-bounded snapshot of the last full fetch
//! - `fetcher` - Pagination and cache policy
//! - `filter` - In-memory predicates and search
//! - `grouping` - Translation groups and locale coverage

pub mod cache;
pub mod client;
pub mod fetcher;
pub mod filter;
pub mod grouping;
pub mod models;

pub use cache::{Clock, ManualClock, StoryCache, SystemClock};
pub use client::{PageRequest, StoryClient, StoryblokClient};
pub use fetcher::{FetchSource, StoryFetch, StoryFetcher};
pub use filter::{filter_stories, StatusFilter, StoryFilter};
pub use models::{flatten_text, ContentValue, Story, StoryPage, StoryStatus};

/// Number of stories requested per page.
pub const PAGE_SIZE: usize = 25;

/// Maximum number of pages fetched in one aggregation.
pub const MAX_PAGES: u32 = 100;

/// Default management API host.
pub const DEFAULT_CMS_URL: &str = "https://mapi.storyblok.com";

/// Default editor host used to build story links.
pub const DEFAULT_EDITOR_URL: &str = "https://app.storyblok.com";

/// Builds the editor link for a story.
pub fn editor_url(editor_base: &str, space_id: &str, story_id: u64) -> String {
    format!(
        "{}/#/me/spaces/{space_id}/stories/0/0/{story_id}",
        editor_base.trim_end_matches('/')
    )
}

/// Errors that can occur while fetching stories.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    /// Network or connection error, including timeouts.
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The CMS returned a non-success HTTP status code.
    #[error("HTTP error ({status}): {body}")]
    HttpError {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// The CMS response could not be decoded.
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display_http_error() {
        let err = FetchError::HttpError {
            status: 401,
            body: "Unauthorized".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("Unauthorized"));
    }

    #[test]
    fn test_fetch_error_display_request_failed() {
        let err = FetchError::RequestFailed("operation timed out".to_string());
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_page_cap_bounds_story_count() {
        assert_eq!(PAGE_SIZE * MAX_PAGES as usize, 2500);
    }

    #[test]
    fn test_editor_url() {
        assert_eq!(
            editor_url("https://app.storyblok.com/", "171339", 99),
            "https://app.storyblok.com/#/me/spaces/171339/stories/0/0/99"
        );
    }
}
