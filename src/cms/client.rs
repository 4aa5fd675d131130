//! HTTP client for the CMS story list endpoint.
//!
//! The [`StoryClient`] trait is the seam between pagination logic and the
//! network; [`StoryblokClient`] implements it against the Storyblok
//! management API.

use reqwest::blocking::Client;
use serde::Deserialize;

use super::models::{Story, StoryPage};
use super::FetchError;

/// Parameters for one page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    /// Requested page size.
    pub per_page: usize,
    /// Restrict the listing to published stories.
    pub published_only: bool,
}

/// Source of paginated story listings.
pub trait StoryClient {
    /// Fetches a single page of stories.
    fn fetch_page(&self, request: &PageRequest) -> Result<StoryPage, FetchError>;
}

impl<T: StoryClient + ?Sized> StoryClient for &T {
    fn fetch_page(&self, request: &PageRequest) -> Result<StoryPage, FetchError> {
        (**self).fetch_page(request)
    }
}

impl<T: StoryClient + ?Sized> StoryClient for Box<T> {
    fn fetch_page(&self, request: &PageRequest) -> Result<StoryPage, FetchError> {
        (**self).fetch_page(request)
    }
}

/// Storyblok management API client.
pub struct StoryblokClient {
    /// HTTP client instance.
    client: Client,
    /// API host, without trailing slash.
    base_url: String,
    /// Space the stories belong to.
    space_id: String,
    /// Management API token.
    api_key: String,
}

impl StoryblokClient {
    /// Creates a new client for the given space.
    pub fn new(client: Client, base_url: &str, space_id: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            space_id: space_id.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Returns the story list endpoint URL.
    pub fn list_url(&self) -> String {
        format!("{}/v1/spaces/{}/stories/", self.base_url, self.space_id)
    }

    /// Builds the query parameters for a page request.
    fn query_params(request: &PageRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("per_page", request.per_page.to_string()),
            ("page", request.page.to_string()),
            ("story_only", "true".to_string()),
        ];
        if request.published_only {
            params.push(("is_published", "true".to_string()));
        }
        params
    }
}

impl StoryClient for StoryblokClient {
    fn fetch_page(&self, request: &PageRequest) -> Result<StoryPage, FetchError> {
        let response = self
            .client
            .get(self.list_url())
            .query(&Self::query_params(request))
            .header("Authorization", &self.api_key)
            .header("content-type", "application/json")
            .send()
            .map_err(|e| FetchError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let body_text = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FetchError::HttpError {
                status: status_code,
                body: body_text,
            });
        }

        let total = response
            .headers()
            .get("total")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        let body: ListResponse = response
            .json()
            .map_err(|e| FetchError::ParseError(e.to_string()))?;

        Ok(page_from_response(body.stories, total, request))
    }
}

/// Body of the story list endpoint.
#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    stories: Vec<Story>,
}

/// Assembles a page, deriving `has_more` from the reported total.
///
/// Without a total, a full page is taken to mean more may follow.
fn page_from_response(stories: Vec<Story>, total: Option<u64>, request: &PageRequest) -> StoryPage {
    let has_more = match total {
        Some(total) => u64::from(request.page) * (request.per_page as u64) < total,
        None => stories.len() >= request.per_page,
    };
    StoryPage {
        stories,
        total,
        has_more,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(page: u32) -> PageRequest {
        PageRequest {
            page,
            per_page: 25,
            published_only: true,
        }
    }

    fn stories(n: usize) -> Vec<Story> {
        (0..n)
            .map(|i| serde_json::from_value(serde_json::json!({"id": i})).unwrap())
            .collect()
    }

    #[test]
    fn test_list_url_trims_trailing_slash() {
        let client = StoryblokClient::new(Client::new(), "https://mapi.storyblok.com/", "171339", "k");
        assert_eq!(
            client.list_url(),
            "https://mapi.storyblok.com/v1/spaces/171339/stories/"
        );
    }

    #[test]
    fn test_query_params_published_only() {
        let params = StoryblokClient::query_params(&request(3));
        assert!(params.contains(&("per_page", "25".to_string())));
        assert!(params.contains(&("page", "3".to_string())));
        assert!(params.contains(&("is_published", "true".to_string())));
    }

    #[test]
    fn test_query_params_including_drafts() {
        let mut req = request(1);
        req.published_only = false;
        let params = StoryblokClient::query_params(&req);
        assert!(!params.iter().any(|(k, _)| *k == "is_published"));
    }

    #[test]
    fn test_list_response_deserialize() {
        let json = r#"{"stories": [{"id": 1, "name": "Home"}, {"id": 2, "name": "About"}]}"#;
        let body: ListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.stories.len(), 2);
        assert_eq!(body.stories[1].name, "About");
    }

    #[test]
    fn test_list_response_missing_stories_is_empty() {
        let body: ListResponse = serde_json::from_str("{}").unwrap();
        assert!(body.stories.is_empty());
    }

    #[test]
    fn test_page_has_more_from_total() {
        let page = page_from_response(stories(25), Some(60), &request(2));
        assert!(page.has_more);

        let page = page_from_response(stories(25), Some(50), &request(2));
        assert!(!page.has_more);
    }

    #[test]
    fn test_page_has_more_without_total() {
        assert!(page_from_response(stories(25), None, &request(1)).has_more);
        assert!(!page_from_response(stories(10), None, &request(1)).has_more);
    }
}
