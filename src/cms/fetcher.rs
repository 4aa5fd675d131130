//! Paginated story fetching with a time-bounded cache.
//!
//! [`StoryFetcher::get_stories`] either serves the cached snapshot with no
//! network calls or walks every page of the list endpoint. A fetch that
//! fails part way leaves the cache untouched.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::cache::{Clock, StoryCache, SystemClock};
use super::client::{PageRequest, StoryClient};
use super::models::Story;
use super::{FetchError, MAX_PAGES, PAGE_SIZE};

/// Where the stories of a [`StoryFetch`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchSource {
    /// Fresh cached snapshot; no request was made.
    Cache,
    /// Fetched from the CMS during this call.
    Network,
    /// The fetch failed and an unexpired snapshot was served instead.
    Fallback,
    /// The fetch failed and no usable snapshot existed.
    Unavailable,
}

/// Result of [`StoryFetcher::get_stories`].
#[derive(Debug, Clone)]
pub struct StoryFetch {
    /// Stories in fetch order.
    pub stories: Arc<Vec<Story>>,
    /// When the stories were fetched. `None` when nothing is available.
    pub fetched_at: Option<DateTime<Utc>>,
    /// Where the stories came from.
    pub source: FetchSource,
    /// Error from a failed fetch attempt, surfaced beside the data.
    pub error: Option<FetchError>,
}

/// Fetches all stories and caches the aggregated list.
pub struct StoryFetcher<C, K = SystemClock> {
    client: C,
    clock: K,
    cache: Arc<Mutex<StoryCache>>,
    published_only: bool,
}

impl<C: StoryClient> StoryFetcher<C, SystemClock> {
    /// Creates a fetcher with its own cache and the system clock.
    pub fn new(client: C) -> Self {
        Self::with_cache(client, SystemClock, StoryCache::shared())
    }
}

impl<C: StoryClient, K: Clock> StoryFetcher<C, K> {
    /// Creates a fetcher over a shared cache.
    ///
    /// Fetchers sharing a cache see each other's snapshots; concurrent
    /// refreshes race and the last one to finish wins.
    pub fn with_cache(client: C, clock: K, cache: Arc<Mutex<StoryCache>>) -> Self {
        Self {
            client,
            clock,
            cache,
            published_only: true,
        }
    }

    /// Sets whether the server-side published-only filter is applied.
    pub fn published_only(mut self, published_only: bool) -> Self {
        self.published_only = published_only;
        self
    }

    /// Switches the published-only filter in place.
    ///
    /// The cached snapshot was fetched under the old filter, so it is
    /// dropped when the setting changes.
    pub fn set_published_only(&mut self, published_only: bool) {
        if self.published_only != published_only {
            self.published_only = published_only;
            self.invalidate();
        }
    }

    /// Returns whether the server-side published-only filter is applied.
    pub fn is_published_only(&self) -> bool {
        self.published_only
    }

    /// Returns the shared cache handle.
    pub fn cache(&self) -> Arc<Mutex<StoryCache>> {
        Arc::clone(&self.cache)
    }

    /// Returns the stories, fetching them if needed.
    ///
    /// Serves the cached snapshot when it is younger than five minutes and
    /// `force_refresh` is false. Otherwise fetches every page; on success the
    /// cache is replaced, on failure an unexpired snapshot is served (or an
    /// empty list) together with the error.
    pub fn get_stories(&self, force_refresh: bool) -> StoryFetch {
        let now = self.clock.now();

        if !force_refresh {
            if let Some(snapshot) = self.lock_cache().fresh(now) {
                tracing::debug!(
                    "Serving {} cached stories from {}",
                    snapshot.stories.len(),
                    snapshot.fetched_at
                );
                return StoryFetch {
                    stories: Arc::clone(&snapshot.stories),
                    fetched_at: Some(snapshot.fetched_at),
                    source: FetchSource::Cache,
                    error: None,
                };
            }
        }

        match self.fetch_all() {
            Ok(stories) => {
                let fetched_at = self.clock.now();
                let snapshot = self.lock_cache().store(stories, fetched_at);
                tracing::info!("Cached {} stories", snapshot.stories.len());
                StoryFetch {
                    stories: snapshot.stories,
                    fetched_at: Some(fetched_at),
                    source: FetchSource::Network,
                    error: None,
                }
            }
            Err(e) => {
                let cache = self.lock_cache();
                match cache.fresh(self.clock.now()) {
                    Some(snapshot) => {
                        tracing::warn!("Story fetch failed, serving cached stories: {}", e);
                        StoryFetch {
                            stories: Arc::clone(&snapshot.stories),
                            fetched_at: Some(snapshot.fetched_at),
                            source: FetchSource::Fallback,
                            error: Some(e),
                        }
                    }
                    None => {
                        tracing::warn!("Story fetch failed with no cached stories: {}", e);
                        StoryFetch {
                            stories: Arc::new(Vec::new()),
                            fetched_at: None,
                            source: FetchSource::Unavailable,
                            error: Some(e),
                        }
                    }
                }
            }
        }
    }

    /// Drops the cached snapshot so the next call fetches.
    pub fn invalidate(&self) {
        self.lock_cache().clear();
    }

    /// Walks the list endpoint until a stop condition is reached.
    ///
    /// Stops on a short page, when the server reports no more pages, or
    /// after [`MAX_PAGES`] pages. Any failed page aborts the whole walk.
    fn fetch_all(&self) -> Result<Vec<Story>, FetchError> {
        let mut stories = Vec::new();

        for page in 1..=MAX_PAGES {
            let request = PageRequest {
                page,
                per_page: PAGE_SIZE,
                published_only: self.published_only,
            };
            tracing::debug!("Requesting story page {}", page);

            let mut batch = self.client.fetch_page(&request)?;
            if batch.stories.len() > PAGE_SIZE {
                tracing::warn!(
                    "Page {} returned {} stories, keeping the first {}",
                    page,
                    batch.stories.len(),
                    PAGE_SIZE
                );
                batch.stories.truncate(PAGE_SIZE);
            }

            let count = batch.stories.len();
            stories.extend(batch.stories);

            if count < PAGE_SIZE || !batch.has_more {
                break;
            }
        }

        Ok(stories)
    }

    fn lock_cache(&self) -> MutexGuard<'_, StoryCache> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::cache::ManualClock;
    use crate::cms::models::StoryPage;
    use chrono::{Duration, TimeZone};
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// A client that replays scripted pages and records every request.
    struct ScriptedClient {
        responses: RefCell<VecDeque<Result<StoryPage, FetchError>>>,
        requests: RefCell<Vec<PageRequest>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<StoryPage, FetchError>>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                requests: RefCell::new(Vec::new()),
            }
        }

        fn push(&self, response: Result<StoryPage, FetchError>) {
            self.responses.borrow_mut().push_back(response);
        }

        fn request_count(&self) -> usize {
            self.requests.borrow().len()
        }
    }

    impl StoryClient for ScriptedClient {
        fn fetch_page(&self, request: &PageRequest) -> Result<StoryPage, FetchError> {
            self.requests.borrow_mut().push(*request);
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(StoryPage::default()))
        }
    }

    fn make_page(first_id: u64, count: usize, has_more: bool) -> Result<StoryPage, FetchError> {
        let stories = (0..count as u64)
            .map(|i| {
                serde_json::from_value(serde_json::json!({
                    "id": first_id + i,
                    "name": format!("Story {}", first_id + i),
                    "published": true,
                }))
                .unwrap()
            })
            .collect();
        Ok(StoryPage {
            stories,
            total: None,
            has_more,
        })
    }

    fn failure() -> Result<StoryPage, FetchError> {
        Err(FetchError::RequestFailed("connection reset".to_string()))
    }

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap())
    }

    fn fetcher<'a>(
        client: &'a ScriptedClient,
        clock: &ManualClock,
    ) -> StoryFetcher<&'a ScriptedClient, ManualClock> {
        StoryFetcher::with_cache(client, clock.clone(), StoryCache::shared())
    }

    #[test]
    fn test_fetch_stops_on_short_page() {
        let client = ScriptedClient::new(vec![
            make_page(0, 25, true),
            make_page(25, 25, true),
            make_page(50, 10, true),
        ]);
        let clock = clock();
        let fetcher = fetcher(&client, &clock);

        let result = fetcher.get_stories(false);

        assert_eq!(result.stories.len(), 60);
        assert_eq!(result.source, FetchSource::Network);
        assert_eq!(result.fetched_at, Some(clock.now()));
        assert!(result.error.is_none());
        assert_eq!(client.request_count(), 3, "no fourth page request");
    }

    #[test]
    fn test_fetch_stops_when_server_reports_no_more() {
        let client = ScriptedClient::new(vec![make_page(0, 25, true), make_page(25, 25, false)]);
        let clock = clock();

        let result = fetcher(&client, &clock).get_stories(false);

        assert_eq!(result.stories.len(), 50);
        assert_eq!(client.request_count(), 2);
    }

    #[test]
    fn test_fetch_stops_on_empty_page() {
        let client = ScriptedClient::new(vec![make_page(0, 25, true), make_page(25, 0, true)]);
        let clock = clock();

        let result = fetcher(&client, &clock).get_stories(false);

        assert_eq!(result.stories.len(), 25);
        assert_eq!(client.request_count(), 2);
    }

    #[test]
    fn test_fetch_respects_page_cap() {
        let pages = (0..150).map(|p| make_page(p * 25, 25, true)).collect();
        let client = ScriptedClient::new(pages);
        let clock = clock();

        let result = fetcher(&client, &clock).get_stories(false);

        assert_eq!(result.stories.len(), 2500);
        assert_eq!(client.request_count(), 100);
    }

    #[test]
    fn test_oversized_page_is_truncated() {
        let client = ScriptedClient::new(vec![make_page(0, 30, false)]);
        let clock = clock();

        let result = fetcher(&client, &clock).get_stories(false);

        assert_eq!(result.stories.len(), 25);
    }

    #[test]
    fn test_requests_are_sequential_pages_of_25() {
        let client = ScriptedClient::new(vec![make_page(0, 25, true), make_page(25, 3, true)]);
        let clock = clock();

        fetcher(&client, &clock).get_stories(false);

        let requests = client.requests.borrow();
        assert_eq!(requests[0].page, 1);
        assert_eq!(requests[1].page, 2);
        assert!(requests.iter().all(|r| r.per_page == 25 && r.published_only));
    }

    #[test]
    fn test_published_only_can_be_disabled() {
        let client = ScriptedClient::new(vec![make_page(0, 1, false)]);
        let clock = clock();

        fetcher(&client, &clock).published_only(false).get_stories(false);

        assert!(!client.requests.borrow()[0].published_only);
    }

    #[test]
    fn test_switching_published_only_drops_cache() {
        let client = ScriptedClient::new(vec![make_page(0, 3, false), make_page(0, 5, false)]);
        let clock = clock();
        let mut fetcher = fetcher(&client, &clock);

        fetcher.get_stories(false);
        fetcher.set_published_only(true);
        assert_eq!(fetcher.get_stories(false).source, FetchSource::Cache);

        fetcher.set_published_only(false);
        let result = fetcher.get_stories(false);

        assert_eq!(result.source, FetchSource::Network);
        assert_eq!(result.stories.len(), 5);
        assert!(!client.requests.borrow()[1].published_only);
    }

    #[test]
    fn test_second_call_within_ttl_uses_cache() {
        let client = ScriptedClient::new(vec![make_page(0, 10, false)]);
        let clock = clock();
        let fetcher = fetcher(&client, &clock);

        let first = fetcher.get_stories(false);
        clock.advance(Duration::seconds(299));
        let second = fetcher.get_stories(false);

        assert_eq!(client.request_count(), 1);
        assert_eq!(second.source, FetchSource::Cache);
        assert_eq!(second.fetched_at, first.fetched_at);
        assert_eq!(second.stories.len(), 10);
    }

    #[test]
    fn test_stale_cache_triggers_refetch() {
        let client = ScriptedClient::new(vec![make_page(0, 10, false), make_page(0, 12, false)]);
        let clock = clock();
        let fetcher = fetcher(&client, &clock);

        fetcher.get_stories(false);
        clock.advance(Duration::seconds(301));
        let result = fetcher.get_stories(false);

        assert_eq!(client.request_count(), 2);
        assert_eq!(result.source, FetchSource::Network);
        assert_eq!(result.stories.len(), 12);
    }

    #[test]
    fn test_force_refresh_bypasses_fresh_cache() {
        let client = ScriptedClient::new(vec![make_page(0, 10, false), make_page(0, 11, false)]);
        let clock = clock();
        let fetcher = fetcher(&client, &clock);

        fetcher.get_stories(false);
        let result = fetcher.get_stories(true);

        assert_eq!(client.request_count(), 2);
        assert_eq!(result.stories.len(), 11);
    }

    #[test]
    fn test_failed_refresh_serves_previous_cache() {
        let client = ScriptedClient::new(vec![
            make_page(0, 25, true),
            make_page(25, 25, true),
            make_page(50, 10, true),
        ]);
        let clock = clock();
        let fetcher = fetcher(&client, &clock);

        let first = fetcher.get_stories(false);
        clock.advance(Duration::seconds(60));

        // Within the TTL a plain call makes no request at all
        let cached = fetcher.get_stories(false);
        assert_eq!(cached.source, FetchSource::Cache);
        assert_eq!(client.request_count(), 3);

        client.push(make_page(0, 25, true));
        client.push(failure());
        let result = fetcher.get_stories(true);

        assert_eq!(result.source, FetchSource::Fallback);
        assert_eq!(result.stories.len(), 60);
        assert_eq!(result.fetched_at, first.fetched_at);
        assert!(matches!(result.error, Some(FetchError::RequestFailed(_))));

        let snapshot_len = fetcher
            .cache()
            .lock()
            .unwrap()
            .snapshot()
            .map(|s| s.stories.len());
        assert_eq!(snapshot_len, Some(60), "failed fetch must not touch the cache");
    }

    #[test]
    fn test_failure_without_cache_returns_empty_with_error() {
        let client = ScriptedClient::new(vec![make_page(0, 25, true), failure()]);
        let clock = clock();
        let fetcher = fetcher(&client, &clock);

        let result = fetcher.get_stories(false);

        assert!(result.stories.is_empty());
        assert_eq!(result.source, FetchSource::Unavailable);
        assert!(result.fetched_at.is_none());
        assert!(result.error.is_some());
        assert!(fetcher.cache().lock().unwrap().snapshot().is_none());
    }

    #[test]
    fn test_failure_with_expired_cache_returns_empty() {
        let client = ScriptedClient::new(vec![make_page(0, 5, false), failure()]);
        let clock = clock();
        let fetcher = fetcher(&client, &clock);

        fetcher.get_stories(false);
        clock.advance(Duration::seconds(400));
        let result = fetcher.get_stories(false);

        assert_eq!(result.source, FetchSource::Unavailable);
        assert!(result.stories.is_empty());
    }

    #[test]
    fn test_invalidate_forces_next_fetch() {
        let client = ScriptedClient::new(vec![make_page(0, 5, false), make_page(0, 6, false)]);
        let clock = clock();
        let fetcher = fetcher(&client, &clock);

        fetcher.get_stories(false);
        fetcher.invalidate();
        let result = fetcher.get_stories(false);

        assert_eq!(client.request_count(), 2);
        assert_eq!(result.stories.len(), 6);
    }

    #[test]
    fn test_fetchers_sharing_a_cache_reuse_snapshots() {
        let first_client = ScriptedClient::new(vec![make_page(0, 8, false)]);
        let second_client = ScriptedClient::new(Vec::new());
        let clock = clock();
        let cache = StoryCache::shared();

        let a = StoryFetcher::with_cache(&first_client, clock.clone(), Arc::clone(&cache));
        let b = StoryFetcher::with_cache(&second_client, clock.clone(), Arc::clone(&cache));

        a.get_stories(false);
        let result = b.get_stories(false);

        assert_eq!(result.source, FetchSource::Cache);
        assert_eq!(result.stories.len(), 8);
        assert_eq!(second_client.request_count(), 0);
    }
}
