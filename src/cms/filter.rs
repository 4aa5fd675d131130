//! In-memory story filtering and search.
//!
//! All predicates are conjunctive and the output keeps input order. No
//! I/O happens here.

use std::str::FromStr;

use clap::ValueEnum;

use super::models::{Story, StoryStatus};

/// Publication state selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum StatusFilter {
    /// Published stories only.
    Published,
    /// Draft stories only.
    Draft,
    /// Both published and draft stories.
    #[default]
    Any,
}

impl StatusFilter {
    fn matches(self, status: StoryStatus) -> bool {
        match self {
            StatusFilter::Published => status == StoryStatus::Published,
            StatusFilter::Draft => status == StoryStatus::Draft,
            StatusFilter::Any => true,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "published" => Ok(StatusFilter::Published),
            "draft" => Ok(StatusFilter::Draft),
            "any" | "all" | "both" => Ok(StatusFilter::Any),
            other => Err(format!(
                "Unknown status: '{other}'. Expected one of: published, draft, any"
            )),
        }
    }
}

/// Predicates applied to a story list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryFilter {
    /// Exact content type tag. Empty means no filter.
    pub content_type: Option<String>,
    /// Publication state.
    pub status: StatusFilter,
    /// Case-insensitive free-text query. Blank means no filter.
    pub query: Option<String>,
}

impl StoryFilter {
    /// Returns true if the story satisfies every predicate.
    pub fn matches(&self, story: &Story) -> bool {
        self.matches_prepared(story, self.normalized_query().as_deref())
    }

    fn normalized_query(&self) -> Option<String> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    fn matches_prepared(&self, story: &Story, query: Option<&str>) -> bool {
        if let Some(ct) = self.content_type.as_deref().filter(|ct| !ct.is_empty()) {
            if story.content_type() != ct {
                return false;
            }
        }

        if !self.status.matches(story.status()) {
            return false;
        }

        match query {
            Some(q) => matches_query(story, q),
            None => true,
        }
    }
}

/// Returns the stories that satisfy every predicate, in input order.
pub fn filter_stories<'a>(stories: &'a [Story], filter: &StoryFilter) -> Vec<&'a Story> {
    let query = filter.normalized_query();
    stories
        .iter()
        .filter(|story| filter.matches_prepared(story, query.as_deref()))
        .collect()
}

/// Matches an already lowercased query against name, slugs and content.
fn matches_query(story: &Story, query: &str) -> bool {
    story.name.to_lowercase().contains(query)
        || story.slug.to_lowercase().contains(query)
        || story.full_slug.to_lowercase().contains(query)
        || story.content_text().to_lowercase().contains(query)
}

/// Returns the distinct content type tags in first-seen order.
pub fn content_types(stories: &[Story]) -> Vec<String> {
    let mut types: Vec<String> = Vec::new();
    for story in stories {
        let ct = story.content_type();
        if !ct.is_empty() && !types.iter().any(|t| t == ct) {
            types.push(ct.to_string());
        }
    }
    types
}

/// One display page of a longer list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSlice<'a, T> {
    /// Items on this page.
    pub items: &'a [T],
    /// 1-based page number actually shown.
    pub page: usize,
    /// Total number of pages (at least 1).
    pub total_pages: usize,
    /// Index of the first item on this page within the full list.
    pub offset: usize,
}

/// Slices a list for display.
///
/// Pages out of range fall back to page 1. A `per_page` of zero shows
/// everything on one page.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> PageSlice<'_, T> {
    if per_page == 0 || items.len() <= per_page {
        return PageSlice {
            items,
            page: 1,
            total_pages: 1,
            offset: 0,
        };
    }

    let total_pages = items.len().div_ceil(per_page);
    let page = if page == 0 || page > total_pages { 1 } else { page };
    let offset = (page - 1) * per_page;
    let end = (offset + per_page).min(items.len());

    PageSlice {
        items: &items[offset..end],
        page,
        total_pages,
        offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(id: u64, name: &str, content_type: &str, published: bool) -> Story {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": name,
            "slug": name.to_lowercase().replace(' ', "-"),
            "full_slug": format!("en/{}", name.to_lowercase().replace(' ', "-")),
            "content_type": content_type,
            "published": published,
        }))
        .unwrap()
    }

    fn sample() -> Vec<Story> {
        vec![
            story(1, "Acme case study", "case_study", true),
            story(2, "Pricing", "page", true),
            story(3, "Acme webinar", "page", false),
            story(4, "Careers", "page", true),
            story(5, "Fleet report", "case_study", false),
        ]
    }

    fn ids(stories: &[&Story]) -> Vec<u64> {
        stories.iter().map(|s| s.id).collect()
    }

    #[test]
    fn test_default_filter_is_identity() {
        let stories = sample();
        let result = filter_stories(&stories, &StoryFilter::default());
        assert_eq!(ids(&result), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_content_type_exact_match() {
        let stories = sample();
        let filter = StoryFilter {
            content_type: Some("page".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_stories(&stories, &filter)), vec![2, 3, 4]);

        let filter = StoryFilter {
            content_type: Some("pag".to_string()),
            ..Default::default()
        };
        assert!(filter_stories(&stories, &filter).is_empty());
    }

    #[test]
    fn test_empty_content_type_is_no_filter() {
        let stories = sample();
        let filter = StoryFilter {
            content_type: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(filter_stories(&stories, &filter).len(), 5);
    }

    #[test]
    fn test_status_filter() {
        let stories = sample();
        let published = StoryFilter {
            status: StatusFilter::Published,
            ..Default::default()
        };
        let draft = StoryFilter {
            status: StatusFilter::Draft,
            ..Default::default()
        };
        assert_eq!(ids(&filter_stories(&stories, &published)), vec![1, 2, 4]);
        assert_eq!(ids(&filter_stories(&stories, &draft)), vec![3, 5]);
    }

    #[test]
    fn test_query_is_case_insensitive() {
        let stories = sample();
        let upper = StoryFilter {
            query: Some("ACME".to_string()),
            ..Default::default()
        };
        let lower = StoryFilter {
            query: Some("acme".to_string()),
            ..Default::default()
        };
        let a = ids(&filter_stories(&stories, &upper));
        let b = ids(&filter_stories(&stories, &lower));
        assert_eq!(a, vec![1, 3]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_query_matches_slug() {
        let stories = sample();
        let filter = StoryFilter {
            query: Some("fleet-rep".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_stories(&stories, &filter)), vec![5]);
    }

    #[test]
    fn test_query_matches_content_body() {
        let mut stories = sample();
        stories[1].content = serde_json::from_value(serde_json::json!({
            "body": [{"component": "text", "text": "Plans for Enterprise fleets"}]
        }))
        .unwrap();

        let filter = StoryFilter {
            query: Some("enterprise".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_stories(&stories, &filter)), vec![2]);
    }

    #[test]
    fn test_blank_query_is_identity_on_filtered_set() {
        let stories = sample();
        let base = StoryFilter {
            content_type: Some("page".to_string()),
            status: StatusFilter::Published,
            query: None,
        };
        let blank = StoryFilter {
            query: Some("   ".to_string()),
            ..base.clone()
        };
        assert_eq!(
            ids(&filter_stories(&stories, &base)),
            ids(&filter_stories(&stories, &blank))
        );
    }

    #[test]
    fn test_filters_compose_conjunctively() {
        let stories = sample();
        let filter = StoryFilter {
            content_type: Some("page".to_string()),
            status: StatusFilter::Draft,
            query: Some("acme".to_string()),
        };
        let result = filter_stories(&stories, &filter);

        let expected: Vec<u64> = stories
            .iter()
            .filter(|s| s.content_type() == "page")
            .filter(|s| s.status() == StoryStatus::Draft)
            .filter(|s| s.name.to_lowercase().contains("acme"))
            .map(|s| s.id)
            .collect();
        assert_eq!(ids(&result), expected);
        assert_eq!(ids(&result), vec![3]);
    }

    #[test]
    fn test_filter_preserves_input_order() {
        let mut stories = sample();
        stories.reverse();
        let filter = StoryFilter {
            content_type: Some("page".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_stories(&stories, &filter)), vec![4, 3, 2]);
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let stories: Vec<Story> = Vec::new();
        let filter = StoryFilter {
            query: Some("anything".to_string()),
            ..Default::default()
        };
        assert!(filter_stories(&stories, &filter).is_empty());
    }

    #[test]
    fn test_status_filter_from_str() {
        assert_eq!(
            "Published".parse::<StatusFilter>().unwrap(),
            StatusFilter::Published
        );
        assert_eq!("all".parse::<StatusFilter>().unwrap(), StatusFilter::Any);
        assert!("archived".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn test_content_types_first_seen_order() {
        let stories = sample();
        assert_eq!(content_types(&stories), vec!["case_study", "page"]);
    }

    #[test]
    fn test_paginate_slices_and_clamps() {
        let items: Vec<u32> = (1..=60).collect();

        let page = paginate(&items, 3, 25);
        assert_eq!(page.items, &items[50..60]);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.offset, 50);

        let out_of_range = paginate(&items, 9, 25);
        assert_eq!(out_of_range.page, 1);
        assert_eq!(out_of_range.items.len(), 25);
    }

    #[test]
    fn test_paginate_single_page() {
        let items = vec![1, 2, 3];
        let page = paginate(&items, 2, 25);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.items.len(), 3);
    }
}
