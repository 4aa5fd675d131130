//! Story records as returned by the CMS.
//!
//! Stories are immutable once fetched. Their content body is kept as a
//! [`ContentValue`] tree so it can be searched without knowing the
//! component schema of each content type.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single content record from the CMS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    /// CMS-assigned identifier.
    pub id: u64,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Last path segment (e.g., "pricing").
    #[serde(default)]
    pub slug: String,

    /// Full path including locale and folders (e.g., "fr/blog/pricing").
    #[serde(default)]
    pub full_slug: String,

    /// Content type tag as reported by the management API.
    #[serde(default)]
    pub content_type: Option<String>,

    /// Whether the story is currently published.
    #[serde(default)]
    pub published: bool,

    /// Translation group shared by all locale variants of a page.
    #[serde(default)]
    pub group_id: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,

    /// Structured content body.
    #[serde(default)]
    pub content: ContentValue,
}

impl Story {
    /// Returns the content type tag.
    ///
    /// Falls back to the `component` of the content body when the list
    /// endpoint did not report a content type (CDN responses).
    pub fn content_type(&self) -> &str {
        if let Some(ct) = self.content_type.as_deref() {
            if !ct.is_empty() {
                return ct;
            }
        }
        match &self.content {
            ContentValue::Mapping(map) => match map.get("component") {
                Some(ContentValue::Text(component)) => component,
                _ => "",
            },
            _ => "",
        }
    }

    /// Returns whether the story is published or a draft.
    pub fn status(&self) -> StoryStatus {
        if self.published {
            StoryStatus::Published
        } else {
            StoryStatus::Draft
        }
    }

    /// Returns the content body flattened into plain text.
    pub fn content_text(&self) -> String {
        flatten_text(&self.content)
    }
}

/// Publication state of a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryStatus {
    Published,
    Draft,
}

impl fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoryStatus::Published => write!(f, "published"),
            StoryStatus::Draft => write!(f, "draft"),
        }
    }
}

/// A structured content value.
///
/// Mirrors the shapes a CMS content body can take so that it can be
/// walked explicitly instead of probing for attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentValue {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    Sequence(Vec<ContentValue>),
    Mapping(BTreeMap<String, ContentValue>),
}

/// Flattens a content value into searchable text.
///
/// Text and numbers contribute one line each, in document order (mapping
/// entries in key order). Mapping keys, booleans and nulls contribute
/// nothing.
pub fn flatten_text(value: &ContentValue) -> String {
    let mut parts = Vec::new();
    collect_text(value, &mut parts);
    parts.join("\n")
}

fn collect_text(value: &ContentValue, parts: &mut Vec<String>) {
    match value {
        ContentValue::Null | ContentValue::Bool(_) => {}
        ContentValue::Number(n) => parts.push(n.to_string()),
        ContentValue::Text(s) => {
            if !s.is_empty() {
                parts.push(s.clone());
            }
        }
        ContentValue::Sequence(items) => {
            for item in items {
                collect_text(item, parts);
            }
        }
        ContentValue::Mapping(map) => {
            for item in map.values() {
                collect_text(item, parts);
            }
        }
    }
}

/// One batch of stories from the paginated list endpoint.
#[derive(Debug, Clone, Default)]
pub struct StoryPage {
    /// Stories on this page, in server order.
    pub stories: Vec<Story>,

    /// Total number of matching stories, when the server reports it.
    pub total: Option<u64>,

    /// Whether the server indicates further pages exist.
    pub has_more: bool,
}
