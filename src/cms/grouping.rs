//! Translation groups.
//!
//! Stories that are translations of the same page share a `group_id`.
//! Grouping them by locale shows which pages are missing translations
//! and how many variants are live.

use std::cmp::Reverse;

use clap::ValueEnum;
use serde::Serialize;

use super::models::Story;

/// Locales recognised in full slugs, in display priority order.
pub const DEFAULT_LOCALES: &[&str] = &["en", "en-US", "fr", "nl", "es"];

/// One locale variant within a translation group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocaleEntry {
    pub locale: String,
    pub story_id: u64,
    pub name: String,
    pub content_type: String,
    pub published: bool,
}

/// Stories sharing a translation group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryGroup {
    pub group_id: String,
    /// One entry per detected locale, in story order.
    pub entries: Vec<LocaleEntry>,
}

impl StoryGroup {
    /// Returns the entry for a locale, if present.
    pub fn entry(&self, locale: &str) -> Option<&LocaleEntry> {
        self.entries.iter().find(|e| e.locale == locale)
    }

    /// Returns the name of the first available locale in priority order.
    pub fn page_name(&self, locales: &[&str]) -> &str {
        locales
            .iter()
            .find_map(|l| self.entry(l))
            .map(|e| e.name.as_str())
            .unwrap_or("")
    }

    pub fn published_count(&self) -> usize {
        self.entries.iter().filter(|e| e.published).count()
    }

    pub fn draft_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.published).count()
    }

    /// Returns the configured locales with no variant in this group.
    pub fn missing_locales<'a>(&self, locales: &[&'a str]) -> Vec<&'a str> {
        locales
            .iter()
            .copied()
            .filter(|l| self.entry(l).is_none())
            .collect()
    }

    /// Returns the distinct content types across variants, comma separated.
    pub fn content_types(&self) -> String {
        let mut types: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !types.contains(&entry.content_type.as_str()) {
                types.push(&entry.content_type);
            }
        }
        types.join(", ")
    }
}

/// Detects the locale prefix of a full slug.
pub fn detect_locale<'a>(full_slug: &str, locales: &[&'a str]) -> Option<&'a str> {
    let slug = full_slug.trim_end_matches('/');
    locales.iter().copied().find(|loc| {
        slug == *loc
            || slug
                .strip_prefix(loc)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// Groups stories by translation group, in first-seen order.
///
/// Stories without a group id are skipped. A story whose slug has no
/// recognised locale still creates its group but adds no entry.
pub fn group_by_translation(stories: &[Story], locales: &[&str]) -> Vec<StoryGroup> {
    let mut groups: Vec<StoryGroup> = Vec::new();

    for story in stories {
        let Some(group_id) = story.group_id.as_deref().filter(|g| !g.is_empty()) else {
            continue;
        };

        let index = match groups.iter().position(|g| g.group_id == group_id) {
            Some(i) => i,
            None => {
                groups.push(StoryGroup {
                    group_id: group_id.to_string(),
                    entries: Vec::new(),
                });
                groups.len() - 1
            }
        };

        if let Some(locale) = detect_locale(&story.full_slug, locales) {
            let group = &mut groups[index];
            let entry = LocaleEntry {
                locale: locale.to_string(),
                story_id: story.id,
                name: story.name.clone(),
                content_type: story.content_type().to_string(),
                published: story.published,
            };
            // Later stories for the same locale replace earlier ones
            match group.entries.iter_mut().find(|e| e.locale == locale) {
                Some(existing) => *existing = entry,
                None => group.entries.push(entry),
            }
        }
    }

    groups
}

/// Predicates over translation groups, applied conjunctively.
#[derive(Debug, Clone, Default)]
pub struct GroupFilter {
    /// Keep groups with at least one published variant.
    pub any_published: bool,
    /// Keep groups with at least one draft variant.
    pub any_draft: bool,
    /// Keep groups missing at least one locale.
    pub missing_locales: bool,
    /// Case-insensitive substring of any variant name.
    pub name: Option<String>,
    /// Exact content type of any variant.
    pub content_type: Option<String>,
}

impl GroupFilter {
    /// Returns true if the group satisfies every predicate.
    pub fn matches(&self, group: &StoryGroup, locales: &[&str]) -> bool {
        if self.any_published && group.published_count() == 0 {
            return false;
        }
        if self.any_draft && group.draft_count() == 0 {
            return false;
        }
        if self.missing_locales && group.entries.len() >= locales.len() {
            return false;
        }
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            let name = name.to_lowercase();
            if !group
                .entries
                .iter()
                .any(|e| e.name.to_lowercase().contains(&name))
            {
                return false;
            }
        }
        if let Some(ct) = self.content_type.as_deref().filter(|c| !c.is_empty()) {
            if !group.entries.iter().any(|e| e.content_type == ct) {
                return false;
            }
        }
        true
    }
}

/// Ordering for a list of translation groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum GroupSort {
    /// Number of locales with a variant.
    #[default]
    Locales,
    /// Number of published variants.
    Published,
    /// Number of draft variants.
    Drafts,
}

impl GroupSort {
    fn key(self, group: &StoryGroup) -> usize {
        match self {
            GroupSort::Locales => group.entries.len(),
            GroupSort::Published => group.published_count(),
            GroupSort::Drafts => group.draft_count(),
        }
    }
}

/// Sorts groups by a count. Ties keep their current order.
pub fn sort_groups(groups: &mut [&StoryGroup], sort: GroupSort, descending: bool) {
    if descending {
        groups.sort_by_key(|g| Reverse(sort.key(g)));
    } else {
        groups.sort_by_key(|g| sort.key(g));
    }
}

/// Aggregate figures over a set of groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub total_groups: usize,
    pub total_pages: usize,
    pub published_pages: usize,
    /// Share of group/locale slots that have a variant, in percent.
    pub coverage: f64,
}

/// Computes summary metrics for a set of groups.
pub fn summarize_groups(groups: &[StoryGroup], locales: &[&str]) -> GroupSummary {
    let total_groups = groups.len();
    let total_pages: usize = groups.iter().map(|g| g.entries.len()).sum();
    let published_pages: usize = groups.iter().map(StoryGroup::published_count).sum();
    let slots = total_groups * locales.len();
    let coverage = if slots == 0 {
        0.0
    } else {
        (total_pages as f64 / slots as f64) * 100.0
    };

    GroupSummary {
        total_groups,
        total_pages,
        published_pages,
        coverage,
    }
}
