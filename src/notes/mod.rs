//! Meeting-note generation.
//!
//! A note is built from the form fields a user filled in and the company
//! context from a CRM lookup (possibly empty), then rendered through the
//! static [`template::NOTE_TEMPLATE`]. Rendering never fails: missing
//! fields simply leave their slots empty.

pub mod entry;
pub mod template;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::crm::Company;

/// Where a form field appears in the note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    Org,
    Stack,
    Project,
    Summary,
    FollowUp,
}

/// A form field the note knows about.
#[derive(Debug, Clone, Copy)]
pub struct NoteField {
    /// Form key.
    pub key: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    pub section: Section,
    /// Counted in the completion checklist.
    pub checklist: bool,
}

const fn field(key: &'static str, label: &'static str, section: Section, checklist: bool) -> NoteField {
    NoteField {
        key,
        label,
        section,
        checklist,
    }
}

/// Every form field, in display order.
pub const NOTE_FIELDS: &[NoteField] = &[
    field("attendees", "Attendees", Section::Header, false),
    field("date", "Date", Section::Header, false),
    field("decision_maker_firstname", "Decision maker first name", Section::Org, true),
    field("decision_maker_lastname", "Decision maker last name", Section::Org, true),
    field("project_manager_firstname", "Project manager first name", Section::Org, true),
    field("project_manager_lastname", "Project manager last name", Section::Org, true),
    field("company_org_key_people", "Company org & key people", Section::Org, true),
    field("warning_note", "Warnings", Section::Org, true),
    field("current_tms", "Current TMS", Section::Stack, true),
    field("start_date_constraints", "Start date & constraints", Section::Project, true),
    field("number_sites_entities", "Number of sites/entities", Section::Project, true),
    field("number_truckers", "Number of truckers", Section::Project, true),
    field("activities_transport_details", "Activities/transport details", Section::Project, true),
    field("group_network_details", "Group/network details", Section::Project, true),
    field("cross_dock_details", "Cross dock details", Section::Project, true),
    field("summary", "Summary", Section::Summary, false),
    field("next_steps", "Next steps", Section::FollowUp, false),
];

/// Looks up a field by key.
pub fn find_field(key: &str) -> Option<&'static NoteField> {
    NOTE_FIELDS.iter().find(|f| f.key == key)
}

/// Values that mean "nothing was entered".
const PLACEHOLDER_VALUES: &[&str] = &["n/a", "na", "none", "not mentioned", "not specified", "-"];

/// Returns true if a value carries no information.
pub fn is_blank_value(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || PLACEHOLDER_VALUES.contains(&v.to_lowercase().as_str())
}

/// Headcount fields, where zero or a negative number means not asked yet.
const COUNT_FIELDS: &[&str] = &["number_sites_entities", "number_truckers"];

/// Returns true if a field value does not answer its checklist question.
pub fn is_unanswered(key: &str, value: &str) -> bool {
    if is_blank_value(value) {
        return true;
    }
    COUNT_FIELDS.contains(&key)
        && value.trim().parse::<f64>().is_ok_and(|n| n <= 0.0)
}

/// User-entered form values keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NoteForm {
    values: BTreeMap<String, String>,
}

impl NoteForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder-style [`NoteForm::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Returns the trimmed value of a field, or `None` if it is blank.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !is_blank_value(v))
    }

    /// Returns the keys that are not known note fields.
    pub fn unknown_keys(&self) -> Vec<&str> {
        self.values
            .keys()
            .map(String::as_str)
            .filter(|k| find_field(k).is_none())
            .collect()
    }

    /// Returns true if a checklist question has an answer.
    pub fn is_answered(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !is_unanswered(key, v))
    }

    /// Counts filled checklist fields.
    pub fn completion(&self) -> Completion {
        let checklist = NOTE_FIELDS.iter().filter(|f| f.checklist);
        let total = checklist.clone().count();
        let filled = checklist.filter(|f| self.is_answered(f.key)).count();
        Completion { filled, total }
    }

    /// Returns the labels of checklist fields still empty, in display order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        NOTE_FIELDS
            .iter()
            .filter(|f| f.checklist && !self.is_answered(f.key))
            .map(|f| f.label)
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NoteForm {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut form = NoteForm::new();
        for (k, v) in iter {
            form.set(k, v);
        }
        form
    }
}

/// Parses a `key=value` form assignment.
pub fn parse_assignment(input: &str) -> Result<(String, String), String> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| format!("Expected KEY=VALUE, got '{input}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("Missing field name in '{input}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Checklist progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub filled: usize,
    pub total: usize,
}

impl Completion {
    /// Filled share as a whole percentage.
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            (self.filled * 100 + self.total / 2) / self.total
        }
    }

    pub fn is_complete(&self) -> bool {
        self.filled == self.total
    }
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} fields ({}%)",
            self.filled,
            self.total,
            self.percent()
        )
    }
}

/// A meeting note ready to render.
#[derive(Debug, Clone, Serialize)]
pub struct MeetingNote {
    pub company: Company,
    pub attendees: String,
    pub date: String,
    /// Non-blank form values.
    pub fields: BTreeMap<String, String>,
    /// Next steps followed by fields still to collect.
    pub follow_ups: Vec<String>,
    pub completion: Completion,
}

impl MeetingNote {
    /// Builds a note from a company context and form values.
    pub fn build(company: &Company, form: &NoteForm) -> Self {
        let fields = NOTE_FIELDS
            .iter()
            .filter_map(|f| form.get(f.key).map(|v| (f.key.to_string(), v.to_string())))
            .collect();

        let mut follow_ups: Vec<String> = form
            .get("next_steps")
            .map(|steps| {
                steps
                    .lines()
                    .map(|l| l.trim().trim_start_matches(['-', '*']).trim())
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        follow_ups.extend(
            form.missing_fields()
                .into_iter()
                .map(|label| format!("Collect {}", label.to_lowercase())),
        );

        Self {
            company: company.clone(),
            attendees: form.get("attendees").unwrap_or_default().to_string(),
            date: form.get("date").unwrap_or_default().to_string(),
            fields,
            follow_ups,
            completion: form.completion(),
        }
    }

    fn field(&self, key: &str) -> String {
        self.fields.get(key).cloned().unwrap_or_default()
    }

    /// Returns the placeholder values for [`template::NOTE_TEMPLATE`].
    pub fn context(&self) -> BTreeMap<&'static str, String> {
        let mut ctx = BTreeMap::new();

        ctx.insert("company_name", self.company.name.clone());
        ctx.insert("company", company_block(&self.company));
        ctx.insert("date", self.date.clone());
        ctx.insert("attendees", self.attendees.clone());
        ctx.insert(
            "decision_maker",
            full_name(
                &self.field("decision_maker_firstname"),
                &self.field("decision_maker_lastname"),
            ),
        );
        ctx.insert(
            "project_manager",
            full_name(
                &self.field("project_manager_firstname"),
                &self.field("project_manager_lastname"),
            ),
        );
        for f in NOTE_FIELDS {
            if matches!(f.section, Section::Org | Section::Stack | Section::Project | Section::Summary) {
                ctx.entry(f.key).or_insert_with(|| self.field(f.key));
            }
        }
        ctx.insert(
            "follow_ups",
            self.follow_ups
                .iter()
                .map(|item| format!("- {item}"))
                .collect::<Vec<_>>()
                .join("\n"),
        );
        ctx.insert("completion", self.completion.to_string());

        ctx
    }

    /// Renders the note as text.
    pub fn render_text(&self) -> String {
        template::fill_template(template::NOTE_TEMPLATE, &self.context())
    }
}

/// Renders a meeting note from a company context and form values.
pub fn render(company: &Company, form: &NoteForm) -> String {
    MeetingNote::build(company, form).render_text()
}

fn full_name(first: &str, last: &str) -> String {
    [first, last]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders the company section body. Empty for the empty context.
fn company_block(company: &Company) -> String {
    if company.is_empty() {
        return String::new();
    }

    let mut lines = Vec::new();
    if !company.name.is_empty() {
        lines.push(format!("Name: {}", company.name));
    }
    if !company.id.is_empty() {
        lines.push(format!("CRM id: {}", company.id));
    }
    for (label, value) in company.highlights() {
        lines.push(format!("{label}: {value}"));
    }
    lines.join("\n")
}
