//! Static meeting-note template and placeholder substitution.
//!
//! Placeholders are written `{{name}}`. Substitution is literal: there are
//! no conditionals or loops, and unknown placeholders become empty.

use std::collections::BTreeMap;

/// The meeting-note layout.
pub const NOTE_TEMPLATE: &str = "\
# Meeting notes: {{company_name}}

Date: {{date}}
Attendees: {{attendees}}

## Company
{{company}}

## Org
Decision maker: {{decision_maker}}
Project manager: {{project_manager}}
Company org & key people: {{company_org_key_people}}
Warnings: {{warning_note}}

## Stack
Current TMS: {{current_tms}}

## Project size / context
Start date & constraints: {{start_date_constraints}}
Sites / entities: {{number_sites_entities}}
Truckers: {{number_truckers}}
Activities / transport: {{activities_transport_details}}
Group / network: {{group_network_details}}
Cross dock: {{cross_dock_details}}

## Summary
{{summary}}

## Follow-up
{{follow_ups}}

Completion: {{completion}}
";

/// Replaces every `{{name}}` in `template` with its value from `context`.
///
/// Trailing whitespace left on a line by an empty value is removed. An
/// unterminated `{{` is copied through unchanged.
pub fn fill_template(template: &str, context: &BTreeMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len() * 2);
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                if let Some(value) = context.get(key) {
                    out.push_str(value);
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);

    let mut result: String = out
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    result.push('\n');
    result
}

/// Returns the placeholder names used by a template, in order of first use.
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            break;
        };
        let name = after[..end].trim();
        if !names.contains(&name) {
            names.push(name);
        }
        rest = &after[end + 2..];
    }
    names
}
