//! CRM company lookup.
//!
//! Fetches a single company record by id and maps it into the context
//! used to seed meeting notes. Lookups are never cached and never retried.
//!
//! # Submodules
//!
//! - `client` - HTTP client for the company-read endpoint

pub mod client;

use std::collections::BTreeMap;

use serde::Serialize;

pub use client::{CompanyClient, HubspotClient};

/// Default CRM API host.
pub const DEFAULT_CRM_URL: &str = "https://api.hubapi.com";

/// Default CRM web app host, used for record links.
pub const DEFAULT_CRM_APP_URL: &str = "https://app.hubspot.com";

/// Company properties shown in notes and lookups, with display labels.
pub const COMPANY_FIELDS: &[(&str, &str)] = &[
    ("domain", "Domain"),
    ("industry", "Industry"),
    ("city", "City"),
    ("country", "Country"),
    ("numberofemployees", "Employees"),
    ("lifecyclestage", "Lifecycle stage"),
];

/// A CRM company record.
///
/// `Company::default()` is the empty context used when a lookup was
/// skipped or failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Company {
    /// CRM record id.
    pub id: String,
    /// Company name (the `name` property).
    pub name: String,
    /// Every non-empty property as a string.
    pub properties: BTreeMap<String, String>,
}

impl Company {
    /// Returns true for the empty context.
    pub fn is_empty(&self) -> bool {
        self.id.is_empty() && self.name.is_empty() && self.properties.is_empty()
    }

    /// Returns a property value, if set.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Returns the labelled [`COMPANY_FIELDS`] that have values.
    pub fn highlights(&self) -> Vec<(&'static str, &str)> {
        COMPANY_FIELDS
            .iter()
            .filter_map(|(key, label)| self.property(key).map(|v| (*label, v)))
            .collect()
    }
}

/// Builds the CRM web link for a company record.
pub fn record_url(app_base: &str, portal_id: &str, company_id: &str) -> String {
    format!(
        "{}/contacts/{portal_id}/record/0-2/{company_id}",
        app_base.trim_end_matches('/')
    )
}

/// Looks up a company by id.
///
/// Blank ids are reported as not found without a network call. Every
/// other call is a live round trip.
pub fn lookup_company<C: CompanyClient + ?Sized>(
    client: &C,
    id: &str,
) -> Result<Company, LookupError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(LookupError::NotFound(String::new()));
    }

    tracing::debug!("Looking up company {}", id);
    let company = client.fetch_company(id)?;
    tracing::debug!("Found company {} ({})", company.name, company.id);
    Ok(company)
}

/// Errors that can occur during a company lookup.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LookupError {
    /// The CRM has no record with this id.
    #[error("No company found for id '{0}'")]
    NotFound(String),

    /// Network failure, timeout, rate limit or server error. Retrying
    /// later may succeed.
    #[error("Company lookup failed, try again: {0}")]
    Transient(String),

    /// The CRM refused the request (for example bad credentials).
    #[error("CRM rejected the request ({status}): {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// The CRM response could not be decoded.
    #[error("Failed to parse CRM response: {0}")]
    ParseError(String),

    /// The configured CRM host is not a usable base URL.
    #[error("Invalid CRM URL: {0}")]
    InvalidUrl(String),
}

impl LookupError {
    /// Returns true if a manual retry may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, LookupError::Transient(_))
    }
}
