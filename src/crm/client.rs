//! HTTP client for the CRM company-read endpoint.

use std::collections::BTreeMap;

use reqwest::blocking::Client;
use reqwest::Url;
use serde_json::Value;

use super::{Company, LookupError};

/// Source of company records.
pub trait CompanyClient {
    /// Fetches one company by id.
    fn fetch_company(&self, id: &str) -> Result<Company, LookupError>;
}

impl<T: CompanyClient + ?Sized> CompanyClient for Box<T> {
    fn fetch_company(&self, id: &str) -> Result<Company, LookupError> {
        (**self).fetch_company(id)
    }
}

/// HubSpot companies API client.
pub struct HubspotClient {
    /// HTTP client instance.
    client: Client,
    /// API host, without trailing slash.
    base_url: String,
    /// Private app access token.
    api_key: String,
}

impl HubspotClient {
    /// Creates a new client.
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Returns the company-read URL for an id.
    ///
    /// The id is always one escaped path segment, so `/`, `?` and `#`
    /// cannot reach another endpoint. `.` and `..` name no record.
    pub fn company_url(&self, id: &str) -> Result<Url, LookupError> {
        if matches!(id, "." | "..") {
            return Err(LookupError::NotFound(id.to_string()));
        }

        let mut url = Url::parse(&self.base_url)
            .map_err(|e| LookupError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| LookupError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["companies", "v2", "companies", id]);
        Ok(url)
    }
}

impl CompanyClient for HubspotClient {
    fn fetch_company(&self, id: &str) -> Result<Company, LookupError> {
        let response = self
            .client
            .get(self.company_url(id)?)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .map_err(|e| LookupError::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let body_text = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_status(id, status_code, body_text));
        }

        let json: Value = response
            .json()
            .map_err(|e| LookupError::ParseError(e.to_string()))?;

        company_from_json(id, &json)
    }
}

/// Maps a non-success status to a lookup error.
fn classify_status(id: &str, status: u16, body: String) -> LookupError {
    match status {
        404 => LookupError::NotFound(id.to_string()),
        408 | 429 | 500..=599 => LookupError::Transient(format!("HTTP {status}: {body}")),
        _ => LookupError::Rejected { status, body },
    }
}

/// Builds a company from a company-read response.
///
/// Accepts both the v2 shape, where each property is an object holding a
/// `value`, and the v3 shape with plain scalar properties. A body with
/// neither an id nor properties counts as no record.
fn company_from_json(requested_id: &str, json: &Value) -> Result<Company, LookupError> {
    let record_id = json
        .get("companyId")
        .or_else(|| json.get("id"))
        .and_then(scalar_to_string);

    let props = json.get("properties").and_then(Value::as_object);

    if record_id.is_none() && props.is_none_or(|p| p.is_empty()) {
        return Err(LookupError::NotFound(requested_id.to_string()));
    }

    let mut properties = BTreeMap::new();
    if let Some(props) = props {
        for (key, raw) in props {
            let value = match raw {
                Value::Object(obj) => obj.get("value").and_then(scalar_to_string),
                other => scalar_to_string(other),
            };
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                properties.insert(key.clone(), value);
            }
        }
    }

    Ok(Company {
        id: record_id.unwrap_or_else(|| requested_id.to_string()),
        name: properties.get("name").cloned().unwrap_or_default(),
        properties,
    })
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
