//! Entry parameters that pre-fill the note form.
//!
//! A note can be opened from a link carrying `hs_id=<company id>`, either
//! as a full URL or as a bare query string.

use reqwest::Url;

/// Query parameter carrying the CRM company id.
pub const COMPANY_ID_PARAM: &str = "hs_id";

/// Extracts the company id from an entry link.
///
/// Returns `None` when the parameter is absent or blank.
pub fn company_id_from_link(link: &str) -> Option<String> {
    let link = link.trim();
    if link.is_empty() {
        return None;
    }

    let url = Url::parse(link).or_else(|_| {
        let query = link.trim_start_matches('?');
        Url::parse(&format!("http://localhost/?{query}"))
    });

    let url = match url {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Ignoring unparseable entry link '{}': {}", link, e);
            return None;
        }
    };

    url.query_pairs()
        .find(|(key, _)| key == COMPANY_ID_PARAM)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Returns the company id the form starts with.
///
/// A manually entered id wins over one from the entry link. With neither,
/// the field is blank.
pub fn initial_company_id(link: Option<&str>, manual: Option<&str>) -> String {
    if let Some(id) = manual.map(str::trim).filter(|id| !id.is_empty()) {
        return id.to_string();
    }
    link.and_then(company_id_from_link).unwrap_or_default()
}
