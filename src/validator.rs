use thiserror::Error;
use url::Url;

/// Token an engine url template must carry.
pub const QUERY_TOKEN: &str = "{query}";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name cannot be empty")]
    EmptyName,
    #[error("URL cannot be empty")]
    EmptyUrl,
    #[error("Invalid URL '{url}': {reason}")]
    MalformedUrl { url: String, reason: String },
    #[error("Search URL must contain the {{query}} placeholder")]
    MissingPlaceholder,
}

/// Signature shared by the per-collection url validators.
pub type UrlValidator = fn(&str) -> Result<(), ValidationError>;

/// Pinned sites: anything the URL parser accepts.
pub fn validate_site_url(url: &str) -> Result<(), ValidationError> {
    Url::parse(url)
        .map(|_| ())
        .map_err(|e| ValidationError::MalformedUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

/// Search engines: the template must contain `{query}`.
pub fn validate_engine_url(url: &str) -> Result<(), ValidationError> {
    if url.contains(QUERY_TOKEN) {
        Ok(())
    } else {
        Err(ValidationError::MissingPlaceholder)
    }
}

/// Trim and check both editable fields, returning the values to store.
pub fn validate_fields(
    name: &str,
    url: &str,
    validate_url: UrlValidator,
) -> Result<(String, String), ValidationError> {
    let name = name.trim();
    let url = url.trim();

    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if url.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }
    validate_url(url)?;

    Ok((name.to_string(), url.to_string()))
}
