//! Remote-document link recognition and download URL construction.

use regex::Regex;

/// Placeholder substituted with the remote document id in a download template.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Recognizes anchor targets that open a remote document and extracts the id.
///
/// Built once from the configured prefix; matching is anchored at the start of
/// the attribute value and the id is everything after the prefix.
#[derive(Debug, Clone)]
pub struct LinkPattern {
    prefix: String,
    re: Regex,
}

impl LinkPattern {
    pub fn new(prefix: &str) -> Result<Self, regex::Error> {
        let re = Regex::new(&format!("^{}(.+)$", regex::escape(prefix)))?;
        Ok(Self {
            prefix: prefix.to_string(),
            re,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the remote id if `value` is a document link. Never returns an empty id.
    pub fn remote_id<'a>(&self, value: &'a str) -> Option<&'a str> {
        self.re
            .captures(value.trim())
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .filter(|id| !id.is_empty())
    }
}

/// Download endpoint template, e.g. `https://drive.google.com/uc?export=download&id={id}`.
#[derive(Debug, Clone)]
pub struct DownloadEndpoint {
    template: String,
}

impl DownloadEndpoint {
    /// Validates that the template contains `{id}` and yields a parseable URL.
    pub fn new(template: &str) -> Result<Self, EndpointError> {
        if !template.contains(ID_PLACEHOLDER) {
            return Err(EndpointError::MissingPlaceholder(template.to_string()));
        }
        let endpoint = Self {
            template: template.to_string(),
        };
        url::Url::parse(&endpoint.fetch_url("id")).map_err(|source| EndpointError::Invalid {
            template: template.to_string(),
            source,
        })?;
        Ok(endpoint)
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Builds the fetch URL for a remote id. The id is form-encoded so it can't
    /// break out of its query parameter.
    pub fn fetch_url(&self, remote_id: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(remote_id.as_bytes()).collect();
        self.template.replace(ID_PLACEHOLDER, &encoded)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("download template {0:?} has no {{id}} placeholder")]
    MissingPlaceholder(String),
    #[error("download template {template:?} does not produce a valid URL: {source}")]
    Invalid {
        template: String,
        #[source]
        source: url::ParseError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    const DRIVE_OPEN: &str = "https://drive.google.com/open?id=";

    #[test]
    fn extracts_id_after_prefix() {
        let p = LinkPattern::new(DRIVE_OPEN).unwrap();
        assert_eq!(
            p.remote_id("https://drive.google.com/open?id=ABC123"),
            Some("ABC123")
        );
    }

    #[test]
    fn prefix_is_literal_not_regex() {
        let p = LinkPattern::new(DRIVE_OPEN).unwrap();
        // `?` and `.` in the prefix must not act as metacharacters.
        assert_eq!(p.remote_id("https://drive.google.com/openid=ABC"), None);
        assert_eq!(p.remote_id("https://drivexgoogle.com/open?id=ABC"), None);
    }

    #[test]
    fn non_matching_and_empty_ids_are_rejected() {
        let p = LinkPattern::new(DRIVE_OPEN).unwrap();
        assert_eq!(p.remote_id("https://example.com"), None);
        assert_eq!(p.remote_id(DRIVE_OPEN), None);
        assert_eq!(p.remote_id("see https://drive.google.com/open?id=X"), None);
    }

    #[test]
    fn builds_drive_download_url() {
        let e = DownloadEndpoint::new("https://drive.google.com/uc?export=download&id={id}").unwrap();
        assert_eq!(
            e.fetch_url("ABC123"),
            "https://drive.google.com/uc?export=download&id=ABC123"
        );
    }

    #[test]
    fn id_is_query_encoded() {
        let e = DownloadEndpoint::new("https://example.com/dl?id={id}").unwrap();
        assert_eq!(e.fetch_url("a&b=c"), "https://example.com/dl?id=a%26b%3Dc");
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        assert!(matches!(
            DownloadEndpoint::new("https://example.com/dl"),
            Err(EndpointError::MissingPlaceholder(_))
        ));
        assert!(matches!(
            DownloadEndpoint::new("not a url {id}"),
            Err(EndpointError::Invalid { .. })
        ));
    }
}
