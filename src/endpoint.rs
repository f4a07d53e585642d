//! Endpoint addressing: a target URL plus ordered query parameters.

use url::Url;

use crate::error::{ApiLinkError, Result};

/// A request target: an absolute URL plus optional query parameters.
///
/// Query parameters are appended to the URL in the order they were added.
/// Duplicate keys are permitted and every key/value pair becomes a distinct
/// parameter (no last-write-wins collapsing).
///
/// Building an `Endpoint` performs no validation and no I/O; the URL is
/// parsed when the request is dispatched, and a malformed URL surfaces as an
/// [`InvalidUrl`](ApiLinkError::InvalidUrl) failure before anything reaches
/// the transport.
///
/// # Examples
///
/// ```rust
/// use apilink::Endpoint;
///
/// let endpoint = Endpoint::new("https://api.example.com/items")
///     .query("id", "42")
///     .query("tag", "a")
///     .query("tag", "b");
/// ```
#[derive(Debug, Clone)]
pub struct Endpoint {
    url: String,
    query: Vec<(String, String)>,
}

impl Endpoint {
    /// Create an endpoint for the given URL, with no query parameters.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
        }
    }

    /// Append a query parameter. Parameters keep insertion order and
    /// duplicate keys are preserved as separate parameters.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Append several query parameters at once, in iteration order.
    pub fn queries<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in params {
            self.query.push((k.into(), v.into()));
        }
        self
    }

    /// The raw URL string this endpoint was built from.
    pub fn url_str(&self) -> &str {
        &self.url
    }

    /// Resolve the endpoint into a parsed URL with all query parameters
    /// appended.
    pub(crate) fn to_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.url)
            .map_err(|_| ApiLinkError::InvalidUrl(self.url.clone()))?;
        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

impl From<&str> for Endpoint {
    fn from(url: &str) -> Self {
        Endpoint::new(url)
    }
}

impl From<String> for Endpoint {
    fn from(url: String) -> Self {
        Endpoint::new(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_order_preserved() {
        let url = Endpoint::new("https://api.example.com/items")
            .query("b", "2")
            .query("a", "1")
            .query("c", "3")
            .to_url()
            .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/items?b=2&a=1&c=3");
    }

    #[test]
    fn test_duplicate_keys_preserved() {
        let url = Endpoint::new("https://api.example.com/search")
            .query("tag", "a")
            .query("tag", "b")
            .to_url()
            .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/search?tag=a&tag=b");
    }

    #[test]
    fn test_existing_query_kept() {
        let url = Endpoint::new("https://api.example.com/items?page=1")
            .query("id", "42")
            .to_url()
            .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/items?page=1&id=42");
    }

    #[test]
    fn test_values_are_encoded() {
        let url = Endpoint::new("https://api.example.com/items")
            .query("q", "a b&c")
            .to_url()
            .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/items?q=a+b%26c");
    }

    #[test]
    fn test_invalid_url() {
        let err = Endpoint::new("not a url").to_url().unwrap_err();
        assert!(matches!(err, ApiLinkError::InvalidUrl(_)));
        assert!(err.to_string().starts_with("Invalid URL"));
    }

    #[test]
    fn test_no_query_leaves_url_untouched() {
        let url = Endpoint::new("https://api.example.com/items").to_url().unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/items");
    }

    #[test]
    fn test_queries_bulk() {
        let url = Endpoint::new("https://api.example.com/items")
            .queries([("a", "1"), ("b", "2")])
            .to_url()
            .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/items?a=1&b=2");
    }
}
