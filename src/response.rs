//! Response and cache entry types.

use serde::{Deserialize, Serialize};

use crate::request::RequestKey;

/// A response body plus status and headers.
///
/// Responses are plain data, so "cloning into the cache" is a `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    #[must_use]
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// 200 OK with the given body.
    #[must_use]
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, "OK", body)
    }

    /// The terminal response produced when nothing else can answer.
    #[must_use]
    pub fn service_unavailable() -> Self {
        Self::new(503, "Service Unavailable", Vec::new())
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup (first match).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// 2xx
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A stored response. Entries are only ever overwritten whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: RequestKey,
    pub response: Response,
    /// Epoch millis
    pub stored_at: i64,
}

impl CacheEntry {
    #[must_use]
    pub fn new(key: RequestKey, response: Response) -> Self {
        Self {
            key,
            response,
            stored_at: now_millis(),
        }
    }
}

/// Which branch of the router produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseSource {
    /// Served from a cache store without touching the network
    Cache,
    /// Fresh network response
    Network,
    /// The designated offline document
    OfflineDocument,
    /// Synthesized 503
    Unavailable,
}

impl ResponseSource {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Network => "network",
            Self::OfflineDocument => "offline_document",
            Self::Unavailable => "unavailable",
        }
    }
}

impl std::fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Router output: the response and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedResponse {
    pub response: Response,
    pub source: ResponseSource,
}

impl ServedResponse {
    #[must_use]
    pub fn new(response: Response, source: ResponseSource) -> Self {
        Self { response, source }
    }

    #[must_use]
    pub fn unavailable() -> Self {
        Self::new(Response::service_unavailable(), ResponseSource::Unavailable)
    }
}

pub(crate) fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_unavailable_is_503() {
        let resp = Response::service_unavailable();
        assert_eq!(resp.status, 503);
        assert_eq!(resp.status_text, "Service Unavailable");
        assert!(resp.body.is_empty());
        assert!(!resp.is_success());
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let resp = Response::ok("x").with_header("Content-Type", "text/html");
        assert_eq!(resp.header("content-type"), Some("text/html"));
        assert_eq!(resp.header("etag"), None);
    }

    #[test]
    fn test_is_success_range() {
        assert!(Response::new(204, "No Content", Vec::new()).is_success());
        assert!(!Response::new(304, "Not Modified", Vec::new()).is_success());
        assert!(!Response::new(404, "Not Found", Vec::new()).is_success());
    }

    #[test]
    fn test_entry_records_store_time() {
        let key = RequestKey { method: "GET".into(), url: "https://app.example/".into() };
        let before = now_millis();
        let entry = CacheEntry::new(key, Response::ok("hi"));
        assert!(entry.stored_at >= before);
    }

    #[test]
    fn test_source_display() {
        assert_eq!(ResponseSource::OfflineDocument.to_string(), "offline_document");
        assert_eq!(ServedResponse::unavailable().source, ResponseSource::Unavailable);
    }
}
