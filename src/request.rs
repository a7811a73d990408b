//! Intercepted request model.
//!
//! A [`CacheRequest`] is what the host hands to the engine for every outgoing
//! request. Cache entries are keyed by [`RequestKey`]: the method plus the
//! normalized URL (fragment stripped, query kept).
//!
//! # Example
//!
//! ```
//! use offline_cache_engine::{CacheRequest, Destination};
//! use url::Url;
//!
//! let url = Url::parse("https://app.example/app.js#top").unwrap();
//! let request = CacheRequest::get(url);
//!
//! assert!(request.is_interceptable());
//! assert_eq!(request.key().url, "https://app.example/app.js");
//! assert_eq!(request.destination, Destination::Other);
//! ```

use serde::{Deserialize, Serialize};
use url::Url;

/// HTTP method of an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Other(String),
}

impl Method {
    /// Parse a method token (case-insensitive).
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "HEAD" => Self::Head,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "PATCH" => Self::Patch,
            "DELETE" => Self::Delete,
            "OPTIONS" => Self::Options,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Other(token) => token,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the requesting context will do with the response.
///
/// Only [`Destination::Document`] changes routing: top-level navigations
/// fall back to the offline document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Destination {
    /// Top-level navigation
    Document,
    Script,
    Style,
    Image,
    Font,
    Manifest,
    /// fetch()/XHR and anything unclassified
    Other,
}

/// Cache identity of a request: method + normalized URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    /// Build a key, dropping the URL fragment.
    #[must_use]
    pub fn new(method: &Method, url: &Url) -> Self {
        let mut normalized = url.clone();
        normalized.set_fragment(None);
        Self {
            method: method.as_str().to_string(),
            url: normalized.into(),
        }
    }

    /// Key for a GET of `url`.
    #[must_use]
    pub fn get(url: &Url) -> Self {
        Self::new(&Method::Get, url)
    }
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// An outbound request observed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRequest {
    pub method: Method,
    pub url: Url,
    pub destination: Destination,
    pub headers: Vec<(String, String)>,
}

impl CacheRequest {
    #[must_use]
    pub fn new(method: Method, url: Url, destination: Destination) -> Self {
        Self {
            method,
            url,
            destination,
            headers: Vec::new(),
        }
    }

    /// A plain GET (sub-resource or fetch()).
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self::new(Method::Get, url, Destination::Other)
    }

    /// A top-level document navigation.
    #[must_use]
    pub fn navigate(url: Url) -> Self {
        Self::new(Method::Get, url, Destination::Document)
    }

    #[must_use]
    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, &self.url)
    }

    #[must_use]
    pub fn is_document(&self) -> bool {
        self.destination == Destination::Document
    }

    /// Only GETs over http(s) are routed; everything else passes through.
    #[must_use]
    pub fn is_interceptable(&self) -> bool {
        self.method == Method::Get && matches!(self.url.scheme(), "http" | "https")
    }
}

/// Resolve a manifest path (or absolute URL) against the application origin.
pub fn resolve(origin: &Url, path: &str) -> Result<Url, url::ParseError> {
    origin.join(path)
}
