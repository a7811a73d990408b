// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Write-through eligibility.
//!
//! Only same-origin, non-API, `200 OK` responses are ever persisted to the
//! dynamic store. This holds in every mode.

use url::Url;

use crate::response::Response;

#[derive(Debug, Clone)]
pub struct CachePolicy {
    origin: url::Origin,
    api_prefix: String,
}

impl CachePolicy {
    #[must_use]
    pub fn new(origin: &Url, api_prefix: impl Into<String>) -> Self {
        Self {
            origin: origin.origin(),
            api_prefix: api_prefix.into(),
        }
    }

    #[must_use]
    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.origin
    }

    /// Path is under the API prefix. An empty prefix matches nothing.
    #[must_use]
    pub fn is_api(&self, url: &Url) -> bool {
        !self.api_prefix.is_empty() && url.path().starts_with(&self.api_prefix)
    }

    /// Whether a network response for `url` may be written through.
    #[must_use]
    pub fn should_persist(&self, url: &Url, response: &Response) -> bool {
        response.status == 200 && self.is_same_origin(url) && !self.is_api(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> CachePolicy {
        CachePolicy::new(&Url::parse("https://app.example").unwrap(), "/api/")
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_same_origin_asset_is_persisted() {
        assert!(policy().should_persist(&url("https://app.example/app.js"), &Response::ok("x")));
    }

    #[test]
    fn test_api_path_never_persisted() {
        let p = policy();
        assert!(p.is_api(&url("https://app.example/api/predictions")));
        assert!(!p.should_persist(&url("https://app.example/api/predictions"), &Response::ok("[]")));
        // Prefix match is on path segments as written, "/apis" is not "/api/"
        assert!(!p.is_api(&url("https://app.example/apis")));
    }

    #[test]
    fn test_foreign_origin_never_persisted() {
        let p = policy();
        assert!(!p.is_same_origin(&url("https://cdn.example/lib.js")));
        assert!(!p.is_same_origin(&url("http://app.example/app.js")));
        assert!(!p.should_persist(&url("https://cdn.example/lib.js"), &Response::ok("x")));
    }

    #[test]
    fn test_non_200_not_persisted() {
        let p = policy();
        let u = url("https://app.example/missing.js");
        assert!(!p.should_persist(&u, &Response::new(404, "Not Found", Vec::new())));
        assert!(!p.should_persist(&u, &Response::new(206, "Partial Content", Vec::new())));
    }

    #[test]
    fn test_empty_prefix_matches_nothing() {
        let p = CachePolicy::new(&Url::parse("https://app.example").unwrap(), "");
        assert!(!p.is_api(&url("https://app.example/api/x")));
    }
}
