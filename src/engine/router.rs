//! Request routing.
//!
//! Every intercepted request ends in a response. Forced-offline mode never
//! touches the network; normal mode is cache-first with write-through of
//! eligible network responses into the dynamic store. A synthesized 503 is
//! only produced when the offline document itself is missing.

use tracing::{debug, warn};

use crate::metrics::LatencyTimer;
use crate::registry::StoreKind;
use crate::request::{CacheRequest, RequestKey};
use crate::response::{CacheEntry, Response, ResponseSource, ServedResponse};

use super::{CacheEngine, FetchDecision};

impl CacheEngine {
    /// Decide how to answer an outbound request.
    ///
    /// Requests pass through unless the engine is active and the request is
    /// a GET over http(s).
    #[tracing::instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn handle_fetch(&self, request: &CacheRequest) -> FetchDecision {
        if !self.is_active() || !request.is_interceptable() {
            crate::metrics::record_passthrough();
            return FetchDecision::Passthrough;
        }

        let _timer = LatencyTimer::new("handle_fetch");
        let served = if self.flags.force_offline() {
            self.serve_forced_offline(request).await
        } else {
            self.serve_cache_first(request).await
        };

        debug!(source = %served.source, status = served.response.status, "Request answered");
        crate::metrics::record_response(served.source);
        FetchDecision::Respond(served)
    }

    async fn serve_forced_offline(&self, request: &CacheRequest) -> ServedResponse {
        if request.is_document() {
            if let Some(doc) = self.offline_document().await {
                return doc;
            }
        }

        if let Some(entry) = self.lookup(&request.key()).await {
            return ServedResponse::new(entry.response, ResponseSource::Cache);
        }

        self.offline_document_or_unavailable().await
    }

    async fn serve_cache_first(&self, request: &CacheRequest) -> ServedResponse {
        let key = request.key();
        if let Some(entry) = self.lookup(&key).await {
            return ServedResponse::new(entry.response, ResponseSource::Cache);
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if self.policy.should_persist(&request.url, &response) {
                    self.write_through(key, &response).await;
                }
                ServedResponse::new(response, ResponseSource::Network)
            }
            Err(e) => {
                crate::metrics::record_network_failure();
                debug!(error = %e, "Network fetch failed, falling back");
                if !request.is_document() {
                    if let Some(entry) = self.lookup(&key).await {
                        return ServedResponse::new(entry.response, ResponseSource::Cache);
                    }
                }
                self.offline_document_or_unavailable().await
            }
        }
    }

    /// Persist a network response into the current dynamic store.
    /// Failures are logged and counted, never surfaced.
    async fn write_through(&self, key: RequestKey, response: &Response) {
        let store = self.registry.dynamic_name();
        let entry = CacheEntry::new(key, response.clone());

        let result = match self.storage.open(store).await {
            Ok(()) => self.storage.put(store, entry).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => crate::metrics::record_write_through(StoreKind::Dynamic),
            Err(e) => {
                crate::metrics::record_write_through_failure(StoreKind::Dynamic);
                warn!(store = %store, error = %e, "Write-through failed, response served uncached");
            }
        }
    }

    /// Cache match across all stores. Read errors count as a miss.
    async fn lookup(&self, key: &RequestKey) -> Option<CacheEntry> {
        match self.storage.match_any(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache lookup failed, treating as miss");
                None
            }
        }
    }

    /// The offline document, preferring the current static store.
    async fn offline_document(&self) -> Option<ServedResponse> {
        let from_static = match self.storage.get(self.registry.static_name(), &self.offline_key).await {
            Ok(hit) => hit,
            Err(e) => {
                debug!(error = %e, "Static store unavailable for offline document");
                None
            }
        };

        let entry = match from_static {
            Some(entry) => Some(entry),
            None => self.lookup(&self.offline_key).await,
        };
        entry.map(|e| ServedResponse::new(e.response, ResponseSource::OfflineDocument))
    }

    async fn offline_document_or_unavailable(&self) -> ServedResponse {
        match self.offline_document().await {
            Some(doc) => doc,
            None => {
                warn!("Offline document missing from cache, answering 503");
                ServedResponse::unavailable()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{create_test_engine, site_fetcher, test_config};
    use super::*;
    use crate::storage::CacheStorage;
    use url::Url;

    fn url(path: &str) -> Url {
        Url::parse("https://app.example").unwrap().join(path).unwrap()
    }

    #[tokio::test]
    async fn test_passthrough_until_active() {
        let (engine, _, _) = create_test_engine(test_config(), site_fetcher());
        engine.install_from_config().await.unwrap();

        let decision = engine.handle_fetch(&CacheRequest::get(url("/app.js"))).await;
        assert!(decision.is_passthrough());
    }

    #[tokio::test]
    async fn test_non_get_and_non_http_pass_through() {
        let (engine, _, _) = create_test_engine(test_config(), site_fetcher());
        engine.install_from_config().await.unwrap();
        engine.activate().await.unwrap();

        let post = CacheRequest::new(crate::request::Method::Post, url("/api/predictions"), crate::request::Destination::Other);
        assert!(engine.handle_fetch(&post).await.is_passthrough());

        let ext = CacheRequest::get(Url::parse("chrome-extension://abc/script.js").unwrap());
        assert!(engine.handle_fetch(&ext).await.is_passthrough());
    }

    #[tokio::test]
    async fn test_precached_asset_served_from_cache() {
        let fetcher = site_fetcher();
        let (engine, _, _) = create_test_engine(test_config(), fetcher.clone());
        engine.install_from_config().await.unwrap();
        engine.activate().await.unwrap();
        let before = fetcher.calls();

        let decision = engine.handle_fetch(&CacheRequest::get(url("/app.js"))).await;
        assert_eq!(decision.source(), Some(ResponseSource::Cache));
        assert_eq!(fetcher.calls(), before);
    }

    #[tokio::test]
    async fn test_write_through_then_cache_hit() {
        let fetcher = site_fetcher();
        fetcher.responses.insert(url("/scores.json").to_string(), Response::ok("[1]"));
        let (engine, storage, _) = create_test_engine(test_config(), fetcher.clone());
        engine.install_from_config().await.unwrap();
        engine.activate().await.unwrap();

        let first = engine.handle_fetch(&CacheRequest::get(url("/scores.json"))).await;
        assert_eq!(first.source(), Some(ResponseSource::Network));
        assert_eq!(storage.entry_count("sports-central-dynamic-v1"), 1);

        let calls = fetcher.calls();
        let second = engine.handle_fetch(&CacheRequest::get(url("/scores.json"))).await;
        assert_eq!(second.source(), Some(ResponseSource::Cache));
        assert_eq!(fetcher.calls(), calls);
    }

    #[tokio::test]
    async fn test_api_and_foreign_responses_not_persisted() {
        let fetcher = site_fetcher();
        fetcher.responses.insert(url("/api/predictions").to_string(), Response::ok("{}"));
        fetcher.responses.insert("https://cdn.example/lib.js".into(), Response::ok("lib"));
        let (engine, storage, _) = create_test_engine(test_config(), fetcher);
        engine.install_from_config().await.unwrap();
        engine.activate().await.unwrap();

        let api = engine.handle_fetch(&CacheRequest::get(url("/api/predictions"))).await;
        assert_eq!(api.source(), Some(ResponseSource::Network));
        let cdn = engine
            .handle_fetch(&CacheRequest::get(Url::parse("https://cdn.example/lib.js").unwrap()))
            .await;
        assert_eq!(cdn.source(), Some(ResponseSource::Network));

        assert!(!storage.has("sports-central-dynamic-v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_error_status_not_persisted() {
        let fetcher = site_fetcher();
        fetcher.responses.insert(url("/missing").to_string(), Response::new(404, "Not Found", ""));
        let (engine, storage, _) = create_test_engine(test_config(), fetcher);
        engine.install_from_config().await.unwrap();
        engine.activate().await.unwrap();

        let decision = engine.handle_fetch(&CacheRequest::get(url("/missing"))).await;
        assert_eq!(decision.into_served().unwrap().response.status, 404);
        assert_eq!(storage.entry_count("sports-central-dynamic-v1"), 0);
    }

    #[tokio::test]
    async fn test_network_failure_fallbacks() {
        let (engine, _, _) = create_test_engine(test_config(), site_fetcher());
        engine.install_from_config().await.unwrap();
        engine.activate().await.unwrap();

        let doc = engine.handle_fetch(&CacheRequest::navigate(url("/match/9"))).await;
        let served = doc.into_served().unwrap();
        assert_eq!(served.source, ResponseSource::OfflineDocument);
        assert_eq!(served.response.body, b"<html>offline</html>".to_vec());

        let asset = engine.handle_fetch(&CacheRequest::get(url("/img/logo.png"))).await;
        assert_eq!(asset.source(), Some(ResponseSource::OfflineDocument));
    }

    #[tokio::test]
    async fn test_network_failure_without_offline_document_is_503() {
        let (engine, storage, _) = create_test_engine(test_config(), site_fetcher());
        engine.install_from_config().await.unwrap();
        engine.activate().await.unwrap();
        storage.clear();

        let asset = engine.handle_fetch(&CacheRequest::get(url("/img/logo.png"))).await;
        let served = asset.into_served().unwrap();
        assert_eq!(served.source, ResponseSource::Unavailable);
        assert_eq!(served.response.status, 503);
        assert_eq!(served.response.status_text, "Service Unavailable");
    }

    #[tokio::test]
    async fn test_forced_offline_never_fetches() {
        let fetcher = site_fetcher();
        let (engine, _, _) = create_test_engine(test_config(), fetcher.clone());
        engine.install_from_config().await.unwrap();
        engine.activate().await.unwrap();
        engine.flags().set_force_offline(true);
        let calls = fetcher.calls();

        let doc = engine.handle_fetch(&CacheRequest::navigate(url("/"))).await;
        assert_eq!(doc.source(), Some(ResponseSource::OfflineDocument));

        let cached = engine.handle_fetch(&CacheRequest::get(url("/app.js"))).await;
        assert_eq!(cached.source(), Some(ResponseSource::Cache));

        let api = engine.handle_fetch(&CacheRequest::get(url("/api/predictions"))).await;
        assert_eq!(api.source(), Some(ResponseSource::OfflineDocument));

        assert_eq!(fetcher.calls(), calls);
    }

    #[tokio::test]
    async fn test_forced_offline_without_offline_document_is_503() {
        let (engine, storage, _) = create_test_engine(test_config(), site_fetcher());
        engine.install_from_config().await.unwrap();
        engine.activate().await.unwrap();
        storage.clear();
        engine.flags().set_force_offline(true);

        let decision = engine.handle_fetch(&CacheRequest::navigate(url("/"))).await;
        assert_eq!(decision.source(), Some(ResponseSource::Unavailable));
    }

    #[tokio::test]
    async fn test_fragment_ignored_for_cache_identity() {
        let (engine, _, _) = create_test_engine(test_config(), site_fetcher());
        engine.install_from_config().await.unwrap();
        engine.activate().await.unwrap();
        engine.flags().set_force_offline(true);

        let decision = engine.handle_fetch(&CacheRequest::get(url("/app.js#v=2"))).await;
        assert_eq!(decision.source(), Some(ResponseSource::Cache));
    }
}
