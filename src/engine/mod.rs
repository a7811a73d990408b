// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Cache engine coordinator.
//!
//! The [`CacheEngine`] ties together all components:
//! - Cache registry naming the current static and dynamic stores
//! - Install and activation of a deployment
//! - Request routing across cache, network and the offline document
//! - The control channel mutating [`EngineFlags`]
//! - Push notifications and the deferred sync queue
//!
//! # Lifecycle
//!
//! ```text
//! Created → Installing → Installed → Activating → Active
//!               ↓
//!           Redundant (install failed; retry allowed)
//! ```
//!
//! A new deployment is a new engine with bumped versions over the same
//! [`CacheStorage`]. The previous engine keeps serving until the new one
//! activates and evicts its stores.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use offline_cache_engine::{
//!     CacheEngine, CacheRequest, EngineConfig, EngineState, HttpFetcher,
//!     InMemoryCacheStorage, InMemoryHost,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), offline_cache_engine::EngineError> {
//! let config = EngineConfig {
//!     origin: "https://scores.example".into(),
//!     ..Default::default()
//! };
//! let host = Arc::new(InMemoryHost::new());
//! let engine = CacheEngine::new(
//!     config,
//!     Arc::new(InMemoryCacheStorage::new()),
//!     Arc::new(HttpFetcher::new(None)?),
//!     host.clone(),
//!     host,
//! )?;
//!
//! engine.install_from_config().await?;
//! engine.activate().await?;
//! assert_eq!(engine.state(), EngineState::Active);
//!
//! let request = CacheRequest::navigate("https://scores.example/".parse().unwrap());
//! let decision = engine.handle_fetch(&request).await;
//! # Ok(())
//! # }
//! ```

mod control;
mod lifecycle;
mod router;
mod types;

pub use types::{ActivationReport, EngineState, FetchDecision, InstallReport};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tracing::debug;
use url::Url;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::flags::EngineFlags;
use crate::host::{ClientHost, NotificationHost};
use crate::network::{Fetcher, HttpFetcher};
use crate::notify::{Notification, NotificationDispatcher};
use crate::policy::CachePolicy;
use crate::registry::CacheRegistry;
use crate::request::{resolve, RequestKey};
use crate::storage::CacheStorage;
use crate::sync_queue::{SyncOutcome, SyncQueue};

/// Main cache engine coordinator.
///
/// `handle_fetch` and `handle_control` take `&self` and may run
/// concurrently. Install and activation are serialized by an internal
/// lifecycle lock that request handling never takes.
pub struct CacheEngine {
    /// Configuration this deployment was built from
    pub(super) config: EngineConfig,

    /// Parsed application origin
    pub(super) origin: Url,

    pub(super) registry: CacheRegistry,

    /// Write-through eligibility
    pub(super) policy: CachePolicy,

    /// Runtime flags mutated by the control channel
    pub(super) flags: EngineFlags,

    /// Engine state (broadcast to watchers)
    pub(super) state: watch::Sender<EngineState>,

    /// Engine state receiver (internal)
    pub(super) state_rx: watch::Receiver<EngineState>,

    /// Serializes install and activation
    pub(super) lifecycle_lock: Mutex<()>,

    /// Named stores shared across deployments
    pub(super) storage: Arc<dyn CacheStorage>,

    pub(super) fetcher: Arc<dyn Fetcher>,

    pub(super) clients: Arc<dyn ClientHost>,

    pub(super) notifications: NotificationDispatcher,

    pub(super) sync_queue: SyncQueue,

    /// Key of the offline document
    pub(super) offline_key: RequestKey,
}

impl CacheEngine {
    /// Create a new engine from a validated config.
    ///
    /// The engine starts in `Created` state. Call [`install()`](Self::install)
    /// then [`activate()`](Self::activate) to start intercepting requests.
    pub fn new(
        config: EngineConfig,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        clients: Arc<dyn ClientHost>,
        notifications: Arc<dyn NotificationHost>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let origin = config.origin_url()?;
        let offline_url = resolve(&origin, &config.offline_document).map_err(|e| EngineError::InvalidManifestEntry {
            entry: config.offline_document.clone(),
            reason: e.to_string(),
        })?;

        let registry = CacheRegistry::from_config(&config);
        let policy = CachePolicy::new(&origin, config.api_prefix.clone());
        let flags = EngineFlags::new();
        if config.skip_waiting_on_install {
            flags.set_skip_waiting(true);
        }
        let dispatcher = NotificationDispatcher::new(config.notifications.clone(), notifications, clients.clone());
        let (state_tx, state_rx) = watch::channel(EngineState::Created);

        debug!(
            static_store = %registry.static_name(),
            dynamic_store = %registry.dynamic_name(),
            "Cache engine created"
        );

        Ok(Self {
            config,
            origin,
            registry,
            policy,
            flags,
            state: state_tx,
            state_rx,
            lifecycle_lock: Mutex::new(()),
            storage,
            fetcher,
            clients,
            notifications: dispatcher,
            sync_queue: SyncQueue::new(),
            offline_key: RequestKey::get(&offline_url),
        })
    }

    /// Create an engine that fetches over HTTP, honouring `fetch_timeout_ms`.
    pub fn with_http(
        config: EngineConfig,
        storage: Arc<dyn CacheStorage>,
        clients: Arc<dyn ClientHost>,
        notifications: Arc<dyn NotificationHost>,
    ) -> Result<Self, EngineError> {
        let timeout = config.fetch_timeout_ms.map(Duration::from_millis);
        let fetcher = Arc::new(HttpFetcher::new(timeout)?);
        Self::new(config, storage, fetcher, clients, notifications)
    }

    /// Get current engine state.
    #[must_use]
    pub fn state(&self) -> EngineState {
        *self.state_rx.borrow()
    }

    /// Get a receiver to watch state changes.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<EngineState> {
        self.state_rx.clone()
    }

    /// Check if the engine is intercepting requests.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.state(), EngineState::Active)
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    #[must_use]
    pub fn flags(&self) -> &EngineFlags {
        &self.flags
    }

    #[must_use]
    pub fn registry(&self) -> &CacheRegistry {
        &self.registry
    }

    #[must_use]
    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    /// Queue for deferred background work. Hosts register replay routines here.
    #[must_use]
    pub fn sync_queue(&self) -> &SyncQueue {
        &self.sync_queue
    }

    /// Display a notification for a push event.
    pub async fn on_push(&self, data: Option<&[u8]>) -> Result<Notification, EngineError> {
        self.notifications.on_push(data).await
    }

    /// Route a notification click to a client window. Returns the opened url.
    pub async fn on_notification_click(&self, notification: &Notification) -> Result<String, EngineError> {
        self.notifications.on_notification_click(notification).await
    }

    /// Replay the deferred work registered under `tag`.
    pub async fn on_sync_trigger(&self, tag: &str) -> SyncOutcome {
        self.sync_queue.on_sync_trigger(tag).await
    }

    pub(super) fn set_state(&self, state: EngineState) {
        let _ = self.state.send(state);
        crate::metrics::set_engine_state(state);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::host::InMemoryHost;
    use crate::network::FetchError;
    use crate::request::CacheRequest;
    use crate::response::Response;
    use crate::storage::InMemoryCacheStorage;
    use async_trait::async_trait;
    use dashmap::DashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fetcher answering from a fixed table; unknown urls are network errors.
    #[derive(Default)]
    pub(crate) struct TableFetcher {
        pub responses: DashMap<String, Response>,
        pub calls: AtomicUsize,
    }

    impl TableFetcher {
        pub fn with(entries: &[(&str, &str)]) -> Self {
            let fetcher = Self::default();
            for (url, body) in entries {
                fetcher.responses.insert(url.to_string(), Response::ok(*body));
            }
            fetcher
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher for TableFetcher {
        async fn fetch(&self, request: &CacheRequest) -> Result<Response, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .get(request.url.as_str())
                .map(|r| r.value().clone())
                .ok_or_else(|| FetchError::Network {
                    url: request.url.to_string(),
                    reason: "unreachable".into(),
                })
        }
    }

    pub(crate) fn test_config() -> EngineConfig {
        EngineConfig {
            cache_prefix: "sports-central".into(),
            static_version: "2.1".into(),
            dynamic_version: "1".into(),
            origin: "https://app.example".into(),
            manifest: vec!["/".into(), "/offline.html".into(), "/app.js".into()],
            ..Default::default()
        }
    }

    pub(crate) fn site_fetcher() -> Arc<TableFetcher> {
        Arc::new(TableFetcher::with(&[
            ("https://app.example/", "<html>home</html>"),
            ("https://app.example/offline.html", "<html>offline</html>"),
            ("https://app.example/app.js", "console.log(1)"),
        ]))
    }

    pub(crate) fn create_test_engine(
        config: EngineConfig,
        fetcher: Arc<TableFetcher>,
    ) -> (CacheEngine, Arc<InMemoryCacheStorage>, Arc<InMemoryHost>) {
        let storage = Arc::new(InMemoryCacheStorage::new());
        let host = Arc::new(InMemoryHost::with_clients(1));
        let engine = CacheEngine::new(config, storage.clone(), fetcher, host.clone(), host.clone()).unwrap();
        (engine, storage, host)
    }

    #[test]
    fn test_engine_created_state() {
        let (engine, _, _) = create_test_engine(test_config(), site_fetcher());
        assert_eq!(engine.state(), EngineState::Created);
        assert!(!engine.is_active());
        assert!(!engine.flags().force_offline());
        assert_eq!(engine.registry().static_name(), "sports-central-v2.1");
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = EngineConfig {
            manifest: vec!["/".into()],
            ..test_config()
        };
        let storage = Arc::new(InMemoryCacheStorage::new());
        let host = Arc::new(InMemoryHost::new());
        let result = CacheEngine::new(config, storage, site_fetcher(), host.clone(), host);
        assert!(matches!(result, Err(EngineError::OfflineDocumentNotInManifest(_))));
    }

    #[test]
    fn test_skip_waiting_on_install_presets_flag() {
        let config = EngineConfig {
            skip_waiting_on_install: true,
            ..test_config()
        };
        let (engine, _, _) = create_test_engine(config, site_fetcher());
        assert!(engine.flags().skip_waiting());
    }

    #[tokio::test]
    async fn test_state_receiver_observes_transitions() {
        let (engine, _, _) = create_test_engine(test_config(), site_fetcher());
        let mut rx = engine.state_receiver();
        engine.install_from_config().await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), EngineState::Installed);
    }

    #[tokio::test]
    async fn test_sync_trigger_delegates_to_queue() {
        let (engine, _, _) = create_test_engine(test_config(), site_fetcher());
        assert_eq!(engine.on_sync_trigger("sync-predictions").await, SyncOutcome::NoHandler);
    }
}
