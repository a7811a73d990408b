//! # Offline Cache Engine
//!
//! A request-interception cache engine that keeps a web application usable
//! when the network is slow, flaky or gone.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Lifecycle (per deployment)              │
//! │  • install(): precache the manifest, all-or-nothing        │
//! │  • activate(): evict stale stores, claim open clients      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Request Router                        │
//! │  • Forced offline: offline document → cache → 503          │
//! │  • Normal: cache → network (+ write-through) → fallback    │
//! │  • API paths and foreign origins are never persisted       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Named cache stores                        │
//! │  • {prefix}-v{version}: static precache                    │
//! │  • {prefix}-dynamic-v{version}: runtime write-through      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Alongside the router, the control channel flips runtime flags, the
//! notification dispatcher turns push payloads into notifications, and the
//! sync queue replays deferred work when the platform signals connectivity.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use offline_cache_engine::{
//!     CacheEngine, CacheRequest, ControlMessage, EngineConfig, InMemoryCacheStorage,
//!     InMemoryHost, ResponseSource,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), offline_cache_engine::EngineError> {
//!     let config = EngineConfig {
//!         cache_prefix: "sports-central".into(),
//!         static_version: "2.1".into(),
//!         origin: "https://scores.example".into(),
//!         manifest: vec!["/".into(), "/offline.html".into(), "/app.js".into()],
//!         ..Default::default()
//!     };
//!
//!     let host = Arc::new(InMemoryHost::new());
//!     let engine = CacheEngine::with_http(
//!         config,
//!         Arc::new(InMemoryCacheStorage::new()),
//!         host.clone(),
//!         host,
//!     )?;
//!
//!     engine.install_from_config().await?;
//!     engine.activate().await?;
//!
//!     engine.handle_control(ControlMessage::EnableOffline).await?;
//!     let page = CacheRequest::navigate("https://scores.example/live".parse().unwrap());
//!     let decision = engine.handle_fetch(&page).await;
//!     assert_eq!(decision.source(), Some(ResponseSource::OfflineDocument));
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See [`EngineConfig`] for all configuration options.
//!
//! ## Modules
//!
//! - [`engine`]: The main [`CacheEngine`] orchestrating all components
//! - [`registry`]: Canonical store names and the eviction set
//! - [`storage`]: Named cache storage seam and in-memory implementation
//! - [`network`]: Network fetch seam and HTTP implementation
//! - [`control`]: Control channel messages
//! - [`notify`]: Push notification dispatch
//! - [`sync_queue`]: Deferred background sync

pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod flags;
pub mod host;
pub mod manifest;
pub mod metrics;
pub mod network;
pub mod notify;
pub mod policy;
pub mod registry;
pub mod request;
pub mod response;
pub mod storage;
pub mod sync_queue;

// Note: We don't expose a `tracing` module to avoid conflict with the tracing crate

pub use config::{EngineConfig, NotificationDefaults};
pub use control::{ControlMessage, ControlOutcome};
pub use engine::{ActivationReport, CacheEngine, EngineState, FetchDecision, InstallReport};
pub use error::EngineError;
pub use flags::EngineFlags;
pub use host::{ClientHost, HostError, InMemoryHost, NotificationHost};
pub use manifest::Manifest;
pub use network::{FetchError, Fetcher, HttpFetcher};
pub use notify::{Notification, NotificationAction, NotificationDispatcher, PushPayload};
pub use policy::CachePolicy;
pub use registry::{CacheRegistry, CacheStoreName, StoreKind};
pub use request::{CacheRequest, Destination, Method, RequestKey};
pub use response::{CacheEntry, Response, ResponseSource, ServedResponse};
pub use storage::{CacheStorage, InMemoryCacheStorage, StorageError};
pub use sync_queue::{SyncError, SyncHandler, SyncOutcome, SyncQueue, SyncTask};
pub use metrics::LatencyTimer;
