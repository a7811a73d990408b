//! Configuration for the cache engine.
//!
//! # Example
//!
//! ```
//! use offline_cache_engine::EngineConfig;
//!
//! // Minimal config (uses defaults)
//! let config = EngineConfig::default();
//! assert_eq!(config.api_prefix, "/api/");
//! assert_eq!(config.offline_document, "/offline.html");
//!
//! // A new deployment bumps the static version
//! let config = EngineConfig {
//!     origin: "https://scores.example".into(),
//!     static_version: "2.1".into(),
//!     manifest: vec!["/".into(), "/offline.html".into(), "/app.js".into()],
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use serde::Deserialize;
use url::Url;

use crate::error::EngineError;
use crate::manifest::Manifest;

/// Configuration for the cache engine.
///
/// All fields have defaults. A real deployment sets at least `origin`,
/// `static_version` and `manifest`.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Prefix shared by every store name (e.g. "sports-central")
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Version of the static (precache) store; bump per deployment
    #[serde(default = "default_version")]
    pub static_version: String,

    /// Version of the dynamic (write-through) store
    #[serde(default = "default_version")]
    pub dynamic_version: String,

    /// Application origin, e.g. "https://app.example"
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Paths under this prefix are never persisted
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Manifest entry served when nothing else can answer
    #[serde(default = "default_offline_document")]
    pub offline_document: String,

    /// Assets to precache on install
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,

    /// Activate as soon as install commits instead of waiting for old clients
    #[serde(default)]
    pub skip_waiting_on_install: bool,

    /// Per-request timeout for the HTTP fetcher (None = no timeout)
    #[serde(default)]
    pub fetch_timeout_ms: Option<u64>,

    #[serde(default)]
    pub notifications: NotificationDefaults,
}

/// Values used for push notifications when the payload leaves them out.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NotificationDefaults {
    #[serde(default = "default_notification_title")]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub badge: Option<String>,
    /// Where a click navigates when the payload names no url
    #[serde(default = "default_target_url")]
    pub target_url: String,
    /// Action offered when the payload carries no `actions`
    #[serde(default = "default_action")]
    pub action: String,
    #[serde(default = "default_action_title")]
    pub action_title: String,
    /// Vibration pattern in milliseconds; empty disables vibration
    #[serde(default = "default_vibrate")]
    pub vibrate: Vec<u32>,
}

fn default_cache_prefix() -> String { "offline-cache".to_string() }
fn default_version() -> String { "1".to_string() }
fn default_origin() -> String { "http://localhost".to_string() }
fn default_api_prefix() -> String { "/api/".to_string() }
fn default_offline_document() -> String { "/offline.html".to_string() }
fn default_manifest() -> Vec<String> { vec!["/".to_string(), default_offline_document()] }
fn default_notification_title() -> String { "Notification".to_string() }
fn default_target_url() -> String { "/".to_string() }
fn default_action() -> String { "open".to_string() }
fn default_action_title() -> String { "Open App".to_string() }
fn default_vibrate() -> Vec<u32> { vec![100, 50, 100] }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_prefix: default_cache_prefix(),
            static_version: default_version(),
            dynamic_version: default_version(),
            origin: default_origin(),
            api_prefix: default_api_prefix(),
            offline_document: default_offline_document(),
            manifest: default_manifest(),
            skip_waiting_on_install: false,
            fetch_timeout_ms: None,
            notifications: NotificationDefaults::default(),
        }
    }
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            title: default_notification_title(),
            body: String::new(),
            icon: None,
            badge: None,
            target_url: default_target_url(),
            action: default_action(),
            action_title: default_action_title(),
            vibrate: default_vibrate(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(raw: &str) -> Result<Self, EngineError> {
        serde_json::from_str(raw).map_err(|e| EngineError::Config(format!("invalid config JSON: {}", e)))
    }

    /// Parsed application origin.
    pub fn origin_url(&self) -> Result<Url, EngineError> {
        let url = Url::parse(&self.origin)
            .map_err(|e| EngineError::Config(format!("origin '{}' is not a URL: {}", self.origin, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(EngineError::Config(format!(
                "origin '{}' must be http or https",
                self.origin
            )));
        }
        Ok(url)
    }

    #[must_use]
    pub fn manifest(&self) -> Manifest {
        Manifest::new(self.manifest.iter().cloned())
    }

    /// Check the config is usable.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.origin_url()?;
        if self.cache_prefix.is_empty() {
            return Err(EngineError::Config("cache_prefix must not be empty".into()));
        }
        if self.static_version.is_empty() || self.dynamic_version.is_empty() {
            return Err(EngineError::Config("store versions must not be empty".into()));
        }
        if !self.manifest.contains(&self.offline_document) {
            return Err(EngineError::OfflineDocumentNotInManifest(self.offline_document.clone()));
        }
        Ok(())
    }
}
