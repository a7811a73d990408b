//! Control channel dispatch.

use tracing::{debug, info, warn};

use crate::control::{ControlMessage, ControlOutcome};
use crate::error::EngineError;

use super::CacheEngine;

impl CacheEngine {
    /// Apply a control message. Offline toggles take effect for the very
    /// next intercepted request.
    #[tracing::instrument(skip(self))]
    pub async fn handle_control(&self, message: ControlMessage) -> Result<ControlOutcome, EngineError> {
        crate::metrics::record_control_message(message.as_str());

        match message {
            ControlMessage::EnableOffline => {
                if !self.flags.set_force_offline(true) {
                    info!("Forced offline mode enabled");
                }
                Ok(ControlOutcome::OfflineEnabled)
            }
            ControlMessage::DisableOffline => {
                if self.flags.set_force_offline(false) {
                    info!("Forced offline mode disabled");
                }
                Ok(ControlOutcome::OfflineDisabled)
            }
            ControlMessage::ClearCache => {
                let deleted = self.clear_caches().await?;
                Ok(ControlOutcome::CachesCleared { deleted })
            }
            ControlMessage::SkipWaiting => self.skip_waiting().await,
            ControlMessage::Unknown => {
                debug!("Ignoring unknown control message");
                Ok(ControlOutcome::Ignored)
            }
        }
    }

    /// Decode and apply a raw wire message. Malformed input is ignored.
    pub async fn handle_control_json(&self, raw: &str) -> Result<ControlOutcome, EngineError> {
        match ControlMessage::from_json(raw) {
            Some(message) => self.handle_control(message).await,
            None => {
                debug!(len = raw.len(), "Ignoring malformed control message");
                Ok(ControlOutcome::Ignored)
            }
        }
    }

    /// Delete every store, current ones included. Returns the deleted names.
    pub async fn clear_caches(&self) -> Result<Vec<String>, EngineError> {
        let mut deleted = Vec::new();
        for name in self.storage.keys().await? {
            match self.storage.delete(&name).await {
                Ok(true) => deleted.push(name),
                Ok(false) => {}
                Err(e) => {
                    warn!(store = %name, error = %e, "Failed to delete cache store");
                    return Err(e.into());
                }
            }
        }
        crate::metrics::record_caches_cleared(deleted.len());
        info!(count = deleted.len(), "Caches cleared");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{create_test_engine, site_fetcher, test_config};
    use super::super::EngineState;
    use super::*;
    use crate::request::CacheRequest;
    use crate::response::ResponseSource;
    use crate::storage::CacheStorage;
    use url::Url;

    #[tokio::test]
    async fn test_offline_toggle() {
        let (engine, _, _) = create_test_engine(test_config(), site_fetcher());
        assert_eq!(
            engine.handle_control(ControlMessage::EnableOffline).await.unwrap(),
            ControlOutcome::OfflineEnabled
        );
        assert!(engine.flags().force_offline());

        assert_eq!(
            engine.handle_control_json(r#"{"type":"DISABLE_OFFLINE"}"#).await.unwrap(),
            ControlOutcome::OfflineDisabled
        );
        assert!(!engine.flags().force_offline());
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_are_ignored() {
        let (engine, _, _) = create_test_engine(test_config(), site_fetcher());
        assert_eq!(
            engine.handle_control_json(r#"{"type":"RELOAD"}"#).await.unwrap(),
            ControlOutcome::Ignored
        );
        assert_eq!(engine.handle_control_json("{{{").await.unwrap(), ControlOutcome::Ignored);
        assert!(!engine.flags().force_offline());
    }

    #[tokio::test]
    async fn test_clear_cache_deletes_everything() {
        let (engine, storage, _) = create_test_engine(test_config(), site_fetcher());
        engine.install_from_config().await.unwrap();
        storage.open("legacy").await.unwrap();

        let outcome = engine.handle_control(ControlMessage::ClearCache).await.unwrap();
        assert_eq!(
            outcome,
            ControlOutcome::CachesCleared {
                deleted: vec!["sports-central-v2.1".to_string(), "legacy".to_string()]
            }
        );
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_clear_cache_forces_refetch() {
        let fetcher = site_fetcher();
        let (engine, _, _) = create_test_engine(test_config(), fetcher.clone());
        engine.install_from_config().await.unwrap();
        engine.activate().await.unwrap();
        engine.handle_control(ControlMessage::ClearCache).await.unwrap();

        let calls = fetcher.calls();
        let js = Url::parse("https://app.example/app.js").unwrap();
        let decision = engine.handle_fetch(&CacheRequest::get(js)).await;
        assert_eq!(decision.source(), Some(ResponseSource::Network));
        assert_eq!(fetcher.calls(), calls + 1);
    }

    #[tokio::test]
    async fn test_skip_waiting_message() {
        let (engine, _, _) = create_test_engine(test_config(), site_fetcher());
        engine.install_from_config().await.unwrap();

        let outcome = engine.handle_control_json(r#"{"type":"SKIP_WAITING"}"#).await.unwrap();
        assert_eq!(outcome, ControlOutcome::Activated);
        assert_eq!(engine.state(), EngineState::Active);
    }
}
