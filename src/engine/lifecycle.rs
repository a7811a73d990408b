//! Engine lifecycle: install, activate, skip-waiting.
//!
//! Install is all-or-nothing. Every manifest entry is fetched before the
//! static store is touched, so a failed fetch leaves storage exactly as it
//! was and the previous deployment keeps serving.

use std::time::Instant;

use futures::future::try_join_all;
use tracing::{debug, error, info, warn};

use crate::control::ControlOutcome;
use crate::error::EngineError;
use crate::manifest::Manifest;
use crate::request::CacheRequest;
use crate::response::CacheEntry;

use super::{ActivationReport, CacheEngine, EngineState, InstallReport};

impl CacheEngine {
    /// Install the manifest from this engine's config.
    pub async fn install_from_config(&self) -> Result<InstallReport, EngineError> {
        let manifest = self.config.manifest();
        self.install(&manifest).await
    }

    /// Precache `manifest` into the current static store.
    ///
    /// Allowed from `Created`, `Redundant` (retry) and `Installed` (refresh).
    /// On failure the engine falls back to `Installed` if it already was,
    /// otherwise `Redundant`. When the skip-waiting flag is set the engine
    /// activates before this returns.
    #[tracing::instrument(skip(self, manifest), fields(entries = manifest.len(), store = %self.registry.static_name()))]
    pub async fn install(&self, manifest: &Manifest) -> Result<InstallReport, EngineError> {
        let _guard = self.lifecycle_lock.lock().await;

        let previous = self.state();
        if !matches!(
            previous,
            EngineState::Created | EngineState::Redundant | EngineState::Installed
        ) {
            return Err(EngineError::InvalidState {
                operation: "install",
                state: previous,
            });
        }

        let start = Instant::now();
        info!("Installing static cache store");
        self.set_state(EngineState::Installing);

        let entries = match self.precache(manifest).await {
            Ok(entries) => entries,
            Err(e) => {
                let fallback = if previous == EngineState::Installed {
                    EngineState::Installed
                } else {
                    EngineState::Redundant
                };
                self.set_state(fallback);
                crate::metrics::record_install(false, 0, start.elapsed());
                error!(error = %e, state = %fallback, "Install failed");
                return Err(e);
            }
        };

        self.set_state(EngineState::Installed);
        crate::metrics::record_install(true, entries, start.elapsed());
        info!(
            entries,
            duration_ms = start.elapsed().as_millis() as u64,
            "Install committed"
        );

        let activated = if self.flags.skip_waiting() {
            debug!("Skip-waiting set, activating immediately");
            self.activate_locked().await?;
            true
        } else {
            false
        };

        Ok(InstallReport {
            store: self.registry.static_name().to_string(),
            entries,
            activated,
        })
    }

    /// Evict stale stores and take over connected clients.
    ///
    /// Running it again on an active engine only re-checks eviction.
    #[tracing::instrument(skip(self))]
    pub async fn activate(&self) -> Result<ActivationReport, EngineError> {
        let _guard = self.lifecycle_lock.lock().await;
        self.activate_locked().await
    }

    /// Activate now if installed; otherwise remember to activate after install.
    #[tracing::instrument(skip(self))]
    pub async fn skip_waiting(&self) -> Result<ControlOutcome, EngineError> {
        self.flags.set_skip_waiting(true);
        match self.state() {
            EngineState::Installed => {
                self.activate().await?;
                Ok(ControlOutcome::Activated)
            }
            EngineState::Active => Ok(ControlOutcome::AlreadyActive),
            state => {
                debug!(state = %state, "Skip-waiting deferred until install commits");
                Ok(ControlOutcome::ActivationDeferred)
            }
        }
    }

    /// Caller must hold the lifecycle lock.
    async fn activate_locked(&self) -> Result<ActivationReport, EngineError> {
        match self.state() {
            EngineState::Installed => {}
            EngineState::Active => {
                let evicted = self.evict_stale().await?;
                return Ok(ActivationReport { evicted, claimed: 0 });
            }
            state => {
                return Err(EngineError::InvalidState {
                    operation: "activate",
                    state,
                })
            }
        }

        info!("Activating");
        self.set_state(EngineState::Activating);

        let evicted = match self.evict_stale().await {
            Ok(evicted) => evicted,
            Err(e) => {
                self.set_state(EngineState::Installed);
                error!(error = %e, "Activation failed during eviction");
                return Err(e);
            }
        };

        let claimed = match self.clients.claim().await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "Failed to claim clients, they take over on next navigation");
                0
            }
        };

        self.set_state(EngineState::Active);
        info!(evicted = evicted.len(), claimed, "Engine active");
        Ok(ActivationReport { evicted, claimed })
    }

    /// Delete every store the registry does not recognise as current.
    async fn evict_stale(&self) -> Result<Vec<String>, EngineError> {
        let known = self.storage.keys().await?;
        let mut evicted = Vec::new();

        for name in self.registry.eviction_candidates(&known) {
            if self.storage.delete(&name).await? {
                info!(store = %name, "Deleted stale cache store");
                evicted.push(name);
            } else {
                debug!(store = %name, "Stale cache store already gone");
            }
        }

        crate::metrics::record_evicted_stores(evicted.len());
        Ok(evicted)
    }

    /// Fetch every entry, then make the static store hold exactly those.
    async fn precache(&self, manifest: &Manifest) -> Result<usize, EngineError> {
        if !manifest.contains(&self.config.offline_document) {
            return Err(EngineError::OfflineDocumentNotInManifest(
                self.config.offline_document.clone(),
            ));
        }

        let resolved = manifest
            .resolve(&self.origin)
            .map_err(|(entry, e)| EngineError::InvalidManifestEntry {
                entry,
                reason: e.to_string(),
            })?;

        if let Some((entry, _)) = resolved.iter().find(|(_, url)| self.policy.is_api(url)) {
            return Err(EngineError::InvalidManifestEntry {
                entry: entry.clone(),
                reason: format!("paths under '{}' are never cached", self.config.api_prefix),
            });
        }

        let fetches = resolved.into_iter().map(|(entry, url)| async move {
            let request = CacheRequest::get(url);
            let response = self
                .fetcher
                .fetch(&request)
                .await
                .map_err(|e| EngineError::InstallFailed {
                    entry: entry.clone(),
                    reason: e.to_string(),
                })?;
            if !response.is_success() {
                return Err(EngineError::InstallFailed {
                    entry,
                    reason: format!("HTTP {} {}", response.status, response.status_text),
                });
            }
            debug!(entry = %entry, "Fetched manifest entry");
            Ok::<_, EngineError>(CacheEntry::new(request.key(), response))
        });
        let staged = try_join_all(fetches).await?;

        let store = self.registry.static_name();
        let written = self.storage.replace(store, staged).await?;
        Ok(written)
    }
}
