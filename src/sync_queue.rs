// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Deferred sync queue.
//!
//! The host registers a replay routine per tag and enqueues [`SyncTask`]s when
//! a write cannot complete. When the platform fires a sync trigger for a tag,
//! the routine runs on its own task: an error or a panic is logged and the
//! task stays pending for the platform to retry. A pending task is removed
//! only once its replay completes.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use offline_cache_engine::{SyncQueue, SyncOutcome, SyncError};
//!
//! # async fn example() {
//! let queue = SyncQueue::new();
//! queue.register("sync-predictions", Arc::new(|tag: String| async move {
//!     println!("replaying {}", tag);
//!     Ok::<(), SyncError>(())
//! }));
//! queue.enqueue("sync-predictions");
//!
//! assert_eq!(queue.on_sync_trigger("sync-predictions").await, SyncOutcome::Completed);
//! assert!(queue.pending().is_empty());
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use thiserror::Error;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Replay failed: {0}")]
    Replay(String),
}

/// Host-provided replay routine for one tag.
#[async_trait]
pub trait SyncHandler: Send + Sync + 'static {
    async fn replay(&self, tag: &str) -> Result<(), SyncError>;
}

#[async_trait]
impl<F, Fut> SyncHandler for F
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), SyncError>> + Send + 'static,
{
    async fn replay(&self, tag: &str) -> Result<(), SyncError> {
        (self)(tag.to_string()).await
    }
}

/// A queued unit of deferred work.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyncTask {
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Replay succeeded; the task is no longer pending
    Completed,
    /// No routine registered for the tag
    NoHandler,
    /// A replay for this tag is already running
    InFlight,
    /// Replay failed or panicked; left for the platform to retry
    RetryLater { reason: String },
}

impl SyncOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::NoHandler => "no_handler",
            Self::InFlight => "in_flight",
            Self::RetryLater { .. } => "retry_later",
        }
    }
}

#[derive(Default)]
pub struct SyncQueue {
    handlers: DashMap<String, Arc<dyn SyncHandler>>,
    pending: DashSet<String>,
    in_flight: DashSet<String>,
}

impl SyncQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the replay routine for `tag`, replacing any previous one.
    pub fn register(&self, tag: impl Into<String>, handler: Arc<dyn SyncHandler>) {
        let tag = tag.into();
        if self.handlers.insert(tag.clone(), handler).is_some() {
            debug!(tag = %tag, "Replaced sync handler");
        }
    }

    /// Returns whether a routine was registered.
    pub fn unregister(&self, tag: &str) -> bool {
        self.handlers.remove(tag).is_some()
    }

    #[must_use]
    pub fn has_handler(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    /// Record deferred work for `tag`. Enqueuing a pending tag is a no-op.
    pub fn enqueue(&self, tag: impl Into<String>) -> SyncTask {
        let tag = tag.into();
        if self.pending.insert(tag.clone()) {
            debug!(tag = %tag, "Sync task queued");
        }
        SyncTask { tag }
    }

    /// Pending tasks, sorted by tag.
    #[must_use]
    pub fn pending(&self) -> Vec<SyncTask> {
        let mut tasks: Vec<SyncTask> = self
            .pending
            .iter()
            .map(|t| SyncTask { tag: t.key().clone() })
            .collect();
        tasks.sort_by(|a, b| a.tag.cmp(&b.tag));
        tasks
    }

    /// Run the routine registered for `tag`.
    #[tracing::instrument(skip(self))]
    pub async fn on_sync_trigger(&self, tag: &str) -> SyncOutcome {
        let outcome = self.replay(tag).await;
        crate::metrics::record_sync(outcome.as_str());
        outcome
    }

    /// Trigger every pending task once, in tag order.
    pub async fn replay_pending(&self) -> Vec<(String, SyncOutcome)> {
        let mut results = Vec::new();
        for task in self.pending() {
            let outcome = self.on_sync_trigger(&task.tag).await;
            results.push((task.tag, outcome));
        }
        results
    }

    async fn replay(&self, tag: &str) -> SyncOutcome {
        let handler = match self.handlers.get(tag) {
            Some(h) => Arc::clone(h.value()),
            None => {
                debug!(tag = %tag, "No sync handler registered");
                return SyncOutcome::NoHandler;
            }
        };

        if !self.in_flight.insert(tag.to_string()) {
            debug!(tag = %tag, "Sync replay already running");
            return SyncOutcome::InFlight;
        }
        let mut guard = InFlightGuard {
            in_flight: &self.in_flight,
            tag,
            task: None,
        };

        let owned_tag = tag.to_string();
        let handle = tokio::spawn(async move { handler.replay(&owned_tag).await });
        guard.task = Some(handle.abort_handle());
        let joined = handle.await;
        drop(guard);

        match joined {
            Ok(Ok(())) => {
                self.pending.remove(tag);
                info!(tag = %tag, "Sync replay completed");
                SyncOutcome::Completed
            }
            Ok(Err(e)) => {
                warn!(tag = %tag, error = %e, "Sync replay failed, leaving for retry");
                SyncOutcome::RetryLater { reason: e.to_string() }
            }
            Err(join_err) => {
                error!(tag = %tag, error = %join_err, "Sync replay panicked, leaving for retry");
                SyncOutcome::RetryLater {
                    reason: format!("replay task aborted: {}", join_err),
                }
            }
        }
    }
}

/// Releases a tag's in-flight mark, and stops its replay task if the
/// trigger was dropped before the task finished.
struct InFlightGuard<'a> {
    in_flight: &'a DashSet<String>,
    tag: &'a str,
    task: Option<AbortHandle>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.in_flight.remove(self.tag);
    }
}
