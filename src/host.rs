// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Seams to the embedding host: client windows and notification display.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

use crate::notify::Notification;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("Client host error: {0}")]
    Clients(String),
    #[error("Notification host error: {0}")]
    Notifications(String),
}

/// Connected application windows.
#[async_trait]
pub trait ClientHost: Send + Sync {
    /// Take control of already-open clients without a reload.
    /// Returns how many were claimed.
    async fn claim(&self) -> Result<usize, HostError>;

    /// Open (or focus) a window at `url`.
    async fn open_window(&self, url: &str) -> Result<(), HostError>;
}

/// System notification surface.
#[async_trait]
pub trait NotificationHost: Send + Sync {
    async fn show_notification(&self, notification: &Notification) -> Result<(), HostError>;

    async fn close_notification(&self, id: &str) -> Result<(), HostError>;
}

/// Host that records every call. Used by tests and demos.
#[derive(Debug, Default)]
pub struct InMemoryHost {
    connected_clients: AtomicUsize,
    claims: AtomicUsize,
    opened: Mutex<Vec<String>>,
    shown: Mutex<Vec<Notification>>,
    closed: Mutex<Vec<String>>,
}

impl InMemoryHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Host with `n` windows already open.
    #[must_use]
    pub fn with_clients(n: usize) -> Self {
        let host = Self::default();
        host.connected_clients.store(n, Ordering::Relaxed);
        host
    }

    /// Number of `claim()` calls so far
    #[must_use]
    pub fn claim_count(&self) -> usize {
        self.claims.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn opened_windows(&self) -> Vec<String> {
        self.opened.lock().clone()
    }

    #[must_use]
    pub fn shown_notifications(&self) -> Vec<Notification> {
        self.shown.lock().clone()
    }

    #[must_use]
    pub fn closed_notifications(&self) -> Vec<String> {
        self.closed.lock().clone()
    }
}

#[async_trait]
impl ClientHost for InMemoryHost {
    async fn claim(&self) -> Result<usize, HostError> {
        self.claims.fetch_add(1, Ordering::Relaxed);
        Ok(self.connected_clients.load(Ordering::Relaxed))
    }

    async fn open_window(&self, url: &str) -> Result<(), HostError> {
        self.opened.lock().push(url.to_string());
        self.connected_clients.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[async_trait]
impl NotificationHost for InMemoryHost {
    async fn show_notification(&self, notification: &Notification) -> Result<(), HostError> {
        self.shown.lock().push(notification.clone());
        Ok(())
    }

    async fn close_notification(&self, id: &str) -> Result<(), HostError> {
        self.closed.lock().push(id.to_string());
        Ok(())
    }
}
