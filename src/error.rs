// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use thiserror::Error;

use crate::engine::EngineState;
use crate::host::HostError;
use crate::network::FetchError;
use crate::storage::StorageError;

/// Errors surfaced by engine lifecycle and event APIs.
///
/// Request routing never returns these: every intercepted request ends in a
/// response.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Install failed fetching '{entry}': {reason}")]
    InstallFailed { entry: String, reason: String },
    #[error("Invalid manifest entry '{entry}': {reason}")]
    InvalidManifestEntry { entry: String, reason: String },
    #[error("Offline document '{0}' is not part of the manifest")]
    OfflineDocumentNotInManifest(String),
    #[error("Cannot {operation} while engine is {state}")]
    InvalidState {
        operation: &'static str,
        state: EngineState,
    },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Host(#[from] HostError),
}
