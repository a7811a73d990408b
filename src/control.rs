// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Control channel messages.
//!
//! Wire format is `{"type": "ENABLE_OFFLINE" | "DISABLE_OFFLINE" | "CLEAR_CACHE" | "SKIP_WAITING"}`.
//! Unknown tags decode to [`ControlMessage::Unknown`]; anything that isn't a
//! tagged object decodes to `None`. Neither is an error.
//!
//! ```
//! use offline_cache_engine::ControlMessage;
//!
//! assert_eq!(ControlMessage::from_json(r#"{"type":"CLEAR_CACHE"}"#), Some(ControlMessage::ClearCache));
//! assert_eq!(ControlMessage::from_json(r#"{"type":"RELOAD"}"#), Some(ControlMessage::Unknown));
//! assert_eq!(ControlMessage::from_json("not json"), None);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Serve everything from cache / offline document
    EnableOffline,
    DisableOffline,
    /// Delete every store, current ones included
    ClearCache,
    /// Activate an installed engine without waiting for old clients
    SkipWaiting,
    /// Forward-compatible catch-all; ignored
    #[serde(other)]
    Unknown,
}

impl ControlMessage {
    /// Decode a raw message. `None` for malformed input.
    #[must_use]
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    /// Decode an already-parsed message. `None` for malformed input.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        Self::deserialize(value).ok()
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnableOffline => "ENABLE_OFFLINE",
            Self::DisableOffline => "DISABLE_OFFLINE",
            Self::ClearCache => "CLEAR_CACHE",
            Self::SkipWaiting => "SKIP_WAITING",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for ControlMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What handling a control message did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlOutcome {
    OfflineEnabled,
    OfflineDisabled,
    CachesCleared { deleted: Vec<String> },
    /// SkipWaiting activated the engine now
    Activated,
    /// SkipWaiting arrived before install finished; applied when it does
    ActivationDeferred,
    AlreadyActive,
    /// Unknown or malformed message
    Ignored,
}
