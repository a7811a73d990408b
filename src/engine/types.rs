//! Public types for the cache engine.

use crate::response::{ResponseSource, ServedResponse};

/// Engine lifecycle state.
///
/// Use [`super::CacheEngine::state()`] to check current state or
/// [`super::CacheEngine::state_receiver()`] to watch for changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Just created, nothing precached yet
    Created,
    /// Fetching the manifest into the static store
    Installing,
    /// Static store committed, waiting to take over
    Installed,
    /// Evicting stale stores and claiming clients
    Activating,
    /// Intercepting requests
    Active,
    /// Install failed before this engine ever committed; install may be retried
    Redundant,
}

impl EngineState {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Installing => "Installing",
            Self::Installed => "Installed",
            Self::Activating => "Activating",
            Self::Active => "Active",
            Self::Redundant => "Redundant",
        }
    }
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the router decided for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchDecision {
    /// Not intercepted; the platform handles the request as if no engine existed
    Passthrough,
    /// Answered by the engine
    Respond(ServedResponse),
}

impl FetchDecision {
    #[must_use]
    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::Passthrough)
    }

    /// Branch that produced the response, if intercepted
    #[must_use]
    pub fn source(&self) -> Option<ResponseSource> {
        match self {
            Self::Passthrough => None,
            Self::Respond(served) => Some(served.source),
        }
    }

    #[must_use]
    pub fn served(&self) -> Option<&ServedResponse> {
        match self {
            Self::Passthrough => None,
            Self::Respond(served) => Some(served),
        }
    }

    #[must_use]
    pub fn into_served(self) -> Option<ServedResponse> {
        match self {
            Self::Passthrough => None,
            Self::Respond(served) => Some(served),
        }
    }
}

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Static store the manifest was committed to
    pub store: String,
    /// Entries written
    pub entries: usize,
    /// Install was followed by an immediate activation
    pub activated: bool,
}

/// Result of an activation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActivationReport {
    /// Stores deleted, in the order they were found
    pub evicted: Vec<String>,
    /// Clients taken over
    pub claimed: usize,
}
