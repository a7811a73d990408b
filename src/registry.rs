// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Cache registry: canonical store names and the eviction set.
//!
//! A store name encodes its version, so staleness is plain string inequality
//! against the current canonical names. No I/O happens here.
//!
//! # Example
//!
//! ```
//! use offline_cache_engine::{CacheRegistry, StoreKind};
//!
//! let registry = CacheRegistry::new("sports-central", "2.1", "1");
//! assert_eq!(registry.static_name(), "sports-central-v2.1");
//! assert_eq!(registry.dynamic_name(), "sports-central-dynamic-v1");
//!
//! let stale = registry.eviction_candidates(["sports-central-v2.0", "sports-central-v2.1"]);
//! assert_eq!(stale, vec!["sports-central-v2.0".to_string()]);
//! ```

use crate::config::EngineConfig;

/// Role of a cache store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    /// Precached manifest assets, written by install
    Static,
    /// Runtime write-through cache, written by the router
    Dynamic,
}

impl StoreKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
        }
    }
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A canonical store identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheStoreName {
    pub name: String,
    pub version: String,
    pub kind: StoreKind,
}

#[derive(Debug, Clone)]
pub struct CacheRegistry {
    prefix: String,
    static_store: CacheStoreName,
    dynamic_store: CacheStoreName,
}

impl CacheRegistry {
    #[must_use]
    pub fn new(prefix: &str, static_version: &str, dynamic_version: &str) -> Self {
        let store = |kind, version: &str| CacheStoreName {
            name: canonical_name(prefix, kind, version),
            version: version.to_string(),
            kind,
        };
        Self {
            prefix: prefix.to_string(),
            static_store: store(StoreKind::Static, static_version),
            dynamic_store: store(StoreKind::Dynamic, dynamic_version),
        }
    }

    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(&config.cache_prefix, &config.static_version, &config.dynamic_version)
    }

    /// Canonical name of a store of `kind` at `version` under this prefix.
    #[must_use]
    pub fn canonical_name(&self, kind: StoreKind, version: &str) -> String {
        canonical_name(&self.prefix, kind, version)
    }

    /// The current store of `kind`.
    #[must_use]
    pub fn current(&self, kind: StoreKind) -> &CacheStoreName {
        match kind {
            StoreKind::Static => &self.static_store,
            StoreKind::Dynamic => &self.dynamic_store,
        }
    }

    #[must_use]
    pub fn static_name(&self) -> &str {
        &self.static_store.name
    }

    #[must_use]
    pub fn dynamic_name(&self) -> &str {
        &self.dynamic_store.name
    }

    #[must_use]
    pub fn is_canonical(&self, name: &str) -> bool {
        name == self.static_store.name || name == self.dynamic_store.name
    }

    /// Names from `known` that match no current canonical name.
    /// Order of `known` is preserved; duplicates are reported once.
    pub fn eviction_candidates<I, S>(&self, known: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut stale: Vec<String> = Vec::new();
        for name in known {
            let name = name.as_ref();
            if !self.is_canonical(name) && !stale.iter().any(|s| s == name) {
                stale.push(name.to_string());
            }
        }
        stale
    }

    /// Classify a name produced under this registry's prefix (any version).
    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<StoreKind> {
        let rest = name.strip_prefix(self.prefix.as_str())?;
        if rest.strip_prefix("-dynamic-v").is_some_and(|v| !v.is_empty()) {
            Some(StoreKind::Dynamic)
        } else if rest.strip_prefix("-v").is_some_and(|v| !v.is_empty()) {
            Some(StoreKind::Static)
        } else {
            None
        }
    }
}

fn canonical_name(prefix: &str, kind: StoreKind, version: &str) -> String {
    match kind {
        StoreKind::Static => format!("{}-v{}", prefix, version),
        StoreKind::Dynamic => format!("{}-dynamic-v{}", prefix, version),
    }
}
