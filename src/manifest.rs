// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Precache manifest.

use url::Url;

use crate::request::resolve;

/// Ordered, immutable list of asset paths the static store must contain.
///
/// Duplicates are dropped on construction (first occurrence wins).
///
/// ```
/// use offline_cache_engine::Manifest;
///
/// let manifest = Manifest::new(["/", "/offline.html", "/app.js", "/"]);
/// assert_eq!(manifest.len(), 3);
/// assert!(manifest.contains("/offline.html"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Manifest {
    entries: Vec<String>,
}

impl Manifest {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for entry in entries {
            let entry = entry.into();
            if !unique.contains(&entry) {
                unique.push(entry);
            }
        }
        Self { entries: unique }
    }

    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, entry: &str) -> bool {
        self.entries.iter().any(|e| e == entry)
    }

    /// Resolve every entry against `origin`, in order.
    /// Fails on the first entry that is not a valid URL reference.
    pub fn resolve(&self, origin: &Url) -> Result<Vec<(String, Url)>, (String, url::ParseError)> {
        self.entries
            .iter()
            .map(|entry| {
                resolve(origin, entry)
                    .map(|url| (entry.clone(), url))
                    .map_err(|e| (entry.clone(), e))
            })
            .collect()
    }
}
