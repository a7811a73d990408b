// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Engine-wide mutable flags.
//!
//! Written only by the control channel (and by install for `skip_waiting`),
//! read by the router on every request. Relaxed ordering: a request racing a
//! toggle may observe either value.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct EngineFlags {
    force_offline: AtomicBool,
    skip_waiting: AtomicBool,
}

impl EngineFlags {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    #[inline]
    pub fn force_offline(&self) -> bool {
        self.force_offline.load(Ordering::Relaxed)
    }

    /// Returns the previous value.
    pub fn set_force_offline(&self, value: bool) -> bool {
        self.force_offline.swap(value, Ordering::Relaxed)
    }

    #[must_use]
    #[inline]
    pub fn skip_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::Relaxed)
    }

    pub fn set_skip_waiting(&self, value: bool) {
        self.skip_waiting.store(value, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_off() {
        let flags = EngineFlags::new();
        assert!(!flags.force_offline());
        assert!(!flags.skip_waiting());
    }

    #[test]
    fn test_toggle_returns_previous() {
        let flags = EngineFlags::new();
        assert!(!flags.set_force_offline(true));
        assert!(flags.force_offline());
        assert!(flags.set_force_offline(false));
        assert!(!flags.force_offline());
    }
}
