// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Named cache storage: the [`CacheStorage`](traits::CacheStorage) seam and
//! an in-memory implementation.

pub mod memory;
pub mod traits;

pub use memory::InMemoryCacheStorage;
pub use traits::{CacheStorage, StorageError};
