// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the cache engine.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The embedding host is responsible for choosing the exporter.
//!
//! # Metric Naming Convention
//! - `offline_cache_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `source`: cache, network, offline_document, unavailable
//! - `store`: static, dynamic
//! - `status`: success, failure

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

use crate::engine::EngineState;
use crate::registry::StoreKind;
use crate::response::ResponseSource;

// ═══════════════════════════════════════════════════════════════════════════
// ROUTING - Where intercepted requests were answered from
// ═══════════════════════════════════════════════════════════════════════════

/// Record an intercepted request answered by the engine
pub fn record_response(source: ResponseSource) {
    counter!(
        "offline_cache_responses_total",
        "source" => source.as_str()
    )
    .increment(1);
}

/// Record a request left to the platform's default handling
pub fn record_passthrough() {
    counter!("offline_cache_passthrough_total").increment(1);
}

/// Record a failed network fetch on the request path
pub fn record_network_failure() {
    counter!("offline_cache_network_failures_total").increment(1);
}

/// Record a response persisted into a store
pub fn record_write_through(store: StoreKind) {
    counter!(
        "offline_cache_write_through_total",
        "store" => store.as_str(),
        "status" => "success"
    )
    .increment(1);
}

/// Record a write-through that could not be persisted
pub fn record_write_through_failure(store: StoreKind) {
    counter!(
        "offline_cache_write_through_total",
        "store" => store.as_str(),
        "status" => "failure"
    )
    .increment(1);
}

/// Record routing latency
pub fn record_latency(operation: &str, duration: Duration) {
    histogram!(
        "offline_cache_operation_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

// ═══════════════════════════════════════════════════════════════════════════
// LIFECYCLE - Install, activation, eviction
// ═══════════════════════════════════════════════════════════════════════════

/// Record an install attempt
pub fn record_install(success: bool, entries: usize, duration: Duration) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "offline_cache_installs_total",
        "status" => status
    )
    .increment(1);
    histogram!("offline_cache_install_seconds").record(duration.as_secs_f64());

    if success {
        gauge!("offline_cache_precached_entries").set(entries as f64);
    }
}

/// Record stores deleted during activation
pub fn record_evicted_stores(count: usize) {
    counter!("offline_cache_evicted_stores_total").increment(count as u64);
}

/// Record stores deleted by a clear-cache command
pub fn record_caches_cleared(count: usize) {
    counter!("offline_cache_cleared_stores_total").increment(count as u64);
}

/// Record an engine state transition
pub fn set_engine_state(state: EngineState) {
    counter!(
        "offline_cache_state_transitions_total",
        "state" => state.as_str()
    )
    .increment(1);
}

// ═══════════════════════════════════════════════════════════════════════════
// EVENTS - Control, push, sync
// ═══════════════════════════════════════════════════════════════════════════

/// Record a control message by kind
pub fn record_control_message(kind: &'static str) {
    counter!(
        "offline_cache_control_messages_total",
        "kind" => kind
    )
    .increment(1);
}

/// Record a displayed push notification
pub fn record_push() {
    counter!("offline_cache_push_notifications_total").increment(1);
}

/// Record a notification click that opened a window
pub fn record_notification_click() {
    counter!("offline_cache_notification_clicks_total").increment(1);
}

/// Record a sync trigger outcome
pub fn record_sync(outcome: &'static str) {
    counter!(
        "offline_cache_sync_triggers_total",
        "outcome" => outcome
    )
    .increment(1);
}

/// A timing guard that records latency on drop
pub struct LatencyTimer {
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    /// Start a new latency timer
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_latency(self.operation, self.start.elapsed());
    }
}
