// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Offline walkthrough.
//!
//! Demonstrates:
//! 1. Installing a deployment (precaching the manifest)
//! 2. Activating it and claiming open clients
//! 3. Cache-first routing with write-through
//! 4. Forcing offline mode over the control channel
//! 5. Push notifications and deferred sync
//! 6. Displaying the metrics snapshot
//!
//! The network is a scripted in-process fetcher, so no server is needed.
//!
//! # Run
//!
//! ```bash
//! RUST_LOG=offline_cache_engine=debug cargo run --example offline_walkthrough
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use tracing_subscriber::EnvFilter;
use url::Url;

use offline_cache_engine::{
    CacheEngine, CacheRequest, ControlMessage, EngineConfig, FetchDecision, FetchError, Fetcher,
    InMemoryCacheStorage, InMemoryHost, Response, SyncError,
};

/// A tiny pretend origin that can be unplugged.
struct DemoNetwork {
    pages: DashMap<String, Response>,
    online: AtomicBool,
}

impl DemoNetwork {
    fn new() -> Self {
        let pages = DashMap::new();
        for (path, body) in [
            ("/", "<html>scores</html>"),
            ("/offline.html", "<html>you are offline</html>"),
            ("/app.js", "console.log('live')"),
            ("/styles.css", "body{}"),
            ("/fixtures.json", "[{\"home\":\"A\",\"away\":\"B\"}]"),
            ("/api/predictions", "{\"pick\":\"A\"}"),
        ] {
            pages.insert(format!("https://scores.example{path}"), Response::ok(body));
        }
        Self {
            pages,
            online: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl Fetcher for DemoNetwork {
    async fn fetch(&self, request: &CacheRequest) -> Result<Response, FetchError> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(FetchError::Network {
                url: request.url.to_string(),
                reason: "cable unplugged".into(),
            });
        }
        Ok(self
            .pages
            .get(request.url.as_str())
            .map(|r| r.clone())
            .unwrap_or_else(|| Response::new(404, "Not Found", "")))
    }
}

fn describe(label: &str, decision: &FetchDecision) {
    match decision.served() {
        Some(served) => println!(
            "   {label:<28} → {} {} ({})",
            served.response.status,
            String::from_utf8_lossy(&served.response.body),
            served.source
        ),
        None => println!("   {label:<28} → passthrough"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder.install().expect("failed to install metrics recorder");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║           offline-cache-engine: Offline Walkthrough           ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    // ─────────────────────────────────────────────────────────────────────────
    // 1. Configure and install
    // ─────────────────────────────────────────────────────────────────────────
    let config = EngineConfig {
        cache_prefix: "sports-central".into(),
        static_version: "2.1".into(),
        origin: "https://scores.example".into(),
        manifest: vec![
            "/".into(),
            "/offline.html".into(),
            "/app.js".into(),
            "/styles.css".into(),
        ],
        ..Default::default()
    };

    let network = Arc::new(DemoNetwork::new());
    let storage = Arc::new(InMemoryCacheStorage::new());
    let host = Arc::new(InMemoryHost::with_clients(2));
    let engine = CacheEngine::new(config, storage.clone(), network.clone(), host.clone(), host.clone())?;

    println!("📦 Installing...");
    let installed = engine.install_from_config().await?;
    println!("   Committed {} entries to {}", installed.entries, installed.store);
    println!("   State: {}", engine.state());

    // ─────────────────────────────────────────────────────────────────────────
    // 2. Activate
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🚀 Activating...");
    let activated = engine.activate().await?;
    println!("   Claimed {} clients, evicted {:?}", activated.claimed, activated.evicted);
    println!("   State: {}", engine.state());

    // ─────────────────────────────────────────────────────────────────────────
    // 3. Online routing
    // ─────────────────────────────────────────────────────────────────────────
    let origin = Url::parse("https://scores.example")?;
    println!("\n🌐 Online:");
    for path in ["/app.js", "/fixtures.json", "/fixtures.json", "/api/predictions"] {
        let decision = engine.handle_fetch(&CacheRequest::get(origin.join(path)?)).await;
        describe(path, &decision);
    }
    println!("   Dynamic store entries: {}", storage.entry_count(engine.registry().dynamic_name()));

    // ─────────────────────────────────────────────────────────────────────────
    // 4. Forced offline, then a real outage
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📴 ENABLE_OFFLINE:");
    engine.handle_control_json(r#"{"type":"ENABLE_OFFLINE"}"#).await?;
    describe("navigate /live", &engine.handle_fetch(&CacheRequest::navigate(origin.join("/live")?)).await);
    describe("/fixtures.json", &engine.handle_fetch(&CacheRequest::get(origin.join("/fixtures.json")?)).await);
    engine.handle_control(ControlMessage::DisableOffline).await?;

    println!("\n🔌 Network down:");
    network.online.store(false, Ordering::SeqCst);
    describe("navigate /match/7", &engine.handle_fetch(&CacheRequest::navigate(origin.join("/match/7")?)).await);
    describe("/styles.css", &engine.handle_fetch(&CacheRequest::get(origin.join("/styles.css")?)).await);
    describe("/img/logo.png", &engine.handle_fetch(&CacheRequest::get(origin.join("/img/logo.png")?)).await);

    // ─────────────────────────────────────────────────────────────────────────
    // 5. Push and deferred sync
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🔔 Push:");
    let notification = engine
        .on_push(Some(br#"{"title":"Goal!","body":"A 1-0 B","url":"/match/7"}"#))
        .await?;
    println!("   Shown: {} ({})", notification.title, notification.body);
    let opened = engine.on_notification_click(&notification).await?;
    println!("   Opened window at {opened}");

    println!("\n🔁 Deferred sync:");
    engine.sync_queue().register(
        "sync-predictions",
        Arc::new(|tag: String| async move {
            println!("   replaying queued work for {tag}");
            Ok::<(), SyncError>(())
        }),
    );
    engine.sync_queue().enqueue("sync-predictions");
    network.online.store(true, Ordering::SeqCst);
    let outcome = engine.on_sync_trigger("sync-predictions").await;
    println!("   Outcome: {}", outcome.as_str());

    // ─────────────────────────────────────────────────────────────────────────
    // 6. Metrics
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📊 Metrics:");
    for (key, _unit, _desc, value) in snapshotter.snapshot().into_vec() {
        let rendered = match value {
            DebugValue::Counter(v) => v.to_string(),
            DebugValue::Gauge(v) => format!("{:.0}", v.into_inner()),
            DebugValue::Histogram(v) => format!("{} samples", v.len()),
        };
        println!("   {:<60} {}", key.key().to_string(), rendered);
    }

    println!("\n✅ Done\n");
    Ok(())
}
