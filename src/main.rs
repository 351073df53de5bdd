//! Mini KV demo
//!
//! Drives the namespacing facade over the in-memory adapter and prints the
//! resulting statistics as JSON.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mini_kv::{EventBus, EventKind, MemoryAdapter, MemoryConfig, Storage, StorageEvent, StorageOptions, Value};

/// Demo entry point.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the memory adapter and a facade forwarding its expirations
/// 4. Run a few writes, reads and an expiry
/// 5. Print statistics and tear the adapter down
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_kv=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MemoryConfig::from_env();
    let options = StorageOptions::from_env();
    info!(
        "Configuration loaded: max_keys={}, default_ttl={}ms, cleanup_interval={}ms, namespace={}",
        config.max_keys, config.default_ttl, config.cleanup_interval, options.namespace
    );

    let adapter_events = EventBus::new();
    let adapter = Arc::new(
        MemoryAdapter::builder()
            .config(config)
            .events(adapter_events.clone())
            .build()
            .context("failed to build memory adapter")?,
    );
    let storage = Storage::new(adapter.clone(), options);
    storage.forward_expired(&adapter_events);
    storage.on(EventKind::Expired, |event| {
        if let StorageEvent::Expired { key } = event {
            info!("expired: {}", key);
        }
    });

    storage
        .set("greeting", "hello", None)
        .await
        .context("failed to store greeting")?;
    storage
        .set("blob", vec![0u8, 1, 255, 254], None)
        .await
        .context("failed to store blob")?;
    storage
        .set("session", Value::object([("user", "demo")]), Some(50))
        .await
        .context("failed to store session")?;

    let greeting = storage.get("greeting").await?;
    info!("greeting = {:?}", greeting);
    let blob = storage.get("blob").await?;
    let blob_bytes = blob.as_ref().and_then(Value::as_bytes);
    info!("blob = {:?}", blob_bytes);

    tokio::time::sleep(Duration::from_millis(100)).await;
    info!("session after ttl = {:?}", storage.get("session").await?);

    let stats = adapter.stats().await;
    info!("hit rate = {:.2}", stats.hit_rate());
    println!("{}", serde_json::to_string_pretty(&stats)?);

    adapter.destroy().await;
    info!("Adapter destroyed");
    Ok(())
}
