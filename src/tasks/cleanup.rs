//! TTL Cleanup Task
//!
//! Background task that periodically sweeps expired entries from a store.

use std::sync::Weak;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::cache::ExpiringStore;
use crate::storage::{EventBus, StorageEvent};

/// Spawns a task that sweeps the store every `interval`.
///
/// Ticks are delayed rather than bursted when a sweep runs long, so at most
/// one sweep is ever in flight. The task holds only a weak reference and
/// exits on its own once the store is dropped; otherwise the owner aborts
/// the returned handle.
///
/// # Arguments
/// * `store` - Weak reference to the shared store
/// * `interval` - Time between sweeps, must be non-zero
/// * `events` - Bus receiving an `Expired` event per removed key
pub fn spawn_cleanup_task(
    store: Weak<RwLock<ExpiringStore>>,
    interval: Duration,
    events: Option<EventBus>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(?interval, "Starting TTL cleanup task");

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let Some(store) = store.upgrade() else {
                debug!("Store dropped, stopping TTL cleanup task");
                return;
            };

            let removed = {
                let mut guard = store.write().await;
                guard.cleanup()
            };

            if removed.is_empty() {
                debug!("TTL cleanup: no expired entries found");
                continue;
            }

            info!("TTL cleanup: removed {} expired entries", removed.len());
            if let Some(bus) = &events {
                for key in removed {
                    bus.emit(StorageEvent::Expired { key });
                }
            }
        }
    })
}
