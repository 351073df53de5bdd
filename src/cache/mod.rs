//! Cache Module
//!
//! In-memory storage engine with TTL expiration and a hard key cap.

mod entry;
mod stats;
mod store;


// Re-export public types
pub use entry::{Entry, ENTRY_OVERHEAD_BYTES};
pub use stats::StoreStats;
pub use store::{ExpiringStore, Lookup};
