//! Background Tasks Module
//!
//! # Tasks
//! - TTL Cleanup: sweeps expired entries at a configured interval

mod cleanup;

pub use cleanup::spawn_cleanup_task;
