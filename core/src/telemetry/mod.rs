//! telemetry/mod.rs
//! Counters, stage timers and immutable snapshots for the stream adapters.
//!
//! Notes:
//! - Counters are plain fields owned by one producer; no atomics or locks.
//! - A snapshot is taken once, when a pump or pipe ends.

pub mod counters;
pub mod snapshot;
pub mod timers;

pub use counters::*;
pub use snapshot::*;
pub use timers::*;
