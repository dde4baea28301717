//! Background Tasks Module
//!
//! Contains background tasks that run alongside the cache.

mod sweep;

pub use sweep::spawn_sweep_task;
