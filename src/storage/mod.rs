//! Durable Storage Module
//!
//! String slots that outlive the process, used for cache snapshots.

mod file;
mod memory;

use std::fmt::Debug;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::PersistenceError;

// == Durable Storage ==
/// Local key-value store with `get`/`set`/`remove` of whole string slots.
///
/// Implementations report failures; the cache decides whether to absorb them.
pub trait DurableStorage: Send + Sync + Debug {
    /// Reads a slot, `None` if it was never written or was removed.
    fn get(&self, slot: &str) -> Result<Option<String>, PersistenceError>;

    /// Writes a slot, replacing any previous content.
    fn set(&self, slot: &str, value: &str) -> Result<(), PersistenceError>;

    /// Deletes a slot. Removing a missing slot is not an error.
    fn remove(&self, slot: &str) -> Result<(), PersistenceError>;
}
