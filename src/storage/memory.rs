//! In-process durable storage, for tests and ephemeral deployments.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::DurableStorage;
use crate::error::PersistenceError;

/// Slots kept in a map, with an optional byte quota per write.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects values longer than `limit` bytes.
    pub fn with_quota(limit: usize) -> Self {
        Self {
            slots: Mutex::default(),
            quota: Some(limit),
        }
    }

    pub fn contains(&self, slot: &str) -> bool {
        self.lock().contains_key(slot)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DurableStorage for MemoryStorage {
    fn get(&self, slot: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.lock().get(slot).cloned())
    }

    fn set(&self, slot: &str, value: &str) -> Result<(), PersistenceError> {
        if let Some(limit) = self.quota {
            if value.len() > limit {
                return Err(PersistenceError::QuotaExceeded {
                    needed: value.len(),
                    limit,
                });
            }
        }
        self.lock().insert(slot.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, slot: &str) -> Result<(), PersistenceError> {
        self.lock().remove(slot);
        Ok(())
    }
}
