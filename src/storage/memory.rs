//! In-Memory VLAN Store
//!
//! Holds the record set in process memory. Satisfies the same contract as
//! the file store and is used in tests and for ephemeral deployments.

use crate::domain::ports::VlanStore;
use crate::domain::record_set::RecordSet;
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// VLAN store backed by process memory
pub struct MemoryStore {
    /// Last saved record set
    records: RwLock<RecordSet>,
    /// Number of completed saves
    saves: AtomicU64,
    /// Is backend available
    available: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::with_records(RecordSet::new())
    }

    /// Create a store pre-loaded with `records`
    pub fn with_records(records: RecordSet) -> Self {
        Self {
            records: RwLock::new(records),
            saves: AtomicU64::new(0),
            available: AtomicBool::new(true),
        }
    }

    /// Set availability (for testing)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    /// Check if available
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::Relaxed)
    }

    /// Copy of the currently stored set
    pub fn snapshot(&self) -> RecordSet {
        self.records.read().clone()
    }

    fn ensure_available(&self) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(Error::StorageUnavailable("memory store marked unavailable".into()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VlanStore for MemoryStore {
    async fn load(&self) -> Result<RecordSet> {
        self.ensure_available()?;
        Ok(self.records.read().clone())
    }

    async fn save(&self, records: &RecordSet) -> Result<()> {
        self.ensure_available()?;
        *self.records.write() = records.clone();
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        self.is_available()
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

// =============================================================================
// Tests
// =============================================================================
