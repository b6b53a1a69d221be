//! Domain Ports - Core trait definitions for the VLAN manager
//!
//! These traits define the boundaries between the domain logic and external systems.
//! Adapters implement these traits to provide concrete functionality.

use crate::domain::record_set::RecordSet;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

// =============================================================================
// VLAN Store Port
// =============================================================================

/// Port for persisting the whole VLAN record set
///
/// The set is always read and written as one document; there is no
/// per-record update. Implementations report every failure as
/// `Error::StorageUnavailable` and never retry on their own.
#[async_trait]
pub trait VlanStore: Send + Sync {
    /// Load the current record set, creating empty storage if none exists
    ///
    /// Never replaces or rewrites existing data; callers may load without
    /// holding any lock.
    async fn load(&self) -> Result<RecordSet>;

    /// Replace the stored record set atomically
    async fn save(&self, records: &RecordSet) -> Result<()>;

    /// Check that storage is readable and writable, without changing data
    async fn health_check(&self) -> bool;

    /// Get backend name
    fn backend_name(&self) -> &str;
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type VlanStoreRef = Arc<dyn VlanStore>;
