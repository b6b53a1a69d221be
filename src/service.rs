//! VLAN Service
//!
//! Runs each use case end to end: load the record set, validate, mutate,
//! save. Mutations are serialized by one async mutex held across the whole
//! load-modify-save sequence; reads take no lock and rely on the store's
//! atomic replace.

use crate::domain::ports::VlanStoreRef;
use crate::domain::record_set::RecordSet;
use crate::domain::validation::{validate_create, validate_update};
use crate::domain::vlan::{NewVlan, VlanPatch, VlanRecord};
use crate::error::{Error, Result};
use crate::metrics::ServiceMetrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

// =============================================================================
// Health Report
// =============================================================================

/// Service health summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// `healthy` or `unhealthy`
    pub status: String,
    pub timestamp: DateTime<Utc>,
    /// Service version
    pub version: String,
    pub storage_healthy: bool,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.storage_healthy
    }
}

// =============================================================================
// VLAN Service
// =============================================================================

/// Orchestrates validation and persistence for every VLAN use case
pub struct VlanService {
    store: VlanStoreRef,
    /// Serializes load-modify-save for mutating use cases
    write_lock: Mutex<()>,
    metrics: ServiceMetrics,
    version: String,
}

impl VlanService {
    /// Create a service over `store`
    pub fn new(store: VlanStoreRef) -> Result<Arc<Self>> {
        Ok(Arc::new(Self {
            store,
            write_lock: Mutex::new(()),
            metrics: ServiceMetrics::new()?,
            version: crate::VERSION.to_string(),
        }))
    }

    /// Name of the storage backend in use
    pub fn store_backend(&self) -> &str {
        self.store.backend_name()
    }

    pub fn metrics(&self) -> &ServiceMetrics {
        &self.metrics
    }

    /// All records in creation order
    pub async fn list(&self) -> Result<Vec<VlanRecord>> {
        let result = self.load().await.map(|records| records.to_vec());
        self.finish("list", result)
    }

    /// One record by id
    pub async fn get(&self, id: u64) -> Result<VlanRecord> {
        let result = self.load_one(id).await;
        self.finish("get", result)
    }

    /// Validate and store a new record under the next id
    pub async fn create(&self, cmd: NewVlan) -> Result<VlanRecord> {
        let result = self.create_record(cmd).await;
        self.finish("create", result)
    }

    /// Apply a partial update to an existing record
    pub async fn update(&self, id: u64, patch: VlanPatch) -> Result<VlanRecord> {
        let result = self.update_record(id, patch).await;
        self.finish("update", result)
    }

    /// Remove a record permanently
    pub async fn delete(&self, id: u64) -> Result<()> {
        let result = self.delete_record(id).await;
        self.finish("delete", result)
    }

    /// Probe storage and report service health
    pub async fn health(&self) -> HealthReport {
        let storage_healthy = self.store.health_check().await;
        let outcome = if storage_healthy { "ok" } else { "unhealthy" };
        self.metrics.record("health", outcome);

        HealthReport {
            status: if storage_healthy { "healthy" } else { "unhealthy" }.to_string(),
            timestamp: Utc::now(),
            version: self.version.clone(),
            storage_healthy,
        }
    }

    async fn load_one(&self, id: u64) -> Result<VlanRecord> {
        let records = self.load().await?;
        records.get(id).cloned().ok_or(Error::NotFound { id })
    }

    async fn create_record(&self, cmd: NewVlan) -> Result<VlanRecord> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;

        let fields = validate_create(&cmd, &records)?;
        let created = records.insert(fields)?.clone();
        self.save(&records).await?;

        info!(
            "Created VLAN {} (vlan_id {}, {})",
            created.id, created.vlan_id, created.subnet
        );
        Ok(created)
    }

    async fn update_record(&self, id: u64, patch: VlanPatch) -> Result<VlanRecord> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;

        let current = records.get(id).cloned().ok_or(Error::NotFound { id })?;
        let updated = validate_update(&current, &patch, &records)?;
        if updated == current {
            debug!("Update of VLAN {} changed nothing", id);
            return Ok(current);
        }

        let updated = records.replace(updated)?.clone();
        self.save(&records).await?;

        info!("Updated VLAN {} (vlan_id {})", updated.id, updated.vlan_id);
        Ok(updated)
    }

    async fn delete_record(&self, id: u64) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;

        let removed = records.remove(id).ok_or(Error::NotFound { id })?;
        self.save(&records).await?;

        info!("Deleted VLAN {} (vlan_id {})", removed.id, removed.vlan_id);
        Ok(())
    }

    async fn load(&self) -> Result<RecordSet> {
        let records = self.store.load().await.map_err(storage_failure)?;
        self.metrics.set_records(records.len());
        Ok(records)
    }

    async fn save(&self, records: &RecordSet) -> Result<()> {
        self.store.save(records).await.map_err(storage_failure)?;
        self.metrics.set_records(records.len());
        Ok(())
    }

    fn finish<T>(&self, operation: &'static str, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.metrics.record(operation, "ok"),
            Err(e) => {
                if e.is_client_error() {
                    debug!("VLAN {} rejected: {}", operation, e);
                } else {
                    error!("VLAN {} failed: {}", operation, e);
                }
                self.metrics.record(operation, &e.code().to_lowercase());
            }
        }
        result
    }
}

/// Normalize store errors to `StorageUnavailable`
fn storage_failure(e: Error) -> Error {
    if e.is_storage() && !matches!(e, Error::StorageUnavailable(_)) {
        Error::StorageUnavailable(e.to_string())
    } else {
        e
    }
}
