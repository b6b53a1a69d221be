//! Service Metrics
//!
//! Prometheus counters for VLAN use cases, kept in a per-service registry
//! and rendered in the text exposition format at `/metrics`.

use crate::error::{Error, Result};
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Metrics recorded by the VLAN service
pub struct ServiceMetrics {
    registry: Registry,
    /// Use case executions by operation and outcome
    operations: IntCounterVec,
    /// Records in the set after the last successful load or save
    records: IntGauge,
}

impl ServiceMetrics {
    /// Create and register all metrics in a fresh registry
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let operations = IntCounterVec::new(
            Opts::new("vlan_operations_total", "VLAN use case executions"),
            &["operation", "outcome"],
        )
        .map_err(metrics_error)?;
        let records = IntGauge::new("vlan_records", "Number of stored VLAN records")
            .map_err(metrics_error)?;

        registry
            .register(Box::new(operations.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(records.clone()))
            .map_err(metrics_error)?;

        Ok(Self {
            registry,
            operations,
            records,
        })
    }

    /// Count one execution of `operation`
    pub fn record(&self, operation: &str, outcome: &str) {
        self.operations
            .with_label_values(&[operation, outcome])
            .inc();
    }

    /// Executions counted so far for `operation` and `outcome`
    pub fn count(&self, operation: &str, outcome: &str) -> u64 {
        self.operations
            .with_label_values(&[operation, outcome])
            .get()
    }

    pub fn set_records(&self, count: usize) {
        self.records.set(count as i64);
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metrics_error)?;
        String::from_utf8(buffer).map_err(|e| Error::Internal(format!("metrics encoding: {}", e)))
    }
}

fn metrics_error(e: prometheus::Error) -> Error {
    Error::Internal(format!("metrics: {}", e))
}
