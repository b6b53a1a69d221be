//! VLAN Manager
//!
//! A REST service that manages VLAN configuration records: create, list,
//! fetch, partially update and delete, with validation of VLAN ID
//! uniqueness and gateway-in-subnet containment, persisted to a local JSON
//! file with atomic replacement.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              REST API (axum)                │
//! │   /api/v1/vlans   /health   /metrics        │
//! └──────────────────────┬──────────────────────┘
//!                        │
//! ┌──────────────────────┴──────────────────────┐
//! │               VLAN Service                  │
//! │   serialized load → validate → save         │
//! ├─────────────────────────────────────────────┤
//! │   Entity Model   │   Validation Engine      │
//! └──────────────────────┬──────────────────────┘
//!                        │ VlanStore port
//! ┌──────────────────────┴──────────────────────┐
//! │   FileStore (JSON, atomic)  │  MemoryStore  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`api`]: REST router and server
//! - [`service`]: Use case orchestration
//! - [`domain`]: Entity model, validation and the storage port
//! - [`storage`]: Storage backends
//! - [`metrics`]: Prometheus metrics
//! - [`error`]: Error types and handling

pub mod api;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod service;
pub mod storage;

// Re-export commonly used types
pub use api::{ApiErrorResponse, ApiServer, ApiServerConfig, RestRouter};

pub use domain::ports::{VlanStore, VlanStoreRef};
pub use domain::record_set::RecordSet;
pub use domain::vlan::{FieldError, NewVlan, VlanPatch, VlanRecord, VlanStatus};

pub use error::{Error, Result};

pub use metrics::ServiceMetrics;
pub use service::{HealthReport, VlanService};
pub use storage::{FileStore, FileStoreConfig, MemoryStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
