//! Error types for the VLAN manager
//!
//! Every failure a use case can produce is a typed variant here, so the
//! REST layer can map kind to status code without inspecting messages.

use crate::domain::vlan::FieldError;
use thiserror::Error;

/// Unified error type for the VLAN manager
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation failed: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    #[error("Gateway {gateway} is not in subnet {subnet}")]
    GatewayNotInSubnet { gateway: String, subnet: String },

    // =========================================================================
    // Record Errors
    // =========================================================================
    #[error("VLAN with VLAN ID {vlan_id} already exists")]
    VlanConflict { vlan_id: u16 },

    #[error("VLAN with ID {id} not found")]
    NotFound { id: u64 },

    // =========================================================================
    // Storage Errors
    // =========================================================================
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::GatewayNotInSubnet { .. } => "GATEWAY_NOT_IN_SUBNET",
            Error::VlanConflict { .. } => "VLAN_CONFLICT",
            Error::NotFound { .. } => "VLAN_NOT_FOUND",
            Error::StorageUnavailable(_) | Error::Io(_) | Error::JsonParse(_) => {
                "STORAGE_UNAVAILABLE"
            }
            Error::Configuration(_) => "CONFIGURATION_ERROR",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller caused this error (bad input or unknown record)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::GatewayNotInSubnet { .. }
                | Error::VlanConflict { .. }
                | Error::NotFound { .. }
        )
    }

    /// Whether this error came from the persistence layer
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::StorageUnavailable(_) | Error::Io(_) | Error::JsonParse(_)
        )
    }
}

/// Result type alias for the VLAN manager
pub type Result<T> = std::result::Result<T, Error>;
