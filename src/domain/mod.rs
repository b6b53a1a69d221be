//! Domain layer - Core business logic and port definitions
//!
//! Entity model, validation engine and the record set live here, together
//! with the storage port that persistence adapters implement, following
//! hexagonal architecture principles.

pub mod ports;
pub mod record_set;
pub mod validation;
pub mod vlan;

pub use ports::*;
pub use record_set::RecordSet;
pub use validation::{
    validate_create, validate_gateway_in_subnet, validate_update, validate_vlan_id_unique,
};
pub use vlan::{
    validate_structural, Field, FieldError, NewVlan, VlanFields, VlanPatch, VlanRecord,
    VlanStatus,
};
