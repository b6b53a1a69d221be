//! VLAN Storage Backends
//!
//! Implementations of the [`VlanStore`](crate::domain::ports::VlanStore) port.

mod file;
mod memory;

pub use file::{FileStore, FileStoreConfig};
pub use memory::MemoryStore;
