//! API Module
//!
//! REST surface for VLAN management plus the server that hosts it.

pub mod server;
pub mod rest;

pub use server::*;
pub use rest::*;
