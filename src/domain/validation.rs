//! Validation Engine
//!
//! Cross-field and cross-record rules applied at use-case boundaries. Each
//! use case runs its stages in a fixed order and stops at the first failing
//! stage.

use crate::domain::record_set::RecordSet;
use crate::domain::vlan::{
    parse_cidr, parse_ipv4, validate_structural, FieldError, NewVlan, VlanFields, VlanPatch,
    VlanRecord,
};
use crate::error::{Error, Result};

/// Check that `gateway` lies in `[network, broadcast]` of `subnet`
///
/// Network and broadcast addresses themselves are accepted.
pub fn validate_gateway_in_subnet(gateway: &str, subnet: &str) -> Result<()> {
    let network = parse_cidr(subnet).ok_or_else(|| {
        Error::Validation(vec![FieldError::new(
            "subnet",
            "invalid_cidr",
            format!("'{}' is not a CIDR subnet", subnet),
        )])
    })?;
    let gateway_addr = parse_ipv4(gateway).ok_or_else(|| {
        Error::Validation(vec![FieldError::new(
            "gateway",
            "invalid_ipv4",
            format!("'{}' is not an IPv4 address", gateway),
        )])
    })?;

    let first = u32::from(network.network());
    let last = u32::from(network.broadcast());
    let value = u32::from(gateway_addr);

    if (first..=last).contains(&value) {
        Ok(())
    } else {
        Err(Error::GatewayNotInSubnet {
            gateway: gateway.to_string(),
            subnet: subnet.to_string(),
        })
    }
}

/// Check that no other record already uses `vlan_id`
///
/// `exclude_id` names the record being updated, which may keep its own VLAN ID.
pub fn validate_vlan_id_unique(
    vlan_id: u16,
    exclude_id: Option<u64>,
    records: &RecordSet,
) -> Result<()> {
    match records.find_by_vlan_id(vlan_id) {
        Some(owner) if Some(owner) != exclude_id => Err(Error::VlanConflict { vlan_id }),
        _ => Ok(()),
    }
}

/// Structural -> VLAN ID uniqueness -> gateway-in-subnet
pub fn validate_create(cmd: &NewVlan, records: &RecordSet) -> Result<VlanFields> {
    let fields = validate_structural(cmd).map_err(Error::Validation)?;
    validate_vlan_id_unique(fields.vlan_id, None, records)?;
    validate_gateway_in_subnet(&fields.gateway, &fields.subnet)?;
    Ok(fields)
}

/// Validate the supplied patch fields and return the merged record
///
/// Uniqueness is checked only when the VLAN ID changes, gateway containment
/// only when the subnet or gateway changes.
pub fn validate_update(
    current: &VlanRecord,
    patch: &VlanPatch,
    records: &RecordSet,
) -> Result<VlanRecord> {
    let merged = patch.merge_onto(current).map_err(Error::Validation)?;

    if merged.vlan_id_changed {
        validate_vlan_id_unique(merged.record.vlan_id, Some(current.id), records)?;
    }
    if merged.addressing_changed {
        validate_gateway_in_subnet(&merged.record.gateway, &merged.record.subnet)?;
    }

    Ok(merged.record)
}
