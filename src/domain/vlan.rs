//! VLAN Entity Model
//!
//! The persisted record shape, the create/patch commands decoded from
//! requests, and the structural checks a single record must pass without
//! looking at any other record.

use ipnetwork::Ipv4Network;
use serde::{Deserialize, Deserializer, Serialize};
use std::net::Ipv4Addr;

// =============================================================================
// Constants
// =============================================================================

/// Lowest assignable 802.1Q VLAN ID
pub const VLAN_ID_MIN: i64 = 1;

/// Highest assignable 802.1Q VLAN ID (4095 is reserved)
pub const VLAN_ID_MAX: i64 = 4094;

/// Maximum VLAN name length in characters
pub const NAME_MAX_CHARS: usize = 100;

// =============================================================================
// Status
// =============================================================================

/// Operational status of a VLAN
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VlanStatus {
    #[default]
    Active,
    Inactive,
    Maintenance,
}

impl VlanStatus {
    pub const ALL: [VlanStatus; 3] = [
        VlanStatus::Active,
        VlanStatus::Inactive,
        VlanStatus::Maintenance,
    ];

    /// Parse a status name, exact lowercase match only
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VlanStatus::Active => "active",
            VlanStatus::Inactive => "inactive",
            VlanStatus::Maintenance => "maintenance",
        }
    }
}

impl std::fmt::Display for VlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Record
// =============================================================================

/// A persisted VLAN configuration record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanRecord {
    /// System-assigned identifier, never reused
    pub id: u64,
    /// Human-readable name
    pub name: String,
    /// 802.1Q VLAN ID, unique across all records
    pub vlan_id: u16,
    /// Subnet in CIDR notation
    pub subnet: String,
    /// Gateway address inside `subnet`
    pub gateway: String,
    /// Current status
    pub status: VlanStatus,
}

impl VlanRecord {
    /// Re-run the structural checks against a record read back from storage
    pub fn check(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        collect(&mut errors, validate_name(&self.name));
        collect(&mut errors, validate_vlan_id(i64::from(self.vlan_id)));
        collect(&mut errors, validate_subnet(&self.subnet));
        collect(&mut errors, validate_gateway(&self.gateway));
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Structurally valid fields of a record that has no id yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlanFields {
    pub name: String,
    pub vlan_id: u16,
    pub subnet: String,
    pub gateway: String,
    pub status: VlanStatus,
}

impl VlanFields {
    /// Attach an id, producing the record to persist
    pub fn into_record(self, id: u64) -> VlanRecord {
        VlanRecord {
            id,
            name: self.name,
            vlan_id: self.vlan_id,
            subnet: self.subnet,
            gateway: self.gateway,
            status: self.status,
        }
    }
}

// =============================================================================
// Field Errors
// =============================================================================

/// A single field-level violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field the violation applies to
    pub field: String,
    /// Machine-readable code (e.g. `out_of_range`)
    pub code: &'static str,
    /// Human-readable explanation
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code,
            message: message.into(),
        }
    }
}

fn collect<T>(errors: &mut Vec<FieldError>, result: Result<T, FieldError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse a dotted-quad IPv4 address: four decimal octets 0-255
pub fn parse_ipv4(s: &str) -> Option<Ipv4Addr> {
    s.parse().ok()
}

/// Parse `A.B.C.D/N` into a network
///
/// Host bits may be set (`192.168.1.7/24` describes 192.168.1.0/24). A missing
/// `/`, an octet above 255 or a prefix above 32 is rejected.
pub fn parse_cidr(s: &str) -> Option<Ipv4Network> {
    let (addr, prefix) = s.split_once('/')?;
    let addr = parse_ipv4(addr)?;

    if prefix.is_empty() || prefix.len() > 2 || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let prefix: u8 = prefix.parse().ok()?;

    Ipv4Network::new(addr, prefix).ok()
}

// =============================================================================
// Field Validators
// =============================================================================

pub fn validate_name(name: &str) -> Result<(), FieldError> {
    if name.trim().is_empty() {
        return Err(FieldError::new(
            "name",
            "string_too_short",
            "name must contain at least 1 non-whitespace character",
        ));
    }
    let chars = name.chars().count();
    if chars > NAME_MAX_CHARS {
        return Err(FieldError::new(
            "name",
            "string_too_long",
            format!("name must be at most {} characters, got {}", NAME_MAX_CHARS, chars),
        ));
    }
    Ok(())
}

pub fn validate_vlan_id(vlan_id: i64) -> Result<u16, FieldError> {
    if !(VLAN_ID_MIN..=VLAN_ID_MAX).contains(&vlan_id) {
        return Err(FieldError::new(
            "vlan_id",
            "out_of_range",
            format!(
                "VLAN ID {} must be between {} and {}",
                vlan_id, VLAN_ID_MIN, VLAN_ID_MAX
            ),
        ));
    }
    Ok(vlan_id as u16)
}

pub fn validate_subnet(subnet: &str) -> Result<Ipv4Network, FieldError> {
    parse_cidr(subnet).ok_or_else(|| {
        FieldError::new(
            "subnet",
            "invalid_cidr",
            "Invalid subnet format. Use CIDR notation (e.g., 192.168.1.0/24)",
        )
    })
}

pub fn validate_gateway(gateway: &str) -> Result<Ipv4Addr, FieldError> {
    parse_ipv4(gateway).ok_or_else(|| {
        FieldError::new("gateway", "invalid_ipv4", "Invalid gateway IP address format")
    })
}

pub fn validate_status(status: &str) -> Result<VlanStatus, FieldError> {
    VlanStatus::parse(status).ok_or_else(|| {
        FieldError::new(
            "status",
            "invalid_status",
            format!(
                "status must be one of 'active', 'inactive', 'maintenance', got '{}'",
                status
            ),
        )
    })
}

// =============================================================================
// Create Command
// =============================================================================

/// Create command as decoded from a request body
///
/// Fields hold raw values; `validate_structural` turns them into typed
/// [`VlanFields`] or reports every violation at once.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewVlan {
    pub name: String,
    pub vlan_id: i64,
    pub subnet: String,
    pub gateway: String,
    /// Defaults to `active` when omitted; `null` is rejected
    #[serde(default)]
    pub status: Field<String>,
}

/// Check a create command in isolation, aggregating all field errors
pub fn validate_structural(cmd: &NewVlan) -> Result<VlanFields, Vec<FieldError>> {
    let mut errors = Vec::new();

    collect(&mut errors, validate_name(&cmd.name));
    let vlan_id = collect(&mut errors, validate_vlan_id(cmd.vlan_id));
    collect(&mut errors, validate_subnet(&cmd.subnet));
    collect(&mut errors, validate_gateway(&cmd.gateway));
    let status = match collect(&mut errors, cmd.status.resolve("status")) {
        Some(Some(s)) => collect(&mut errors, validate_status(s)),
        Some(None) => Some(VlanStatus::default()),
        None => None,
    };

    match (vlan_id, status) {
        (Some(vlan_id), Some(status)) if errors.is_empty() => Ok(VlanFields {
            name: cmd.name.clone(),
            vlan_id,
            subnet: cmd.subnet.clone(),
            gateway: cmd.gateway.clone(),
            status,
        }),
        _ => Err(errors),
    }
}

// =============================================================================
// Patch Command
// =============================================================================

/// One field of a partial update
///
/// Distinguishes a field left out of the request from one explicitly set to
/// `null`. Use with `#[serde(default)]` so absent fields become `Absent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Absent
    }
}

impl<T> Field<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }

    fn resolve(&self, name: &str) -> Result<Option<&T>, FieldError> {
        match self {
            Field::Absent => Ok(None),
            Field::Value(v) => Ok(Some(v)),
            Field::Null => Err(FieldError::new(
                name,
                "null_not_allowed",
                format!("{} may be omitted but not set to null", name),
            )),
        }
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Field::Value(value)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Field::Value(value),
            None => Field::Null,
        })
    }
}

/// Partial update command; only supplied fields change
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VlanPatch {
    pub name: Field<String>,
    pub vlan_id: Field<i64>,
    pub subnet: Field<String>,
    pub gateway: Field<String>,
    pub status: Field<String>,
}

/// A patch merged onto the current record, with what it actually changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedVlan {
    pub record: VlanRecord,
    pub vlan_id_changed: bool,
    pub addressing_changed: bool,
}

impl VlanPatch {
    /// True when the patch supplies no fields at all
    pub fn is_empty(&self) -> bool {
        self.name.is_absent()
            && self.vlan_id.is_absent()
            && self.subnet.is_absent()
            && self.gateway.is_absent()
            && self.status.is_absent()
    }

    /// Validate the supplied fields and merge them onto `current`
    pub fn merge_onto(&self, current: &VlanRecord) -> Result<MergedVlan, Vec<FieldError>> {
        let mut errors = Vec::new();
        let mut record = current.clone();

        if let Some(Some(name)) = collect(&mut errors, self.name.resolve("name")) {
            if collect(&mut errors, validate_name(name)).is_some() {
                record.name = name.clone();
            }
        }
        if let Some(Some(&vlan_id)) = collect(&mut errors, self.vlan_id.resolve("vlan_id")) {
            if let Some(vlan_id) = collect(&mut errors, validate_vlan_id(vlan_id)) {
                record.vlan_id = vlan_id;
            }
        }
        if let Some(Some(subnet)) = collect(&mut errors, self.subnet.resolve("subnet")) {
            if collect(&mut errors, validate_subnet(subnet)).is_some() {
                record.subnet = subnet.clone();
            }
        }
        if let Some(Some(gateway)) = collect(&mut errors, self.gateway.resolve("gateway")) {
            if collect(&mut errors, validate_gateway(gateway)).is_some() {
                record.gateway = gateway.clone();
            }
        }
        if let Some(Some(status)) = collect(&mut errors, self.status.resolve("status")) {
            if let Some(status) = collect(&mut errors, validate_status(status)) {
                record.status = status;
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(MergedVlan {
            vlan_id_changed: record.vlan_id != current.vlan_id,
            addressing_changed: record.subnet != current.subnet
                || record.gateway != current.gateway,
            record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_vlan() -> NewVlan {
        NewVlan {
            name: "Test VLAN".into(),
            vlan_id: 100,
            subnet: "192.168.1.0/24".into(),
            gateway: "192.168.1.1".into(),
            status: Field::Value("active".into()),
        }
    }

    fn record() -> VlanRecord {
        validate_structural(&new_vlan()).unwrap().into_record(1)
    }

    fn codes(errors: &[FieldError]) -> Vec<(&str, &str)> {
        errors.iter().map(|e| (e.field.as_str(), e.code)).collect()
    }

    #[test]
    fn test_parse_ipv4() {
        assert_eq!(parse_ipv4("192.168.1.1"), Some(Ipv4Addr::new(192, 168, 1, 1)));
        assert_eq!(parse_ipv4("0.0.0.0"), Some(Ipv4Addr::UNSPECIFIED));
        assert!(parse_ipv4("256.1.1.1").is_none());
        assert!(parse_ipv4("1.2.3").is_none());
        assert!(parse_ipv4("1.2.3.4.5").is_none());
        assert!(parse_ipv4("a.b.c.d").is_none());
        assert!(parse_ipv4("").is_none());
    }

    #[test]
    fn test_parse_cidr() {
        let net = parse_cidr("192.168.1.0/24").unwrap();
        assert_eq!(net.prefix(), 24);
        assert_eq!(net.network(), Ipv4Addr::new(192, 168, 1, 0));

        // Host bits set are tolerated
        let net = parse_cidr("10.1.2.3/8").unwrap();
        assert_eq!(net.network(), Ipv4Addr::new(10, 0, 0, 0));

        assert!(parse_cidr("0.0.0.0/0").is_some());
        assert!(parse_cidr("10.0.0.1/32").is_some());

        assert!(parse_cidr("192.168.1.0").is_none());
        assert!(parse_cidr("192.168.1.0/33").is_none());
        assert!(parse_cidr("192.168.1.0/").is_none());
        assert!(parse_cidr("192.168.1.0/+8").is_none());
        assert!(parse_cidr("300.168.1.0/24").is_none());
        assert!(parse_cidr("10/8").is_none());
    }

    #[test]
    fn test_valid_create() {
        let fields = validate_structural(&new_vlan()).unwrap();
        assert_eq!(fields.name, "Test VLAN");
        assert_eq!(fields.vlan_id, 100);
        assert_eq!(fields.status, VlanStatus::Active);
    }

    #[test]
    fn test_status_defaults_to_active() {
        let mut cmd = new_vlan();
        cmd.status = Field::Absent;
        assert_eq!(validate_structural(&cmd).unwrap().status, VlanStatus::Active);
    }

    #[test]
    fn test_create_status_null_rejected() {
        let cmd: NewVlan = serde_json::from_str(
            r#"{"name": "Prod", "vlan_id": 100, "subnet": "192.168.1.0/24",
                "gateway": "192.168.1.1", "status": null}"#,
        )
        .unwrap();
        assert_eq!(cmd.status, Field::Null);

        let errors = validate_structural(&cmd).unwrap_err();
        assert_eq!(codes(&errors), vec![("status", "null_not_allowed")]);

        let cmd: NewVlan = serde_json::from_str(
            r#"{"name": "Prod", "vlan_id": 100, "subnet": "192.168.1.0/24",
                "gateway": "192.168.1.1"}"#,
        )
        .unwrap();
        assert!(cmd.status.is_absent());
    }

    #[test]
    fn test_all_statuses_accepted() {
        for status in VlanStatus::ALL {
            let mut cmd = new_vlan();
            cmd.status = Field::Value(status.to_string());
            assert_eq!(validate_structural(&cmd).unwrap().status, status);
        }
    }

    #[test]
    fn test_vlan_id_bounds() {
        for ok in [1, 4094] {
            let mut cmd = new_vlan();
            cmd.vlan_id = ok;
            assert!(validate_structural(&cmd).is_ok());
        }
        for bad in [0, 4095, -1, 70000] {
            let mut cmd = new_vlan();
            cmd.vlan_id = bad;
            let errors = validate_structural(&cmd).unwrap_err();
            assert_eq!(codes(&errors), vec![("vlan_id", "out_of_range")]);
        }
    }

    #[test]
    fn test_name_rules() {
        let mut cmd = new_vlan();
        cmd.name = "   ".into();
        assert_eq!(
            codes(&validate_structural(&cmd).unwrap_err()),
            vec![("name", "string_too_short")]
        );

        cmd.name = "x".repeat(101);
        assert_eq!(
            codes(&validate_structural(&cmd).unwrap_err()),
            vec![("name", "string_too_long")]
        );

        // 100 multi-byte characters is still within the limit
        cmd.name = "é".repeat(100);
        assert!(validate_structural(&cmd).is_ok());
    }

    #[test]
    fn test_errors_are_aggregated() {
        let cmd = NewVlan {
            name: "".into(),
            vlan_id: 5000,
            subnet: "not-a-subnet".into(),
            gateway: "999.1.1.1".into(),
            status: Field::Value("broken".into()),
        };
        let errors = validate_structural(&cmd).unwrap_err();
        assert_eq!(
            codes(&errors),
            vec![
                ("name", "string_too_short"),
                ("vlan_id", "out_of_range"),
                ("subnet", "invalid_cidr"),
                ("gateway", "invalid_ipv4"),
                ("status", "invalid_status"),
            ]
        );
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&VlanStatus::Maintenance).unwrap();
        assert_eq!(json, "\"maintenance\"");
        assert!(serde_json::from_str::<VlanStatus>("\"Active\"").is_err());
        assert!(VlanStatus::parse("ACTIVE").is_none());
    }

    #[test]
    fn test_patch_presence() {
        let patch: VlanPatch = serde_json::from_str(r#"{"name": "Updated"}"#).unwrap();
        assert_eq!(patch.name, Field::Value("Updated".to_string()));
        assert!(patch.vlan_id.is_absent());
        assert!(!patch.is_empty());

        let patch: VlanPatch = serde_json::from_str(r#"{"gateway": null}"#).unwrap();
        assert_eq!(patch.gateway, Field::Null);

        let patch: VlanPatch = serde_json::from_str("{}").unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_patch_merge_keeps_unsupplied_fields() {
        let current = record();
        let patch = VlanPatch {
            name: "Updated VLAN".to_string().into(),
            status: "inactive".to_string().into(),
            ..Default::default()
        };

        let merged = patch.merge_onto(&current).unwrap();
        assert_eq!(merged.record.name, "Updated VLAN");
        assert_eq!(merged.record.status, VlanStatus::Inactive);
        assert_eq!(merged.record.vlan_id, 100);
        assert_eq!(merged.record.subnet, current.subnet);
        assert!(!merged.vlan_id_changed);
        assert!(!merged.addressing_changed);
    }

    #[test]
    fn test_patch_change_flags() {
        let current = record();

        let same_vlan = VlanPatch {
            vlan_id: Field::Value(100),
            ..Default::default()
        };
        assert!(!same_vlan.merge_onto(&current).unwrap().vlan_id_changed);

        let new_gateway = VlanPatch {
            gateway: "192.168.1.254".to_string().into(),
            ..Default::default()
        };
        assert!(new_gateway.merge_onto(&current).unwrap().addressing_changed);
    }

    #[test]
    fn test_patch_rejects_null_and_bad_values() {
        let current = record();
        let patch = VlanPatch {
            name: Field::Null,
            vlan_id: Field::Value(0),
            subnet: "10.0.0.0/40".to_string().into(),
            ..Default::default()
        };
        let errors = patch.merge_onto(&current).unwrap_err();
        assert_eq!(
            codes(&errors),
            vec![
                ("name", "null_not_allowed"),
                ("vlan_id", "out_of_range"),
                ("subnet", "invalid_cidr"),
            ]
        );
    }

    #[test]
    fn test_record_check() {
        assert!(record().check().is_ok());

        let mut bad = record();
        bad.vlan_id = 0;
        bad.subnet = "garbage".into();
        let errors = bad.check().unwrap_err();
        assert_eq!(
            codes(&errors),
            vec![("vlan_id", "out_of_range"), ("subnet", "invalid_cidr")]
        );
    }
}
