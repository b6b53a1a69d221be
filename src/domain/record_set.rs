//! Record Set
//!
//! The full VLAN collection in creation order, keyed by id, with a secondary
//! index by VLAN ID. The set also tracks the id high-water mark so a deleted
//! id is never handed out again.

use crate::domain::vlan::{VlanFields, VlanRecord};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Ordered VLAN collection with a VLAN ID index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSet {
    /// Records by id, in creation order
    records: IndexMap<u64, VlanRecord>,
    /// VLAN ID -> record id
    by_vlan_id: HashMap<u16, u64>,
    /// Next id to assign; always greater than every id ever assigned
    next_id: u64,
}

impl Default for RecordSet {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            records: IndexMap::new(),
            by_vlan_id: HashMap::new(),
            next_id: 1,
        }
    }

    /// Rebuild a set from stored records, keeping their order
    ///
    /// Fails if two records share an id or a VLAN ID.
    pub fn from_records(records: impl IntoIterator<Item = VlanRecord>) -> Result<Self> {
        let mut set = Self::new();
        for record in records {
            if set.records.contains_key(&record.id) {
                return Err(Error::StorageUnavailable(format!(
                    "duplicate record id {} in stored data",
                    record.id
                )));
            }
            if let Some(&other) = set.by_vlan_id.get(&record.vlan_id) {
                return Err(Error::StorageUnavailable(format!(
                    "records {} and {} share VLAN ID {}",
                    other, record.id, record.vlan_id
                )));
            }
            let following = record.id.checked_add(1).ok_or_else(|| {
                Error::StorageUnavailable(format!(
                    "record id {} leaves no id to assign next",
                    record.id
                ))
            })?;
            set.next_id = set.next_id.max(following);
            set.by_vlan_id.insert(record.vlan_id, record.id);
            set.records.insert(record.id, record);
        }
        Ok(set)
    }

    /// Raise the high-water mark; never lowers it
    pub fn raise_next_id(&mut self, next_id: u64) {
        self.next_id = self.next_id.max(next_id);
    }

    /// The id the next insert will receive
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in creation order
    pub fn iter(&self) -> impl Iterator<Item = &VlanRecord> {
        self.records.values()
    }

    /// Owned copy of all records in creation order
    pub fn to_vec(&self) -> Vec<VlanRecord> {
        self.records.values().cloned().collect()
    }

    pub fn get(&self, id: u64) -> Option<&VlanRecord> {
        self.records.get(&id)
    }

    /// Id of the record holding `vlan_id`, if any
    pub fn find_by_vlan_id(&self, vlan_id: u16) -> Option<u64> {
        self.by_vlan_id.get(&vlan_id).copied()
    }

    /// Append a new record under the next id
    pub fn insert(&mut self, fields: VlanFields) -> Result<&VlanRecord> {
        if self.by_vlan_id.contains_key(&fields.vlan_id) {
            return Err(Error::VlanConflict {
                vlan_id: fields.vlan_id,
            });
        }

        let id = self.next_id;
        let following = id
            .checked_add(1)
            .ok_or_else(|| Error::StorageUnavailable("record id space exhausted".into()))?;
        if self.records.contains_key(&id) {
            return Err(Error::Internal(format!("id {} is already assigned", id)));
        }

        self.next_id = following;
        self.by_vlan_id.insert(fields.vlan_id, id);
        let entry = self.records.entry(id).or_insert(fields.into_record(id));
        Ok(&*entry)
    }

    /// Replace an existing record in place, keeping its position
    pub fn replace(&mut self, record: VlanRecord) -> Result<&VlanRecord> {
        let old_vlan_id = match self.records.get(&record.id) {
            Some(existing) => existing.vlan_id,
            None => return Err(Error::NotFound { id: record.id }),
        };

        if old_vlan_id != record.vlan_id {
            if self.by_vlan_id.contains_key(&record.vlan_id) {
                return Err(Error::VlanConflict {
                    vlan_id: record.vlan_id,
                });
            }
            self.by_vlan_id.remove(&old_vlan_id);
            self.by_vlan_id.insert(record.vlan_id, record.id);
        }

        let id = record.id;
        let slot = self
            .records
            .get_mut(&id)
            .ok_or(Error::NotFound { id })?;
        *slot = record;
        Ok(&*slot)
    }

    /// Remove a record; its id stays retired
    pub fn remove(&mut self, id: u64) -> Option<VlanRecord> {
        let record = self.records.shift_remove(&id)?;
        self.by_vlan_id.remove(&record.vlan_id);
        Some(record)
    }
}
