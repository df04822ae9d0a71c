use dashmap::DashMap;

use crate::core::{AccessControlList, Tenant};
use crate::error::StoreError;
use crate::storage::RecordVersion;
use crate::store::RecordStore;

/// 版本化的权威存储：event_id -> 各版本
pub struct MemoryRecordStore {
    versions: DashMap<String, Vec<RecordVersion>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            versions: DashMap::new(),
        }
    }

    pub fn from_versions(records: Vec<RecordVersion>) -> Self {
        let store = Self::new();
        for r in records {
            store.insert_version(r);
        }
        store
    }

    pub fn insert_version(&self, record: RecordVersion) {
        self.versions
            .entry(record.event_id.clone())
            .or_default()
            .push(record);
    }

    pub fn event_count(&self) -> usize {
        self.versions.len()
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryRecordStore {
    fn latest_acl_for(
        &self,
        _tenant: &Tenant,
        event_id: &str,
    ) -> Result<AccessControlList, StoreError> {
        let not_found = || StoreError::NotFound(event_id.to_string());
        let versions = self.versions.get(event_id).ok_or_else(not_found)?;
        let latest = versions
            .iter()
            .max_by_key(|v| v.version)
            .ok_or_else(not_found)?;
        // 最新版本没有快照 = 没有权威 ACL
        latest.acl.clone().ok_or_else(not_found)
    }
}
