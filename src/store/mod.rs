pub mod memory;

use crate::core::{AccessControlList, Tenant};
use crate::error::StoreError;

/// 权威 ACL 来源（外部协作者）。
///
/// 每个事件只有一个“当前”ACL：取最新版本的快照。
/// 没有任何快照时返回 `StoreError::NotFound`。
pub trait RecordStore: Send + Sync {
    fn latest_acl_for(&self, tenant: &Tenant, event_id: &str)
        -> Result<AccessControlList, StoreError>;
}

pub use memory::MemoryRecordStore;
