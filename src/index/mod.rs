pub mod memory;
pub mod ops;
pub mod query;
pub mod registry;

use crate::core::EventRecord;
use crate::error::IndexError;

/// 搜索索引抽象（外部协作者）。
///
/// ## 契约（重要）
/// - `query` 在数据不变时，对固定 sort keys 必须给出稳定、可重复的顺序。
/// - `query` 返回空 `items` 即表示数据结束。
/// - `update` 只替换已存在记录的 ACL 字段；identifier 不存在时返回 `NotFound`。
/// - 本层不做任何进程内加锁协调，一致性交给后端。
pub trait SearchIndex: Send + Sync {
    fn name(&self) -> &str;

    fn query(&self, query: &EventQuery) -> Result<Page, IndexError>;

    fn update(&self, event: &EventRecord) -> Result<(), IndexError>;

    fn delete(&self, document_type: &str, composite_key: &str) -> Result<(), IndexError>;

    /// 持久化未落盘的修改（默认无操作）
    fn flush(&self) -> Result<(), IndexError> {
        Ok(())
    }
}

pub use memory::MemoryIndex;
pub use ops::{delete_event, get_event};
pub use query::{EventQuery, Order, Page, SortKey, SCAN_SORT};
pub use registry::IndexRegistry;
