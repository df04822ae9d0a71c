//! 测试用协作者：可注入故障的索引 / 存储

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::audit::pager::CancelFlag;
use crate::core::{AccessControlList, EventRecord, Tenant};
use crate::error::{IndexError, StoreError};
use crate::index::{EventQuery, MemoryIndex, Page, SearchIndex};
use crate::store::RecordStore;

pub const VALID_ACL: &str =
    r#"{"acl":{"ace":[{"role":"ROLE_ADMIN","action":"write","allow":true}]}}"#;

pub fn unique_tmp_path(tag: &str) -> std::path::PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("acl-mend-audit-{}-{}", tag, nanos))
}

pub fn event(id: &str, acl: Option<&str>, series: Option<&str>, title: &str) -> EventRecord {
    EventRecord {
        identifier: id.to_string(),
        organization: "org".to_string(),
        access_policy: acl.map(str::to_string),
        series_id: series.map(str::to_string),
        title: title.to_string(),
        date: Some("2024-01-01T00:00:00Z".to_string()),
    }
}

pub struct FlakyIndex {
    pub inner: MemoryIndex,
    queries: AtomicUsize,
    fail_query_at: Option<usize>,
    fail_updates: HashSet<String>,
    cancel_after: Option<(usize, CancelFlag)>,
    pub updates: AtomicUsize,
}

impl FlakyIndex {
    pub fn new(inner: MemoryIndex) -> Self {
        Self {
            inner,
            queries: AtomicUsize::new(0),
            fail_query_at: None,
            fail_updates: HashSet::new(),
            cancel_after: None,
            updates: AtomicUsize::new(0),
        }
    }

    /// 第 n 次（从 0 计）query 失败
    pub fn fail_query_at(mut self, n: usize) -> Self {
        self.fail_query_at = Some(n);
        self
    }

    /// 第 n 次 query 返回后置位取消标记（模拟两页之间的 Ctrl-C）
    pub fn cancel_after_query(mut self, n: usize, cancel: CancelFlag) -> Self {
        self.cancel_after = Some((n, cancel));
        self
    }

    pub fn fail_update_for(mut self, id: &str) -> Self {
        self.fail_updates.insert(id.to_string());
        self
    }

    fn unavailable(&self) -> IndexError {
        IndexError::Unavailable {
            index: self.inner.name().to_string(),
            detail: "connection refused".to_string(),
        }
    }
}

impl SearchIndex for FlakyIndex {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn query(&self, query: &EventQuery) -> Result<Page, IndexError> {
        let n = self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_query_at == Some(n) {
            return Err(self.unavailable());
        }
        let page = self.inner.query(query);
        if let Some((at, cancel)) = &self.cancel_after {
            if *at == n {
                cancel.cancel();
            }
        }
        page
    }

    fn update(&self, event: &EventRecord) -> Result<(), IndexError> {
        if self.fail_updates.contains(&event.identifier) {
            return Err(self.unavailable());
        }
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(event)
    }

    fn delete(&self, document_type: &str, composite_key: &str) -> Result<(), IndexError> {
        self.inner.delete(document_type, composite_key)
    }

    fn flush(&self) -> Result<(), IndexError> {
        self.inner.flush()
    }
}

/// 对指定事件返回 Unavailable 的存储
pub struct FlakyStore<S> {
    pub inner: S,
    pub unavailable_for: HashSet<String>,
}

impl<S: RecordStore> RecordStore for FlakyStore<S> {
    fn latest_acl_for(
        &self,
        tenant: &Tenant,
        event_id: &str,
    ) -> Result<AccessControlList, StoreError> {
        if self.unavailable_for.contains(event_id) {
            return Err(StoreError::Unavailable("timeout".to_string()));
        }
        self.inner.latest_acl_for(tenant, event_id)
    }
}
