use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::core::{EventRecord, EVENT_DOCUMENT_TYPE};
use crate::error::IndexError;
use crate::index::{EventQuery, Page, SearchIndex};
use crate::storage::write_json_atomic;

/// 进程内搜索索引：(organization, identifier) -> 文档。
///
/// 不用拼接后的 composite key 做主键：`("a1", "org")` 与 `("a", "1org")`
/// 拼出同一个字符串。
///
/// 可选挂一个 JSON 文件作为落盘目标（`flush` 时原子重写）。
type DocKey = (String, String);

fn doc_key(event: &EventRecord) -> DocKey {
    (event.organization.clone(), event.identifier.clone())
}

pub struct MemoryIndex {
    name: String,
    docs: RwLock<HashMap<DocKey, EventRecord>>,
    backing: Option<PathBuf>,
    dirty: AtomicBool,
}

impl MemoryIndex {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            docs: RwLock::new(HashMap::new()),
            backing: None,
            dirty: AtomicBool::new(false),
        }
    }

    pub fn with_events(name: &str, events: Vec<EventRecord>) -> Self {
        let idx = Self::new(name);
        idx.insert_all(events);
        idx
    }

    pub fn with_backing_file(mut self, path: PathBuf) -> Self {
        self.backing = Some(path);
        self
    }

    /// addOrUpdate 语义（种子数据导入用）
    pub fn insert_all(&self, events: Vec<EventRecord>) {
        let mut docs = self.docs.write();
        for ev in events {
            docs.insert(doc_key(&ev), ev);
        }
    }

    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    /// 稳定顺序的全量快照（落盘 / 测试用）
    pub fn snapshot(&self) -> Vec<EventRecord> {
        let mut all: Vec<EventRecord> = self.docs.read().values().cloned().collect();
        all.sort_by(|a, b| {
            a.organization
                .cmp(&b.organization)
                .then_with(|| a.identifier.cmp(&b.identifier))
        });
        all
    }

    fn not_found(&self, id: &str) -> IndexError {
        IndexError::NotFound {
            index: self.name.clone(),
            id: id.to_string(),
        }
    }
}

impl SearchIndex for MemoryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn query(&self, query: &EventQuery) -> Result<Page, IndexError> {
        let docs = self.docs.read();
        let mut hits: Vec<&EventRecord> = docs.values().filter(|e| query.matches(e)).collect();
        hits.sort_by(|a, b| query.compare(a, b));

        let total_count = hits.len();
        let items = hits
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect();

        Ok(Page { items, total_count })
    }

    fn update(&self, event: &EventRecord) -> Result<(), IndexError> {
        let mut docs = self.docs.write();
        let stored = docs
            .get_mut(&doc_key(event))
            .ok_or_else(|| self.not_found(&event.identifier))?;
        stored.access_policy = event.access_policy.clone();
        self.dirty.store(true, Ordering::Release);
        Ok(())
    }

    fn delete(&self, document_type: &str, composite_key: &str) -> Result<(), IndexError> {
        if document_type != EVENT_DOCUMENT_TYPE {
            return Err(IndexError::UnknownDocumentType(document_type.to_string()));
        }
        let mut docs = self.docs.write();
        let matching: Vec<DocKey> = docs
            .iter()
            .filter(|(_, e)| e.composite_key() == composite_key)
            .map(|(k, _)| k.clone())
            .collect();
        match matching.as_slice() {
            [] => return Err(self.not_found(composite_key)),
            [key] => {
                docs.remove(key);
            }
            _ => {
                return Err(IndexError::AmbiguousKey {
                    index: self.name.clone(),
                    key: composite_key.to_string(),
                    matches: matching.len(),
                })
            }
        }
        self.dirty.store(true, Ordering::Release);
        Ok(())
    }

    fn flush(&self) -> Result<(), IndexError> {
        let Some(path) = self.backing.as_ref() else {
            return Ok(());
        };
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        let snapshot = self.snapshot();
        write_json_atomic(path, &snapshot).map_err(|e| {
            self.dirty.store(true, Ordering::Release);
            IndexError::Unavailable {
                index: self.name.clone(),
                detail: e.to_string(),
            }
        })?;
        tracing::info!(
            "Index `{}` flushed: {} events -> {:?}",
            self.name,
            snapshot.len(),
            path
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{composite_key, Tenant};
    use crate::index::{Order, SortKey, SCAN_SORT};

    fn ev(id: &str, org: &str, title: &str, date: &str) -> EventRecord {
        EventRecord {
            identifier: id.into(),
            organization: org.into(),
            access_policy: None,
            series_id: None,
            title: title.into(),
            date: Some(date.into()),
        }
    }

    fn ids(page: &Page) -> Vec<&str> {
        page.items.iter().map(|e| e.identifier.as_str()).collect()
    }

    #[test]
    fn query_is_tenant_scoped_and_sorted() {
        let idx = MemoryIndex::with_events(
            "adminui",
            vec![
                ev("c", "org", "Zoology", "2024-01-01"),
                ev("b", "org", "Algebra", "2024-03-01"),
                ev("a", "org", "Algebra", "2024-02-01"),
                ev("x", "other", "Algebra", "2024-01-01"),
            ],
        );
        let tenant = Tenant::new("org", "admin");
        let mut q = EventQuery::new(&tenant);
        for k in SCAN_SORT {
            q = q.sort_by(k);
        }
        let page = idx.query(&q).unwrap();
        assert_eq!(ids(&page), vec!["a", "b", "c"]);
        assert_eq!(page.total_count, 3);

        let desc = EventQuery::new(&tenant).sort_by(SortKey::Title(Order::Descending));
        assert_eq!(idx.query(&desc).unwrap().items[0].identifier, "c");
    }

    #[test]
    fn offset_past_end_is_empty_page() {
        let idx = MemoryIndex::with_events("api", vec![ev("a", "org", "t", "d")]);
        let tenant = Tenant::new("org", "admin");
        let page = idx
            .query(&EventQuery::new(&tenant).with_offset(1).with_limit(10))
            .unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total_count, 1);
    }

    #[test]
    fn update_only_touches_acl_and_requires_existing() {
        let mut stored = ev("a", "org", "Title", "2024");
        stored.series_id = Some("s".into());
        let idx = MemoryIndex::with_events("api", vec![stored]);

        let mut patch = ev("a", "org", "Other title", "1999");
        patch.access_policy = Some("{}".into());
        idx.update(&patch).unwrap();

        let after = &idx.snapshot()[0];
        assert_eq!(after.access_policy.as_deref(), Some("{}"));
        assert_eq!(after.title, "Title");
        assert_eq!(after.series_id.as_deref(), Some("s"));

        let missing = ev("zzz", "org", "t", "d");
        assert!(matches!(idx.update(&missing), Err(IndexError::NotFound { .. })));
    }

    #[test]
    fn delete_by_composite_key() {
        let idx = MemoryIndex::with_events("api", vec![ev("a", "org", "t", "d")]);
        assert!(matches!(
            idx.delete("series", &composite_key("a", "org")),
            Err(IndexError::UnknownDocumentType(_))
        ));
        idx.delete(EVENT_DOCUMENT_TYPE, &composite_key("a", "org")).unwrap();
        assert!(idx.is_empty());
        assert!(idx.delete(EVENT_DOCUMENT_TYPE, &composite_key("a", "org")).is_err());
    }

    #[test]
    fn colliding_composite_keys_stay_distinct() {
        let idx = MemoryIndex::with_events(
            "api",
            vec![ev("a1", "org", "t", "d"), ev("a", "1org", "t", "d")],
        );
        assert_eq!(idx.len(), 2);

        let mut patch = ev("a1", "org", "t", "d");
        patch.access_policy = Some("x".into());
        idx.update(&patch).unwrap();
        let other = idx
            .snapshot()
            .into_iter()
            .find(|e| e.organization == "1org")
            .unwrap();
        assert_eq!(other.access_policy, None);

        // 同一个拼接串对应两条记录：拒绝删除，两条都保留
        assert!(matches!(
            idx.delete(EVENT_DOCUMENT_TYPE, &composite_key("a1", "org")),
            Err(IndexError::AmbiguousKey { matches: 2, .. })
        ));
        assert_eq!(idx.len(), 2);
    }

    #[test]
    fn flush_writes_backing_file_only_when_dirty() {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir()
            .join(format!("acl-mend-memidx-{}", nanos))
            .join("index-api.json");

        let idx = MemoryIndex::with_events("api", vec![ev("a", "org", "t", "d")])
            .with_backing_file(path.clone());
        idx.flush().unwrap();
        assert!(!path.exists());

        let mut patch = ev("a", "org", "t", "d");
        patch.access_policy = Some("x".into());
        idx.update(&patch).unwrap();
        idx.flush().unwrap();

        let data = std::fs::read(&path).unwrap();
        let on_disk: Vec<EventRecord> = serde_json::from_slice(&data).unwrap();
        assert_eq!(on_disk[0].access_policy.as_deref(), Some("x"));
    }
}
