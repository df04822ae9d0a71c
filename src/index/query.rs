use std::cmp::Ordering;

use crate::core::{EventRecord, Tenant};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Order {
    Ascending,
    Descending,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SortKey {
    Title(Order),
    Date(Order),
}

impl SortKey {
    pub fn compare(&self, a: &EventRecord, b: &EventRecord) -> Ordering {
        let (ord, order) = match self {
            SortKey::Title(o) => (a.title.cmp(&b.title), *o),
            // 缺失日期排在最前
            SortKey::Date(o) => (a.date.cmp(&b.date), *o),
        };
        match order {
            Order::Ascending => ord,
            Order::Descending => ord.reverse(),
        }
    }
}

/// audit / repair 使用的默认排序：title 升序，再 date 升序
pub const SCAN_SORT: [SortKey; 2] = [
    SortKey::Title(Order::Ascending),
    SortKey::Date(Order::Ascending),
];

/// 事件查询（租户范围内）
#[derive(Clone, Debug)]
pub struct EventQuery {
    pub tenant: Tenant,
    pub identifier: Option<String>,
    pub offset: usize,
    pub limit: usize,
    pub sort: Vec<SortKey>,
}

impl EventQuery {
    pub fn new(tenant: &Tenant) -> Self {
        Self {
            tenant: tenant.clone(),
            identifier: None,
            offset: 0,
            limit: usize::MAX,
            sort: Vec::new(),
        }
    }

    pub fn with_identifier(mut self, id: &str) -> Self {
        self.identifier = Some(id.to_string());
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn sort_by(mut self, key: SortKey) -> Self {
        self.sort.push(key);
        self
    }

    /// 是否命中（租户 + 可选 identifier）
    pub fn matches(&self, event: &EventRecord) -> bool {
        event.organization == self.tenant.organization
            && self
                .identifier
                .as_deref()
                .map_or(true, |id| event.identifier == id)
    }

    /// 按 sort keys 比较；全部相等时以 identifier 兜底，保证翻页稳定
    pub fn compare(&self, a: &EventRecord, b: &EventRecord) -> Ordering {
        self.sort
            .iter()
            .map(|k| k.compare(a, b))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| a.identifier.cmp(&b.identifier))
    }
}

/// 一页结果；`items` 为空表示数据结束
#[derive(Clone, Debug, Default)]
pub struct Page {
    pub items: Vec<EventRecord>,
    pub total_count: usize,
}

impl Page {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
