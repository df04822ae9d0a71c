use std::collections::BTreeMap;
use std::sync::Arc;

use crate::index::SearchIndex;

/// 按名字挂载的多个索引（如 adminui / api），各自独立审计
#[derive(Clone, Default)]
pub struct IndexRegistry {
    indices: BTreeMap<String, Arc<dyn SearchIndex>>,
}

impl IndexRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, index: Arc<dyn SearchIndex>) {
        self.indices.insert(index.name().to_string(), index);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SearchIndex>> {
        self.indices.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.indices.keys().cloned().collect()
    }
}
