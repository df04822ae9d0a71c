use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{IndexError, RepairFailure};
use crate::stats::ScanStats;

/// 无 series 的事件归入此分组
pub const UNGROUPED_KEY: &str = "No series";

/// group key -> identifiers 的有序映射。
///
/// 分组按首次插入顺序输出，组内 identifier 按访问顺序输出，
/// 保证报告在相同数据下逐字节一致。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupedIds {
    groups: Vec<(String, Vec<String>)>,
    positions: HashMap<String, usize>,
}

impl GroupedIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, group: &str, id: &str) {
        let pos = match self.positions.get(group) {
            Some(&p) => p,
            None => {
                self.groups.push((group.to_string(), Vec::new()));
                self.positions.insert(group.to_string(), self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        self.groups[pos].1.push(id.to_string());
    }

    /// series 为空时落到 `UNGROUPED_KEY`
    pub fn push_for_series(&mut self, series: Option<&str>, id: &str) {
        self.push(series.unwrap_or(UNGROUPED_KEY), id);
    }

    pub fn get(&self, group: &str) -> Option<&[String]> {
        self.positions
            .get(group)
            .map(|&p| self.groups[p].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// 所有分组中的 identifier 总数
    pub fn id_count(&self) -> usize {
        self.groups.iter().map(|(_, v)| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Serialize for GroupedIds {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (k, v) in &self.groups {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// audit 的对外报告
#[derive(Clone, Debug, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub total: usize,
    pub count_empty_acls: usize,
    pub count_broken_acls: usize,
    pub empty_acls: GroupedIds,
    pub broken_acls: GroupedIds,
    #[serde(skip)]
    pub stats: ScanStats,
}

/// repair 的对外报告；`total` = 实际尝试修复的候选数
#[derive(Clone, Debug, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    pub total: usize,
    pub fixed_count: usize,
    pub not_fixed_count: usize,
    pub fixed: Vec<String>,
    pub not_fixed: Vec<String>,
    /// 每个 notFixed 的失败原因（与 `not_fixed` 同序）
    #[serde(skip)]
    pub failures: Vec<(String, RepairFailure)>,
    /// 修复已生效但落盘失败
    #[serde(skip)]
    pub flush_error: Option<IndexError>,
    #[serde(skip)]
    pub stats: ScanStats,
}

impl RepairReport {
    pub fn record_fixed(&mut self, id: &str) {
        self.fixed.push(id.to_string());
        self.fixed_count += 1;
        self.total += 1;
        self.stats.fixed += 1;
    }

    pub fn record_not_fixed(&mut self, id: &str, reason: RepairFailure) {
        self.not_fixed.push(id.to_string());
        self.failures.push((id.to_string(), reason));
        self.not_fixed_count += 1;
        self.total += 1;
        self.stats.not_fixed += 1;
    }

    pub fn failure_for(&self, id: &str) -> Option<&RepairFailure> {
        self.failures.iter().find(|(i, _)| i == id).map(|(_, r)| r)
    }
}
