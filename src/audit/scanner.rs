use std::time::Instant;

use crate::audit::pager::{EventPager, ScanOptions};
use crate::audit::report::AuditReport;
use crate::core::{classify, AclState, Tenant};
use crate::error::AuditError;
use crate::index::SearchIndex;

/// 只读审计：翻页扫描 + 分类 + 按 series 分组计数
pub struct Scanner<'a> {
    index: &'a dyn SearchIndex,
    options: ScanOptions,
}

impl<'a> Scanner<'a> {
    pub fn new(index: &'a dyn SearchIndex, options: ScanOptions) -> Self {
        Self { index, options }
    }

    /// 任一页查询失败即整体失败，不返回部分结果；不做内部重试
    pub fn audit(&self, tenant: &Tenant) -> Result<AuditReport, AuditError> {
        let started = Instant::now();
        let mut report = AuditReport::default();
        let mut pager = EventPager::new(self.index, tenant, &self.options);

        while let Some(items) = pager.next_page()? {
            for event in &items {
                let state = classify(event.access_policy.as_deref());
                report.total += 1;
                report.stats.record(state);
                match state {
                    AclState::Valid => {}
                    AclState::Empty => {
                        report.count_empty_acls += 1;
                        report
                            .empty_acls
                            .push_for_series(event.series(), &event.identifier);
                    }
                    AclState::Broken => {
                        report.count_broken_acls += 1;
                        report
                            .broken_acls
                            .push_for_series(event.series(), &event.identifier);
                    }
                }
            }
            tracing::debug!(
                "Analyzed {} event acls so far in index `{}`",
                report.total,
                self.index.name()
            );
        }

        report.stats.pages = pager.pages();
        report.stats.elapsed = started.elapsed();
        tracing::info!(
            "Audit of index `{}` for {}: {} events, {} empty, {} broken",
            self.index.name(),
            tenant.organization,
            report.total,
            report.count_empty_acls,
            report.count_broken_acls
        );
        Ok(report)
    }
}
