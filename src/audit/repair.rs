use std::time::Instant;

use crate::audit::pager::{EventPager, ScanOptions};
use crate::audit::report::RepairReport;
use crate::core::{classify, AclState, EventRecord, Tenant};
use crate::error::{AuditError, RepairFailure};
use crate::index::SearchIndex;
use crate::store::RecordStore;

/// 修复：复用扫描 + 分类，对缺陷记录从权威存储回填 ACL。
///
/// - 只改写已存在记录的 ACL 字段，从不删除事件
/// - 权威 ACL 为空 / 不存在时该记录失败，绝不把“空”写回索引
/// - 单条记录失败降级为 notFixed，不中断翻页
/// - 只有翻页查询失败（或取消）才让整个 repair 失败
pub struct Repairer<'a> {
    index: &'a dyn SearchIndex,
    store: &'a dyn RecordStore,
    options: ScanOptions,
}

impl<'a> Repairer<'a> {
    pub fn new(index: &'a dyn SearchIndex, store: &'a dyn RecordStore, options: ScanOptions) -> Self {
        Self {
            index,
            store,
            options,
        }
    }

    pub fn repair(&self, tenant: &Tenant, include_broken: bool) -> Result<RepairReport, AuditError> {
        let started = Instant::now();
        let mut report = RepairReport::default();
        let mut pager = EventPager::new(self.index, tenant, &self.options);

        while let Some(items) = pager.next_page()? {
            for event in items {
                let state = classify(event.access_policy.as_deref());
                report.stats.record(state);

                let eligible = match state {
                    AclState::Valid => false,
                    AclState::Empty => true,
                    AclState::Broken => include_broken,
                };
                if !eligible {
                    continue;
                }

                let id = event.identifier.clone();
                match self.repair_one(tenant, event) {
                    Ok(()) => report.record_fixed(&id),
                    Err(reason) => {
                        tracing::warn!("Failed to fix ACL of event {}: {}", id, reason);
                        report.record_not_fixed(&id, reason);
                    }
                }
            }
            tracing::debug!(
                "Fixed {} event acls so far in index `{}`",
                report.fixed_count,
                self.index.name()
            );
        }

        report.stats.pages = pager.pages();
        report.stats.elapsed = started.elapsed();
        tracing::info!(
            "Repair of index `{}` for {} (include_broken={}): {} fixed, {} not fixed",
            self.index.name(),
            tenant.organization,
            include_broken,
            report.fixed_count,
            report.not_fixed_count
        );
        Ok(report)
    }

    /// repair 后无论成败都 flush 一次，已写入的修复不会因提前返回而丢失。
    ///
    /// flush 失败不丢弃报告：记日志并放进 `RepairReport::flush_error`。
    pub fn repair_and_flush(
        &self,
        tenant: &Tenant,
        include_broken: bool,
    ) -> Result<RepairReport, AuditError> {
        let outcome = self.repair(tenant, include_broken);
        let flushed = self.index.flush();
        if let Err(e) = &flushed {
            tracing::warn!(
                "Failed to persist index `{}` after repair: {}",
                self.index.name(),
                e
            );
        }
        let mut report = outcome?;
        report.flush_error = flushed.err();
        Ok(report)
    }

    fn repair_one(&self, tenant: &Tenant, mut event: EventRecord) -> Result<(), RepairFailure> {
        let acl = self.store.latest_acl_for(tenant, &event.identifier)?;
        if acl.is_empty() {
            return Err(RepairFailure::AclEmptyAtSource);
        }
        event.access_policy = Some(acl.to_json());
        self.index.update(&event)?;
        Ok(())
    }
}
