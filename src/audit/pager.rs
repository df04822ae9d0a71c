use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::{EventRecord, Tenant};
use crate::error::AuditError;
use crate::index::{EventQuery, SearchIndex, SCAN_SORT};

pub const DEFAULT_PAGE_SIZE: usize = 100;

/// 跨线程共享的取消标记；只在页与页之间生效
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// audit / repair 共用的扫描参数
#[derive(Clone, Debug)]
pub struct ScanOptions {
    pub page_size: usize,
    pub cancel: Option<CancelFlag>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            cancel: None,
        }
    }
}

impl ScanOptions {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// 顺序翻页：offset 从 0 开始，每次前进 page_size，直到返回空页。
///
/// 第 N+1 页只在第 N 页被调用方处理完后才请求（调用方驱动）。
/// 并发写入下记录可能被看到 0/1/2 次，这里不做掩盖。
pub struct EventPager<'a> {
    index: &'a dyn SearchIndex,
    tenant: &'a Tenant,
    page_size: usize,
    offset: usize,
    pages: usize,
    cancel: Option<&'a CancelFlag>,
    finished: bool,
}

impl<'a> EventPager<'a> {
    pub fn new(index: &'a dyn SearchIndex, tenant: &'a Tenant, options: &'a ScanOptions) -> Self {
        Self {
            index,
            tenant,
            // page_size = 0 会导致死循环
            page_size: options.page_size.max(1),
            offset: 0,
            pages: 0,
            cancel: options.cancel.as_ref(),
            finished: false,
        }
    }

    /// 已取回的非空页数
    pub fn pages(&self) -> usize {
        self.pages
    }

    pub fn next_page(&mut self) -> Result<Option<Vec<EventRecord>>, AuditError> {
        if self.finished {
            return Ok(None);
        }
        if self.cancel.is_some_and(|c| c.is_cancelled()) {
            self.finished = true;
            return Err(AuditError::Cancelled { pages: self.pages });
        }

        let mut query = EventQuery::new(self.tenant)
            .with_offset(self.offset)
            .with_limit(self.page_size);
        for key in SCAN_SORT {
            query = query.sort_by(key);
        }

        let page = match self.index.query(&query) {
            Ok(p) => p,
            Err(e) => {
                self.finished = true;
                return Err(e.into());
            }
        };
        if page.is_empty() {
            self.finished = true;
            return Ok(None);
        }

        self.offset += self.page_size;
        self.pages += 1;
        Ok(Some(page.items))
    }
}
