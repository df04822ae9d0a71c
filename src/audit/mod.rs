pub mod pager;
pub mod repair;
pub mod report;
pub mod scanner;

#[cfg(test)]
pub(crate) mod testing;

pub use pager::{CancelFlag, EventPager, ScanOptions, DEFAULT_PAGE_SIZE};
pub use repair::Repairer;
pub use report::{AuditReport, GroupedIds, RepairReport, UNGROUPED_KEY};
pub use scanner::Scanner;
