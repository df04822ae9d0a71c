use thiserror::Error;

/// 搜索索引层错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// 后端 / 传输层故障（查询或写入失败）
    #[error("search index `{index}` unavailable: {detail}")]
    Unavailable { index: String, detail: String },

    /// 按 identifier 更新 / 删除时记录已不存在
    #[error("event `{id}` not found in index `{index}`")]
    NotFound { index: String, id: String },

    #[error("unknown document type `{0}`")]
    UnknownDocumentType(String),

    /// composite key 拼接后对应多个 (organization, identifier)
    #[error("composite key `{key}` matches {matches} events in index `{index}`")]
    AmbiguousKey {
        index: String,
        key: String,
        matches: usize,
    },
}

/// 权威记录存储（source of truth）错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// 该事件没有任何版本 / 快照
    #[error("no authoritative snapshot exists for event `{0}`")]
    NotFound(String),

    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// 结构化解析失败（分类为 Broken，而不是异常路径）
#[derive(Error, Debug)]
#[error("malformed ACL payload: {0}")]
pub struct AclParseError(#[from] serde_json::Error);

/// 整次 audit / repair 的致命错误
#[derive(Error, Debug)]
pub enum AuditError {
    /// 翻页查询失败：不返回部分结果
    #[error(transparent)]
    Index(#[from] IndexError),

    /// 取消只发生在页与页之间
    #[error("scan cancelled after {pages} page(s)")]
    Cancelled { pages: usize },
}

/// 单条记录修复失败的原因（降级为 notFixed，不会中断整个 repair）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepairFailure {
    #[error("no authoritative record for event")]
    RecordNotFound,

    /// 权威源的 ACL 本身为空：拒绝把“空”写回索引
    #[error("ACL is empty at source")]
    AclEmptyAtSource,

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Index(IndexError),
}

impl From<StoreError> for RepairFailure {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => RepairFailure::RecordNotFound,
            other => RepairFailure::Store(other),
        }
    }
}

impl From<IndexError> for RepairFailure {
    fn from(e: IndexError) -> Self {
        RepairFailure::Index(e)
    }
}
