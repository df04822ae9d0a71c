use serde::{Deserialize, Serialize};

/// 索引文档类型（delete 时使用）
pub const EVENT_DOCUMENT_TYPE: &str = "event";

/// 调用方已解析好的有效租户 + 用户上下文
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub organization: String,
    pub user: String,
}

impl Tenant {
    pub fn new(organization: &str, user: &str) -> Self {
        Self {
            organization: organization.to_string(),
            user: user.to_string(),
        }
    }
}

/// 搜索索引中的事件文档
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub identifier: String,
    pub organization: String,
    /// 序列化后的 ACL，可能缺失或为空串
    #[serde(default)]
    pub access_policy: Option<String>,
    #[serde(default)]
    pub series_id: Option<String>,
    #[serde(default)]
    pub title: String,
    /// ISO-8601，按字典序参与排序
    #[serde(default)]
    pub date: Option<String>,
}

impl EventRecord {
    /// 空白 series 视为“无 series”
    pub fn series(&self) -> Option<&str> {
        self.series_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }

    /// identifier + organization 拼接而成的文档键
    pub fn composite_key(&self) -> String {
        composite_key(&self.identifier, &self.organization)
    }
}

pub fn composite_key(identifier: &str, organization: &str) -> String {
    format!("{identifier}{organization}")
}
