use serde::{Deserialize, Serialize};

use crate::error::AclParseError;

/// 单条访问控制项（ACE）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlEntry {
    pub role: String,
    pub action: String,
    pub allow: bool,
}

impl AccessControlEntry {
    pub fn new(role: &str, action: &str, allow: bool) -> Self {
        Self {
            role: role.to_string(),
            action: action.to_string(),
            allow,
        }
    }
}

/// 访问控制列表：条目顺序无语义
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AccessControlList {
    pub entries: Vec<AccessControlEntry>,
}

impl PartialEq for AccessControlList {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.iter().all(|e| other.entries.contains(e))
            && other.entries.iter().all(|e| self.entries.contains(e))
    }
}

impl Eq for AccessControlList {}

/// 线上格式：`{"acl":{"ace":[...]}}`，`ace` 允许是单个对象
#[derive(Serialize, Deserialize)]
struct AclDocument {
    acl: AclBody,
}

#[derive(Serialize, Deserialize)]
struct AclBody {
    #[serde(default)]
    ace: OneOrMany,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<AccessControlEntry>),
    One(AccessControlEntry),
}

impl Default for OneOrMany {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl AccessControlList {
    pub fn new(entries: Vec<AccessControlEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 结构化解析；不判断空白（空白由分类器处理）
    pub fn parse(payload: &str) -> Result<Self, AclParseError> {
        let doc: AclDocument = serde_json::from_str(payload)?;
        let entries = match doc.acl.ace {
            OneOrMany::Many(v) => v,
            OneOrMany::One(e) => vec![e],
        };
        Ok(Self { entries })
    }

    /// 总是写出数组形式
    pub fn to_json(&self) -> String {
        let doc = AclDocument {
            acl: AclBody {
                ace: OneOrMany::Many(self.entries.clone()),
            },
        };
        // 纯字符串 / bool 字段，序列化不会失败
        serde_json::to_string(&doc).unwrap_or_else(|_| String::from(r#"{"acl":{"ace":[]}}"#))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_array_and_single_object_forms() {
        let many = AccessControlList::parse(
            r#"{"acl":{"ace":[{"role":"ROLE_ADMIN","action":"write","allow":true},{"role":"ROLE_USER","action":"read","allow":true}]}}"#,
        )
        .unwrap();
        assert_eq!(many.len(), 2);

        let one = AccessControlList::parse(
            r#"{"acl":{"ace":{"role":"ROLE_ADMIN","action":"read","allow":false}}}"#,
        )
        .unwrap();
        assert_eq!(one.entries, vec![AccessControlEntry::new("ROLE_ADMIN", "read", false)]);
    }

    #[test]
    fn missing_ace_is_empty_not_error() {
        assert!(AccessControlList::parse(r#"{"acl":{}}"#).unwrap().is_empty());
        assert!(AccessControlList::parse(r#"{"acl":{"ace":[]}}"#).unwrap().is_empty());
    }

    #[test]
    fn structural_errors() {
        assert!(AccessControlList::parse("not json").is_err());
        assert!(AccessControlList::parse("{}").is_err());
        assert!(AccessControlList::parse(r#"{"acl":{"ace":[{"role":"ROLE_ADMIN"}]}}"#).is_err());
    }

    #[test]
    fn equality_ignores_entry_order() {
        let a = AccessControlList::new(vec![
            AccessControlEntry::new("ROLE_A", "read", true),
            AccessControlEntry::new("ROLE_B", "write", true),
        ]);
        let b = AccessControlList::new(vec![
            AccessControlEntry::new("ROLE_B", "write", true),
            AccessControlEntry::new("ROLE_A", "read", true),
        ]);
        assert_eq!(a, b);
        assert_eq!(AccessControlList::parse(&a.to_json()).unwrap(), b);
    }
}
