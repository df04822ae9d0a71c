use crate::core::acl::AccessControlList;

/// 单条事件 ACL 的分类结果（每次扫描临时计算，不落盘）
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AclState {
    Valid,
    /// payload 为空白，或解析成功但没有任何条目
    Empty,
    /// payload 非空白但结构化解析失败
    Broken,
}

impl AclState {
    pub fn is_defective(self) -> bool {
        !matches!(self, AclState::Valid)
    }
}

/// 纯函数：audit 与 repair 共用的唯一“缺陷”判定
pub fn classify(payload: Option<&str>) -> AclState {
    let payload = match payload {
        Some(p) if !p.trim().is_empty() => p,
        _ => return AclState::Empty,
    };
    match AccessControlList::parse(payload) {
        Ok(acl) if acl.is_empty() => AclState::Empty,
        Ok(_) => AclState::Valid,
        Err(_) => AclState::Broken,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{"acl":{"ace":[{"role":"ROLE_ADMIN","action":"read","allow":true}]}}"#;

    #[test]
    fn blank_payloads_are_empty() {
        assert_eq!(classify(None), AclState::Empty);
        assert_eq!(classify(Some("")), AclState::Empty);
        assert_eq!(classify(Some("  \n\t")), AclState::Empty);
    }

    #[test]
    fn zero_entries_are_empty() {
        assert_eq!(classify(Some(r#"{"acl":{"ace":[]}}"#)), AclState::Empty);
        assert_eq!(classify(Some(r#"{"acl":{}}"#)), AclState::Empty);
    }

    #[test]
    fn unparseable_is_broken() {
        assert_eq!(classify(Some("<acl>")), AclState::Broken);
        assert_eq!(classify(Some(r#"{"acl":{"ace":[{"role":1}]}}"#)), AclState::Broken);
        assert!(classify(Some("garbage")).is_defective());
    }

    #[test]
    fn parsed_with_entries_is_valid() {
        assert_eq!(classify(Some(VALID)), AclState::Valid);
        assert!(!classify(Some(VALID)).is_defective());
    }
}
