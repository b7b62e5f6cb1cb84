//! 필드 가시성 판정.
//!
//! 모델별 필드 → 허용 역할 테이블로 읽기/쓰기 가능한 필드를 계산합니다.
//! 테이블에 없거나 빈 역할 목록에 매핑된 필드는 누구에게도 허용되지 않습니다.
//! 허용되지 않은 필드는 에러 없이 입력에서 제거되고 출력에서 생략됩니다.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::debug;

use super::role::{CallerRoles, Role};

/// 필드별 읽기/쓰기 허용 역할.
#[derive(Debug, Clone, Default)]
struct FieldRule {
    read: Vec<Role>,
    write: Vec<Role>,
}

/// 모델의 필드 ACL 테이블.
#[derive(Debug, Clone, Default)]
pub struct FieldAcl {
    rules: HashMap<&'static str, FieldRule>,
}

impl FieldAcl {
    /// 빈 테이블 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 필드 규칙 추가.
    pub fn field(mut self, name: &'static str, read: &[Role], write: &[Role]) -> Self {
        self.rules.insert(
            name,
            FieldRule {
                read: read.to_vec(),
                write: write.to_vec(),
            },
        );
        self
    }

    /// 단일 역할의 읽기 가능 여부.
    pub fn can_read(&self, role: &Role, field: &str) -> bool {
        self.rules
            .get(field)
            .is_some_and(|rule| rule.read.contains(role))
    }

    /// 단일 역할의 쓰기 가능 여부.
    pub fn can_write(&self, role: &Role, field: &str) -> bool {
        self.rules
            .get(field)
            .is_some_and(|rule| rule.write.contains(role))
    }

    /// 역할 집합 기준 읽기 가능 여부.
    pub fn readable(&self, roles: &CallerRoles, field: &str) -> bool {
        self.rules
            .get(field)
            .is_some_and(|rule| roles.intersects(&rule.read))
    }

    /// 역할 집합 기준 쓰기 가능 여부.
    pub fn writable(&self, roles: &CallerRoles, field: &str) -> bool {
        self.rules
            .get(field)
            .is_some_and(|rule| roles.intersects(&rule.write))
    }

    /// 출력 문서에서 읽을 수 없는 필드 제거.
    pub fn filter_output(&self, roles: &CallerRoles, attributes: Map<String, Value>) -> Map<String, Value> {
        attributes
            .into_iter()
            .filter(|(field, _)| self.readable(roles, field))
            .collect()
    }

    /// 입력 속성에서 쓸 수 없는 필드 제거.
    pub fn filter_input(&self, roles: &CallerRoles, attributes: Map<String, Value>) -> Map<String, Value> {
        attributes
            .into_iter()
            .filter(|(field, _)| {
                let allowed = self.writable(roles, field);
                if !allowed {
                    debug!(field = %field, "Dropping non-writable attribute");
                }
                allowed
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> FieldAcl {
        FieldAcl::new()
            .field("name", &[Role::Owner, Role::Administrator], &[Role::Owner])
            .field("token", &[], &[])
    }

    #[test]
    fn test_missing_field_is_private() {
        let acl = sample();
        assert!(!acl.can_read(&Role::Administrator, "unknown"));
        assert!(!acl.can_write(&Role::Administrator, "unknown"));
    }

    #[test]
    fn test_empty_rule_is_private() {
        let acl = sample();
        let roles = CallerRoles::from_roles([Role::Owner, Role::Administrator, Role::Other]);
        assert!(!acl.readable(&roles, "token"));
        assert!(!acl.writable(&roles, "token"));
    }

    #[test]
    fn test_filter_output_and_input() {
        let acl = sample();
        let owner = CallerRoles::from_roles([Role::Owner, Role::Other]);
        let admin = CallerRoles::from_roles([Role::Administrator, Role::Other]);

        let attributes = json!({"name": "alice", "token": "x", "extra": 1});
        let Value::Object(attributes) = attributes else {
            unreachable!()
        };

        let out = acl.filter_output(&admin, attributes.clone());
        assert_eq!(out.len(), 1);
        assert!(out.contains_key("name"));

        let input = acl.filter_input(&admin, attributes.clone());
        assert!(input.is_empty());

        let input = acl.filter_input(&owner, attributes);
        assert_eq!(input.get("name"), Some(&json!("alice")));
        assert_eq!(input.len(), 1);
    }
}
