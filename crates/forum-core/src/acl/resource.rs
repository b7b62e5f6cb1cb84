//! 리소스 단위 접근 제어.
//!
//! 역할 → 허용 작업 테이블로 작업 수행 여부를 판단합니다.
//! 필드 단위 검사나 라이프사이클 훅보다 먼저 평가됩니다.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::role::{CallerRoles, Role};
use crate::error::{ForumError, ForumResult};

/// 리소스 작업.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Read,
    ReadAll,
    Update,
    Delete,
    Subscribe,
    Acquire,
    /// 모든 작업의 약칭
    All,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::ReadAll => "read_all",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Subscribe => "subscribe",
            Operation::Acquire => "acquire",
            Operation::All => "all",
        };
        write!(f, "{}", s)
    }
}

/// 리소스 ACL 테이블.
#[derive(Debug, Clone, Default)]
pub struct ResourceAcl {
    entries: Vec<(Role, Vec<Operation>)>,
}

impl ResourceAcl {
    /// 빈 테이블 생성 (아무것도 허용하지 않음).
    pub fn new() -> Self {
        Self::default()
    }

    /// 역할에 작업 목록을 부여합니다.
    pub fn grant(mut self, role: Role, operations: &[Operation]) -> Self {
        self.entries.push((role, operations.to_vec()));
        self
    }

    /// 단일 역할이 작업을 허용받았는지 확인.
    pub fn permits(&self, role: &Role, operation: Operation) -> bool {
        self.entries
            .iter()
            .filter(|(granted, _)| granted == role)
            .any(|(_, operations)| {
                operations
                    .iter()
                    .any(|op| *op == Operation::All || *op == operation)
            })
    }

    /// 역할 집합 중 하나라도 작업을 허용받았는지 확인.
    pub fn allows(&self, roles: &CallerRoles, operation: Operation) -> bool {
        roles.iter().any(|role| self.permits(role, operation))
    }

    /// 작업 권한 검사.
    ///
    /// 거부되면 `Authorization` 에러로 전체 작업이 실패합니다.
    pub fn authorize(&self, roles: &CallerRoles, operation: Operation) -> ForumResult<()> {
        if self.allows(roles, operation) {
            Ok(())
        } else {
            debug!(%operation, "Resource ACL denied operation");
            Err(ForumError::Authorization(format!(
                "You are not permitted to {} this resource.",
                operation
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResourceAcl {
        ResourceAcl::new()
            .grant(Role::Administrator, &[Operation::All])
            .grant(Role::Other, &[Operation::Read])
            .grant(Role::Unauthorized, &[Operation::Create])
            .grant(Role::Group("users".to_string()), &[Operation::Update])
    }

    #[test]
    fn test_all_expands() {
        let acl = sample();
        assert!(acl.permits(&Role::Administrator, Operation::Delete));
        assert!(acl.permits(&Role::Administrator, Operation::Acquire));
    }

    #[test]
    fn test_unauthorized_create_only() {
        let acl = sample();
        let roles = CallerRoles::from_roles([Role::Unauthorized]);
        assert!(acl.authorize(&roles, Operation::Create).is_ok());
        assert!(matches!(
            acl.authorize(&roles, Operation::Update),
            Err(ForumError::Authorization(_))
        ));
    }

    #[test]
    fn test_group_grant() {
        let acl = sample();
        let member = CallerRoles::from_roles([Role::Other, Role::Group("users".to_string())]);
        let outsider = CallerRoles::from_roles([Role::Other, Role::Group("guests".to_string())]);

        assert!(acl.allows(&member, Operation::Update));
        assert!(!acl.allows(&outsider, Operation::Update));
    }

    #[test]
    fn test_empty_acl_denies() {
        let acl = ResourceAcl::new();
        let roles = CallerRoles::from_roles([Role::Administrator]);
        assert!(acl.authorize(&roles, Operation::Read).is_err());
    }

    #[test]
    fn test_operation_serialization() {
        let json = serde_json::to_string(&Operation::ReadAll).unwrap();
        assert_eq!(json, "\"read_all\"");
    }
}
