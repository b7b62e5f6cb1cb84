//! 역할 및 호출자 역할 집합.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ACL 테이블에 등장하는 역할.
///
/// 고정된 역할 집합과 그룹 멤버십을 나타내는 `#그룹` 형식으로 구성됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    /// 관리자 그룹 소속
    Administrator,
    /// 일반 사용자 그룹 소속
    User,
    /// 인증된 주체가 레코드 소유자와 같음 (`self`)
    Owner,
    /// 모든 호출자에게 적용되는 기본 역할
    Other,
    /// 유효한 토큰 없이 호출
    Unauthorized,
    /// 호출자의 그룹 목록에 해당 그룹이 포함됨 (`#그룹`)
    Group(String),
}

impl Role {
    /// 문자열에서 역할 파싱.
    pub fn parse(s: &str) -> Option<Self> {
        if let Some(group) = s.strip_prefix('#') {
            if group.is_empty() {
                return None;
            }
            return Some(Role::Group(group.to_string()));
        }

        match s {
            "administrator" => Some(Role::Administrator),
            "user" => Some(Role::User),
            "self" => Some(Role::Owner),
            "other" => Some(Role::Other),
            "unauthorized" => Some(Role::Unauthorized),
            _ => None,
        }
    }

    /// 그룹 이름이 부여하는 선언 역할.
    fn declared_by_group(group: &str) -> Option<Self> {
        match group {
            "administrator" => Some(Role::Administrator),
            "user" | "users" => Some(Role::User),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Administrator => write!(f, "administrator"),
            Role::User => write!(f, "user"),
            Role::Owner => write!(f, "self"),
            Role::Other => write!(f, "other"),
            Role::Unauthorized => write!(f, "unauthorized"),
            Role::Group(group) => write!(f, "#{}", group),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Role::parse(&value).ok_or_else(|| format!("Unknown role: {}", value))
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.to_string()
    }
}

/// 토큰에서 복원한 호출자 신원.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    /// 인증된 주체 ID (익명이면 None)
    pub id: Option<Uuid>,
    /// 토큰에 담긴 그룹 목록
    pub groups: Vec<String>,
}

impl Caller {
    /// 익명 호출자.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// 인증된 호출자.
    pub fn authenticated(id: Uuid, groups: Vec<String>) -> Self {
        Self {
            id: Some(id),
            groups,
        }
    }

    /// 익명 여부.
    pub fn is_anonymous(&self) -> bool {
        self.id.is_none()
    }

    /// 레코드 소유자 기준으로 적용 가능한 역할 집합 계산.
    ///
    /// 선언 역할, 소유자이면 `self`, 항상 `other`, 익명이면 `unauthorized`.
    pub fn roles_for(&self, owner: Option<Uuid>) -> CallerRoles {
        let mut roles = HashSet::new();
        roles.insert(Role::Other);

        match self.id {
            Some(id) => {
                for group in &self.groups {
                    if let Some(role) = Role::declared_by_group(group) {
                        roles.insert(role);
                    }
                    roles.insert(Role::Group(group.clone()));
                }
                if owner == Some(id) {
                    roles.insert(Role::Owner);
                }
            }
            None => {
                roles.insert(Role::Unauthorized);
            }
        }

        CallerRoles(roles)
    }
}

/// 호출자에게 적용되는 역할 집합.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerRoles(HashSet<Role>);

impl CallerRoles {
    /// 명시적인 역할 목록으로 생성.
    pub fn from_roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self(roles.into_iter().collect())
    }

    /// 역할 포함 여부.
    pub fn contains(&self, role: &Role) -> bool {
        self.0.contains(role)
    }

    /// 역할 순회.
    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.0.iter()
    }

    /// 주어진 역할 목록과 교집합이 있는지 확인.
    pub fn intersects(&self, permitted: &[Role]) -> bool {
        permitted.iter().any(|role| self.0.contains(role))
    }
}
