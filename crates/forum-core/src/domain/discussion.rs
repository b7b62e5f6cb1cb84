//! 토론 모델.
//!
//! 토론은 하나의 스레드, 댓글 목록, 참여자 목록으로 구성됩니다.
//! 수정은 추가만 허용되는 공개 로그로 취급됩니다.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::Model;
use crate::acl::{FieldAcl, Operation, ResourceAcl, Role};
use crate::diff::{diff, Delta};
use crate::error::{ForumError, ForumResult};

static RESOURCE_ACL: LazyLock<ResourceAcl> = LazyLock::new(|| {
    ResourceAcl::new()
        .grant(Role::Administrator, &[Operation::All])
        .grant(Role::User, &[Operation::ReadAll, Operation::Read])
        .grant(
            Role::Group("users".to_string()),
            &[Operation::Read, Operation::Update],
        )
        .grant(Role::Other, &[Operation::ReadAll, Operation::Read])
        .grant(Role::Unauthorized, &[Operation::ReadAll, Operation::Read])
});

static FIELD_ACL: LazyLock<FieldAcl> = LazyLock::new(|| {
    let readers = [Role::Administrator, Role::Other];
    let participants = [Role::Administrator, Role::Group("users".to_string())];

    FieldAcl::new()
        .field("thread", &readers, &[Role::Administrator])
        .field("comments", &readers, &participants)
        .field("users", &readers, &participants)
});

/// 토론 주제 (토론에 내장됨).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct Thread {
    pub topic: String,
    pub description: String,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
}

/// 댓글. 하위 댓글 목록을 가질 수 있습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct Comment {
    pub user: String,
    pub text: String,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[cfg_attr(feature = "utoipa-support", schema(no_recursion))]
    pub comments: Vec<Comment>,
}

impl Comment {
    pub fn new(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            text: text.into(),
            created: Utc::now(),
            comments: Vec::new(),
        }
    }
}

/// 토론.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct Discussion {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub thread: Thread,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub users: Vec<String>,
}

impl Discussion {
    /// 입력 속성으로 새 토론 생성. `thread`는 필수입니다.
    pub fn from_attributes(attributes: Map<String, Value>) -> ForumResult<Self> {
        serde_json::from_value(Value::Object(attributes))
            .map_err(|e| ForumError::Validation(format!("Invalid discussion: {}", e)))
    }

    /// 저장된 속성 위에 입력 속성을 덮어써 제안 상태를 만듭니다.
    ///
    /// 제안 상태는 타입 모델을 거쳐 정규화되며 ID는 유지됩니다.
    pub fn propose(&self, attributes: Map<String, Value>) -> ForumResult<Self> {
        let mut merged = self.attributes()?;
        merged.extend(attributes);

        let mut proposed = Self::from_attributes(merged)?;
        proposed.id = self.id;
        Ok(proposed)
    }

    /// 저장 상태와 제안 상태의 구조적 차이 (ID 제외).
    pub fn changes(&self, proposed: &Self) -> ForumResult<Vec<Delta>> {
        let before = Value::Object(self.attributes()?);
        let after = Value::Object(proposed.attributes()?);
        Ok(diff(&before, &after))
    }
}

impl Model for Discussion {
    const RESOURCE: &'static str = "discussions";

    fn id(&self) -> Uuid {
        self.id
    }

    fn resource_acl() -> &'static ResourceAcl {
        &RESOURCE_ACL
    }

    fn field_acl() -> &'static FieldAcl {
        &FIELD_ACL
    }
}
