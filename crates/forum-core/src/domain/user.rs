//! 사용자 모델.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::Model;
use crate::acl::{FieldAcl, Operation, ResourceAcl, Role};
use crate::credential::{hash_password, validate_password, verify_confirmation_key};
use crate::error::{ForumError, ForumResult};

/// 신규 사용자의 기본 그룹.
pub const DEFAULT_GROUP: &str = "users";

/// 기존 비밀 값으로 확인 메일을 다시 보내라는 `key` 값.
pub const RESEND_KEY_ACTION: &str = "$action-resend-key";

static RESOURCE_ACL: LazyLock<ResourceAcl> = LazyLock::new(|| {
    ResourceAcl::new()
        .grant(
            Role::Owner,
            &[
                Operation::Read,
                Operation::Update,
                Operation::Delete,
                Operation::Subscribe,
                Operation::Acquire,
            ],
        )
        .grant(Role::Administrator, &[Operation::All])
        .grant(Role::Other, &[Operation::Read, Operation::Subscribe])
        .grant(Role::Unauthorized, &[Operation::Create])
});

static FIELD_ACL: LazyLock<FieldAcl> = LazyLock::new(|| {
    use Role::{Administrator, Owner, Unauthorized};

    FieldAcl::new()
        .field("username", &[Owner, Administrator], &[Owner, Administrator, Unauthorized])
        .field("password", &[], &[Owner, Administrator, Unauthorized])
        .field("groups", &[Administrator], &[Administrator])
        .field("email", &[Owner, Administrator], &[Owner, Administrator, Unauthorized])
        .field("secret", &[], &[])
        .field("key", &[Owner], &[Owner])
        .field("created", &[Owner, Administrator], &[])
        .field("login", &[Owner, Administrator], &[])
});

fn default_groups() -> Vec<String> {
    vec![DEFAULT_GROUP.to_string()]
}

/// 사용자 계정.
///
/// `password`는 항상 해시된 형태로 저장되며, `secret`은 서버가 생성하는
/// 불투명 토큰으로 어떤 역할에도 노출되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default = "default_groups")]
    pub groups: Vec<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<DateTime<Utc>>,
}

impl User {
    /// 입력 속성으로 새 사용자 생성.
    ///
    /// `username`, `password`, `email`은 필수입니다.
    pub fn from_attributes(attributes: Map<String, Value>) -> ForumResult<Self> {
        for field in ["username", "password", "email"] {
            if !attributes.contains_key(field) {
                return Err(ForumError::Validation(format!("Field {field} is required.")));
            }
        }

        let now = Utc::now();
        let mut user = Self {
            id: Uuid::new_v4(),
            username: String::new(),
            password: String::new(),
            email: String::new(),
            secret: None,
            key: None,
            groups: default_groups(),
            created: now,
            updated: now,
            login: None,
        };
        user.apply(attributes)?;
        Ok(user)
    }

    /// 쓰기 허용된 속성을 레코드에 적용.
    ///
    /// 비밀번호는 검증 후 해싱되고, `key`는 현재 비밀 값과 대조됩니다.
    pub fn apply(&mut self, attributes: Map<String, Value>) -> ForumResult<()> {
        for (field, value) in attributes {
            match field.as_str() {
                "username" => self.username = required_string(&field, value)?,
                "email" => self.email = required_string(&field, value)?,
                "password" => {
                    let password = required_string(&field, value)?;
                    validate_password(&password)?;
                    self.password = hash_password(&password)?;
                }
                "groups" => {
                    let groups: Vec<String> = serde_json::from_value(value).map_err(|_| {
                        ForumError::Validation("Field groups must be a list of strings.".to_string())
                    })?;
                    self.groups = if groups.is_empty() {
                        default_groups()
                    } else {
                        groups
                    };
                }
                "key" => self.set_key(value)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn set_key(&mut self, value: Value) -> ForumResult<()> {
        let key = match value {
            Value::Null => None,
            Value::String(key) => {
                verify_confirmation_key(self.secret.as_deref(), &key)?;
                if key.is_empty() || key == "None" {
                    None
                } else {
                    Some(key)
                }
            }
            _ => {
                return Err(ForumError::Validation(
                    "Field key must be a string.".to_string(),
                ))
            }
        };
        self.key = key;
        Ok(())
    }

    /// 새 비밀 값을 생성하고 확인 키를 비웁니다.
    pub fn rotate_secret(&mut self) -> &str {
        self.key = None;
        self.secret.insert(Uuid::new_v4().to_string())
    }

    /// 확인 키가 현재 비밀 값과 일치하는지 여부.
    pub fn is_confirmed(&self) -> bool {
        match (&self.secret, &self.key) {
            (Some(secret), Some(key)) => verify_confirmation_key(Some(secret), key).is_ok(),
            _ => false,
        }
    }
}

fn required_string(field: &str, value: Value) -> ForumResult<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(ForumError::Validation(format!(
            "Field {field} must be a non-empty string."
        ))),
    }
}

impl Model for User {
    const RESOURCE: &'static str = "users";
    const UNIQUE_FIELDS: &'static [&'static str] = &["username", "email"];

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        Some(self.id)
    }

    fn resource_acl() -> &'static ResourceAcl {
        &RESOURCE_ACL
    }

    fn field_acl() -> &'static FieldAcl {
        &FIELD_ACL
    }
}
