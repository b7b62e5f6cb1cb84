//! 도메인 모델.
//!
//! - [`User`]: 사용자 계정
//! - [`Discussion`]: 추가 전용 공개 토론 (내장 [`Thread`], [`Comment`])
//!
//! 모든 모델은 [`Model`] trait을 구현하여 리소스/필드 ACL 테이블과
//! 직렬화된 속성 문서를 노출합니다.

mod discussion;
mod user;

pub use discussion::{Comment, Discussion, Thread};
pub use user::{User, DEFAULT_GROUP, RESEND_KEY_ACTION};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::acl::{FieldAcl, ResourceAcl};
use crate::error::{ForumError, ForumResult};

/// 저장소가 소유하는 문서 모델.
pub trait Model: Serialize + DeserializeOwned + Send + Sync {
    /// 리소스 타입 이름 (URL 경로 및 응답 `type`)
    const RESOURCE: &'static str;

    /// 저장소에서 유일해야 하는 최상위 문자열 필드.
    const UNIQUE_FIELDS: &'static [&'static str] = &[];

    /// 레코드 ID.
    fn id(&self) -> Uuid;

    /// `self` 역할 판정에 사용되는 소유자 ID.
    fn owner(&self) -> Option<Uuid> {
        None
    }

    /// 리소스 ACL 테이블.
    fn resource_acl() -> &'static ResourceAcl;

    /// 필드 ACL 테이블.
    fn field_acl() -> &'static FieldAcl;

    /// 내부 식별자를 제외한 직렬화 속성.
    fn attributes(&self) -> ForumResult<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(mut map) => {
                map.remove("id");
                Ok(map)
            }
            other => Err(ForumError::Serialization(format!(
                "{} serialized to a non-object value: {}",
                Self::RESOURCE,
                other
            ))),
        }
    }
}
