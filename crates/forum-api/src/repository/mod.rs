//! 문서 저장소.
//!
//! 모델 레코드를 JSON 문서로 보관하는 영속성 포트와 두 가지 어댑터:
//!
//! - [`MemoryStore`]: 프로세스 메모리 (개발/테스트용, DB 미설정 시 기본값)
//! - [`PgDocumentStore`]: PostgreSQL JSONB 테이블
//!
//! 두 어댑터 모두 [`Model::UNIQUE_FIELDS`]에 대한 유일성을 보장하며,
//! 위반 시 `ForumError::Conflict`를 반환합니다. 애플리케이션 단의 사전
//! 검사와 경합이 생겨도 저장소의 판정이 최종입니다.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{run_migrations, PgDocumentStore};

use async_trait::async_trait;
use forum_core::{Discussion, ForumResult, Model, User};
use uuid::Uuid;

/// 동등 비교 조건 (최상위 문자열 필드 = 값).
pub type Filter<'a> = &'a [(&'a str, &'a str)];

/// 모델 문서 저장소 포트.
#[async_trait]
pub trait DocumentStore<M: Model>: Send + Sync {
    /// 새 레코드 저장. ID 또는 유일 필드가 겹치면 `Conflict`.
    async fn insert(&self, record: &M) -> ForumResult<()>;

    /// 기존 레코드 갱신. 없으면 `NotFound`, 유일 필드가 겹치면 `Conflict`.
    async fn save(&self, record: &M) -> ForumResult<()>;

    /// ID로 조회.
    async fn get(&self, id: Uuid) -> ForumResult<Option<M>>;

    /// ID 존재 여부.
    async fn exists(&self, id: Uuid) -> ForumResult<bool>;

    /// 모든 조건을 만족하는 첫 레코드.
    async fn find_one(&self, filter: Filter<'_>) -> ForumResult<Option<M>>;

    /// 전체 레코드.
    async fn list(&self) -> ForumResult<Vec<M>>;

    /// 레코드 삭제. 삭제되었으면 `true`.
    async fn delete(&self, id: Uuid) -> ForumResult<bool>;

    /// 저장소 연결 상태 확인.
    async fn ping(&self) -> ForumResult<()> {
        Ok(())
    }
}

/// 사용자 저장소.
pub type UserStore = dyn DocumentStore<User>;

/// 토론 저장소.
pub type DiscussionStore = dyn DocumentStore<Discussion>;

/// 유일성 위반 메시지.
pub(crate) fn conflict_message(field: &str) -> String {
    format!("A record with this {field} already exists.")
}
