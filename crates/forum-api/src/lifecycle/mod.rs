//! 모델 라이프사이클 훅.
//!
//! 리소스 게이트와 필드 필터를 통과한 뒤, 저장 직전에 실행되어
//! 필드 ACL만으로 표현할 수 없는 불변식(유일성, 추가 전용, 확인 메일)을
//! 검사합니다. 훅이 실패하면 레코드는 저장되지 않습니다.

mod discussion;
mod user;

use async_trait::async_trait;
use forum_core::{Caller, ForumResult, Model};
use forum_notification::ConfirmationMailer;
use serde_json::{Map, Value};

use crate::repository::DocumentStore;

/// 훅 실행 컨텍스트.
pub struct HookContext<'a, M: Model> {
    /// 요청 호출자
    pub caller: &'a Caller,
    /// 같은 모델의 저장소 (유일성 사전 검사용)
    pub store: &'a dyn DocumentStore<M>,
    /// 확인 메일 발송기
    pub mailer: &'a ConfirmationMailer,
}

/// 모델별 생성/수정 절차.
#[async_trait]
pub trait Lifecycle: Model + Sized {
    /// 쓰기 허용된 입력 속성으로 새 레코드를 만듭니다.
    fn create(attributes: Map<String, Value>) -> ForumResult<Self>;

    /// 쓰기 허용된 입력 속성을 레코드에 적용합니다.
    fn apply(&mut self, attributes: Map<String, Value>) -> ForumResult<()>;

    /// 생성 훅.
    async fn on_create(&mut self, _ctx: &HookContext<'_, Self>) -> ForumResult<()> {
        Ok(())
    }

    /// 수정 훅. `attributes`는 적용 예정인 입력이며 훅이 조정할 수 있습니다.
    async fn on_update(
        &mut self,
        _ctx: &HookContext<'_, Self>,
        _attributes: &mut Map<String, Value>,
    ) -> ForumResult<()> {
        Ok(())
    }
}
