//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! `Arc<AppState>`로 래핑되어 라우터 상태로 주입됩니다.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use forum_core::{Discussion, ForumResult, User};
use forum_notification::ConfirmationMailer;
use sqlx::PgPool;

use crate::auth::TokenIssuer;
use crate::repository::{
    run_migrations, DiscussionStore, MemoryStore, PgDocumentStore, UserStore,
};

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 사용자 저장소
    pub users: Arc<UserStore>,

    /// 토론 저장소
    pub discussions: Arc<DiscussionStore>,

    /// 토큰 발급기
    pub tokens: Arc<TokenIssuer>,

    /// 계정 확인 메일 발송기 (미설정 시 비활성)
    pub mailer: ConfirmationMailer,

    /// 데이터베이스 연결 풀 (PostgreSQL 저장소 사용 시)
    pub db_pool: Option<PgPool>,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: DateTime<Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 저장소를 지정하여 생성.
    pub fn new(
        users: Arc<UserStore>,
        discussions: Arc<DiscussionStore>,
        tokens: TokenIssuer,
        mailer: ConfirmationMailer,
    ) -> Self {
        Self {
            users,
            discussions,
            tokens: Arc::new(tokens),
            mailer,
            db_pool: None,
            started_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 메모리 저장소로 생성.
    ///
    /// 데이터베이스가 설정되지 않은 개발 환경과 테스트에서 사용합니다.
    pub fn in_memory(tokens: TokenIssuer, mailer: ConfirmationMailer) -> Self {
        Self::new(
            Arc::new(MemoryStore::<User>::new()),
            Arc::new(MemoryStore::<Discussion>::new()),
            tokens,
            mailer,
        )
    }

    /// PostgreSQL 저장소로 생성. 마이그레이션을 먼저 실행합니다.
    pub async fn with_postgres(
        pool: PgPool,
        tokens: TokenIssuer,
        mailer: ConfirmationMailer,
    ) -> ForumResult<Self> {
        run_migrations(&pool).await?;

        let mut state = Self::new(
            Arc::new(PgDocumentStore::<User>::new(pool.clone())),
            Arc::new(PgDocumentStore::<Discussion>::new(pool.clone())),
            tokens,
            mailer,
        );
        state.db_pool = Some(pool);
        Ok(state)
    }

    /// 서버 업타임 (초).
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    /// 저장소 연결 상태.
    pub async fn is_store_healthy(&self) -> bool {
        self.users.ping().await.is_ok() && self.discussions.ping().await.is_ok()
    }
}
