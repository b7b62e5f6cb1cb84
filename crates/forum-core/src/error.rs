//! 포럼 서버의 에러 타입.
//!
//! 이 모듈은 도메인 전반에서 사용되는 에러 분류를 정의합니다.
//! 모든 에러는 사람이 읽을 수 있는 메시지를 포함하며, 내부적으로 재시도하지 않습니다.

use thiserror::Error;

/// 핵심 도메인 에러.
#[derive(Debug, Error)]
pub enum ForumError {
    /// 잘못되었거나 불충분한 입력 (짧은 비밀번호, 추가 전용 위반 등)
    #[error("{0}")]
    Validation(String),

    /// 해싱할 수 없는 자격증명 (마커만 있는 비밀번호 등)
    #[error("{0}")]
    InvalidCredential(String),

    /// 인증 실패 (잘못된 자격증명, 토큰 없음/무효, 삭제된 주체)
    #[error("{0}")]
    Authentication(String),

    /// 권한 부족 (역할이 작업/필드를 허용받지 못함)
    #[error("{0}")]
    Authorization(String),

    /// 유일성 위반
    #[error("{0}")]
    Conflict(String),

    /// 외부 의존성(알림 채널) 실패
    #[error("{0}")]
    Dependency(String),

    /// 찾을 수 없음
    #[error("{0}")]
    NotFound(String),

    /// 저장소 에러
    #[error("저장소 에러: {0}")]
    Storage(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 도메인 작업을 위한 Result 타입.
pub type ForumResult<T> = Result<T, ForumError>;

impl ForumError {
    /// 안정적인 에러 코드를 반환합니다.
    pub fn code(&self) -> &'static str {
        match self {
            ForumError::Validation(_) => "VALIDATION_ERROR",
            ForumError::InvalidCredential(_) => "INVALID_CREDENTIAL",
            ForumError::Authentication(_) => "AUTHENTICATION_ERROR",
            ForumError::Authorization(_) => "AUTHORIZATION_ERROR",
            ForumError::Conflict(_) => "CONFLICT_ERROR",
            ForumError::Dependency(_) => "DEPENDENCY_ERROR",
            ForumError::NotFound(_) => "NOT_FOUND",
            ForumError::Storage(_) => "STORAGE_ERROR",
            ForumError::Config(_) => "CONFIG_ERROR",
            ForumError::Serialization(_) => "SERIALIZATION_ERROR",
            ForumError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 호출자의 입력으로 인해 발생한 에러인지 확인합니다.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ForumError::Validation(_)
                | ForumError::InvalidCredential(_)
                | ForumError::Authentication(_)
                | ForumError::Authorization(_)
                | ForumError::Conflict(_)
                | ForumError::NotFound(_)
        )
    }
}

impl From<serde_json::Error> for ForumError {
    fn from(err: serde_json::Error) -> Self {
        ForumError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for ForumError {
    fn from(err: config::ConfigError) -> Self {
        ForumError::Config(err.to_string())
    }
}
