//! 알림 타입 및 trait 정의.

use async_trait::async_trait;
use forum_core::ForumError;
use serde::{Deserialize, Serialize};

/// 발송할 이메일 메시지.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    /// 발신자 (`이름 <주소>` 형식 허용)
    pub from: String,
    /// 수신자 목록
    pub to: Vec<String>,
    /// 제목
    pub subject: String,
    /// 본문 (일반 텍스트)
    pub text: String,
}

impl EmailMessage {
    /// 단일 수신자 메시지를 생성합니다.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: vec![to.into()],
            subject: subject.into(),
            text: text.into(),
        }
    }
}

/// 알림 작업용 Result 타입.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// 알림 에러.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Failed to send confirmation email: {0}")]
    SendFailed(String),

    #[error("Invalid email address.")]
    InvalidAddress,

    #[error("네트워크 에러: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("직렬화 에러: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<NotificationError> for ForumError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::InvalidAddress => ForumError::Validation(err.to_string()),
            other => ForumError::Dependency(other.to_string()),
        }
    }
}

/// 알림 전송기 trait.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// 메시지를 전송합니다.
    async fn send(&self, message: &EmailMessage) -> NotificationResult<()>;

    /// 전송기 이름을 반환합니다.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        let err: ForumError = NotificationError::InvalidAddress.into();
        assert!(matches!(err, ForumError::Validation(_)));

        let err: ForumError = NotificationError::SendFailed("Forbidden".to_string()).into();
        assert!(matches!(err, ForumError::Dependency(_)));
        assert_eq!(
            err.to_string(),
            "Failed to send confirmation email: Forbidden"
        );
    }
}
