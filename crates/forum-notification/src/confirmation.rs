//! 계정 확인 메일 발송.

use std::sync::Arc;

use forum_core::credential::confirmation_key;
use tracing::{info, warn};

use crate::mailgun::{MailgunSender, DEFAULT_SENDER};
use crate::types::{EmailMessage, NotificationResult, NotificationSender};

/// 확인 메일 제목.
pub const CONFIRMATION_SUBJECT: &str = "Account Confirmation";

/// 계정 확인 메일 발송기.
///
/// 전송기가 설정되지 않았으면 경고만 남기고 발송을 건너뜁니다.
#[derive(Clone)]
pub struct ConfirmationMailer {
    sender: Option<Arc<dyn NotificationSender>>,
    from: String,
}

impl ConfirmationMailer {
    /// 주어진 전송기로 생성합니다.
    pub fn new(sender: Arc<dyn NotificationSender>) -> Self {
        Self {
            sender: Some(sender),
            from: DEFAULT_SENDER.to_string(),
        }
    }

    /// 발송을 하지 않는 메일러.
    pub fn disabled() -> Self {
        Self {
            sender: None,
            from: DEFAULT_SENDER.to_string(),
        }
    }

    /// 환경 변수에서 Mailgun 전송기를 구성합니다.
    pub fn from_env(prefix: &str) -> Self {
        match MailgunSender::from_env(prefix) {
            Some(sender) => {
                let from = sender.sender().to_string();
                Self::new(Arc::new(sender)).with_from(from)
            }
            None => {
                warn!("Mailgun not configured ({prefix}_URL / {prefix}_API_KEY), confirmation emails disabled");
                Self::disabled()
            }
        }
    }

    /// 발신자를 설정합니다.
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = from.into();
        self
    }

    /// 전송기 설정 여부.
    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// 확인 메일을 발송합니다. 본문은 비밀 값에서 유도한 확인 키입니다.
    pub async fn send_confirmation(&self, email: &str, secret: &str) -> NotificationResult<()> {
        let Some(sender) = &self.sender else {
            warn!(email = %email, "Confirmation email skipped: no mail sender configured");
            return Ok(());
        };

        let message = EmailMessage::new(
            self.from.clone(),
            email,
            CONFIRMATION_SUBJECT,
            confirmation_key(secret),
        );

        sender.send(&message).await?;
        info!(email = %email, sender = sender.name(), "Confirmation email sent");
        Ok(())
    }
}

impl std::fmt::Debug for ConfirmationMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationMailer")
            .field("sender", &self.sender.as_ref().map(|s| s.name().to_string()))
            .field("from", &self.from)
            .finish()
    }
}
