//! Mailgun 호환 트랜잭션 이메일 전송기.
//!
//! `{url}/messages`에 form 데이터로 POST하며, `api` 사용자와 API 키로
//! Basic 인증합니다. 응답의 `message` 값이 정확히 일치할 때만 성공입니다.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::types::{EmailMessage, NotificationError, NotificationResult, NotificationSender};

/// 발송 성공을 나타내는 응답 메시지.
pub const QUEUED_MESSAGE: &str = "Queued. Thank you.";

/// 잘못된 수신 주소를 나타내는 응답 메시지.
pub const INVALID_ADDRESS_MESSAGE: &str =
    "'to' parameter is not a valid address. please check documentation";

/// 기본 발신자.
pub const DEFAULT_SENDER: &str = "Forum Server <forum@server.com>";

/// 기본 환경 변수 접두사.
pub const DEFAULT_ENV_PREFIX: &str = "FORUM_MAILGUN";

/// Mailgun 전송 설정.
#[derive(Debug, Clone)]
pub struct MailgunConfig {
    /// API 기본 URL (예: `https://api.mailgun.net/v3/example.com`)
    pub url: String,
    /// API 키
    pub api_key: String,
    /// 발신자
    pub from: String,
}

impl MailgunConfig {
    /// 새 설정을 생성합니다.
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            from: DEFAULT_SENDER.to_string(),
        }
    }

    /// 발신자를 설정합니다.
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = from.into();
        self
    }

    /// 환경 변수에서 설정을 생성합니다.
    ///
    /// `{prefix}_URL`, `{prefix}_API_KEY`가 모두 있어야 하며,
    /// `{prefix}_FROM`은 선택입니다.
    pub fn from_env(prefix: &str) -> Option<Self> {
        let url = non_empty_var(&format!("{prefix}_URL"))?;
        let api_key = non_empty_var(&format!("{prefix}_API_KEY"))?;
        let from = non_empty_var(&format!("{prefix}_FROM"))
            .unwrap_or_else(|| DEFAULT_SENDER.to_string());

        Some(Self { url, api_key, from })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[derive(Debug, Deserialize)]
struct MailgunResponse {
    #[serde(default)]
    message: String,
}

/// Mailgun 전송기.
pub struct MailgunSender {
    config: MailgunConfig,
    client: reqwest::Client,
}

impl MailgunSender {
    /// 새 전송기를 생성합니다.
    pub fn new(config: MailgunConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// 환경 변수에서 전송기를 생성합니다.
    pub fn from_env(prefix: &str) -> Option<Self> {
        MailgunConfig::from_env(prefix).map(Self::new)
    }

    /// 설정된 발신자.
    pub fn sender(&self) -> &str {
        &self.config.from
    }

    fn messages_url(&self) -> String {
        format!("{}/messages", self.config.url.trim_end_matches('/'))
    }
}

#[async_trait]
impl NotificationSender for MailgunSender {
    async fn send(&self, message: &EmailMessage) -> NotificationResult<()> {
        let mut form: Vec<(&str, &str)> = vec![("from", message.from.as_str())];
        form.extend(message.to.iter().map(|to| ("to", to.as_str())));
        form.push(("subject", message.subject.as_str()));
        form.push(("text", message.text.as_str()));

        debug!(recipients = message.to.len(), "Sending email via Mailgun");

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth("api", Some(&self.config.api_key))
            .form(&form)
            .send()
            .await?;

        let body: MailgunResponse = response.json().await?;

        match body.message.as_str() {
            QUEUED_MESSAGE => {
                info!("Confirmation email queued");
                Ok(())
            }
            INVALID_ADDRESS_MESSAGE => Err(NotificationError::InvalidAddress),
            other => {
                error!(message = %other, "Mailgun rejected email");
                Err(NotificationError::SendFailed(other.to_string()))
            }
        }
    }

    fn name(&self) -> &str {
        "mailgun"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> EmailMessage {
        EmailMessage::new(DEFAULT_SENDER, "alice@example.com", "Account Confirmation", "abc")
    }

    #[tokio::test]
    async fn test_queued_is_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/messages")
            .match_header("authorization", mockito::Matcher::Regex("^Basic ".to_string()))
            .match_body(mockito::Matcher::UrlEncoded(
                "to".to_string(),
                "alice@example.com".to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"<1@example.com>","message":"Queued. Thank you."}"#)
            .create_async()
            .await;

        let sender = MailgunSender::new(MailgunConfig::new(server.url(), "key-123"));
        sender.send(&message()).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_address() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/messages")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(format!(r#"{{"message":"{}"}}"#, INVALID_ADDRESS_MESSAGE))
            .create_async()
            .await;

        let sender = MailgunSender::new(MailgunConfig::new(server.url(), "key-123"));
        let result = sender.send(&message()).await;
        assert!(matches!(result, Err(NotificationError::InvalidAddress)));
    }

    #[tokio::test]
    async fn test_other_message_is_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/messages")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"Forbidden"}"#)
            .create_async()
            .await;

        let sender = MailgunSender::new(MailgunConfig::new(server.url(), "bad-key"));
        match sender.send(&message()).await {
            Err(NotificationError::SendFailed(msg)) => assert_eq!(msg, "Forbidden"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_messages_url_trims_slash() {
        let sender = MailgunSender::new(MailgunConfig::new("https://api.example.com/v3/", "k"));
        assert_eq!(sender.messages_url(), "https://api.example.com/v3/messages");
    }
}
