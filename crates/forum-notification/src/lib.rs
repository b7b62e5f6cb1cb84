//! # Forum Notification
//!
//! 계정 확인 메일 발송 채널.
//!
//! Mailgun 호환 HTTP API를 사용하며, 설정이 없으면 발송을 건너뜁니다.

pub mod confirmation;
pub mod mailgun;
pub mod types;

pub use confirmation::{ConfirmationMailer, CONFIRMATION_SUBJECT};
pub use mailgun::{MailgunConfig, MailgunSender, DEFAULT_ENV_PREFIX, DEFAULT_SENDER};
pub use types::*;
