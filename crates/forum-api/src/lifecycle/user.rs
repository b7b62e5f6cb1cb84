//! 사용자 라이프사이클.

use async_trait::async_trait;
use chrono::Utc;
use forum_core::{ForumError, ForumResult, User, RESEND_KEY_ACTION};
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::{HookContext, Lifecycle};

#[async_trait]
impl Lifecycle for User {
    fn create(attributes: Map<String, Value>) -> ForumResult<Self> {
        User::from_attributes(attributes)
    }

    fn apply(&mut self, attributes: Map<String, Value>) -> ForumResult<()> {
        User::apply(self, attributes)
    }

    /// 이름/이메일 중복을 거부하고, 비밀 값을 생성해 확인 메일을 보냅니다.
    async fn on_create(&mut self, ctx: &HookContext<'_, Self>) -> ForumResult<()> {
        if ctx
            .store
            .find_one(&[("username", self.username.as_str())])
            .await?
            .is_some()
        {
            return Err(ForumError::Conflict(format!(
                "Username {} already exists.",
                self.username
            )));
        }

        if ctx
            .store
            .find_one(&[("email", self.email.as_str())])
            .await?
            .is_some()
        {
            return Err(ForumError::Conflict(format!(
                "Email {} already taken.",
                self.email
            )));
        }

        let secret = self.rotate_secret().to_string();
        ctx.mailer.send_confirmation(&self.email, &secret).await?;

        info!(user_id = %self.id, "User registered");
        Ok(())
    }

    /// 이름/이메일 충돌 검사, 이메일 변경 시 비밀 값 교체, 확인 메일 재발송.
    async fn on_update(
        &mut self,
        ctx: &HookContext<'_, Self>,
        attributes: &mut Map<String, Value>,
    ) -> ForumResult<()> {
        if let Some(username) = attributes.get("username").and_then(Value::as_str) {
            let holder = ctx.store.find_one(&[("username", username)]).await?;
            if holder.is_some_and(|u| u.id != self.id) {
                return Err(ForumError::Conflict(format!(
                    "Username {} already taken.",
                    username
                )));
            }
        }

        let new_email = attributes
            .get("email")
            .and_then(Value::as_str)
            .map(str::to_string);

        if let Some(email) = &new_email {
            let holder = ctx.store.find_one(&[("email", email.as_str())]).await?;
            if holder.is_some_and(|u| u.id != self.id) {
                return Err(ForumError::Conflict(format!("Email {} already taken.", email)));
            }

            if *email != self.email {
                let secret = self.rotate_secret().to_string();
                ctx.mailer.send_confirmation(email, &secret).await?;
                info!(
                    user_id = %self.id,
                    updated_by = ?ctx.caller.id,
                    "Email changed, confirmation secret rotated"
                );
            }
        }

        if attributes.get("key").and_then(Value::as_str) == Some(RESEND_KEY_ACTION) {
            // 저장된 키를 유지
            attributes.remove("key");

            let secret = self.secret.clone().ok_or_else(|| {
                ForumError::Validation("No confirmation secret to resend.".to_string())
            })?;
            let recipient = new_email.as_deref().unwrap_or(&self.email);
            ctx.mailer.send_confirmation(recipient, &secret).await?;
            debug!(user_id = %self.id, "Confirmation email re-sent");
        }

        self.updated = Utc::now();
        Ok(())
    }
}
