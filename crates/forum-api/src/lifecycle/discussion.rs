//! 토론 라이프사이클.

use async_trait::async_trait;
use forum_core::diff::{is_append_only, DeltaKind};
use forum_core::{Discussion, ForumError, ForumResult};
use serde_json::{Map, Value};
use tracing::debug;

use super::{HookContext, Lifecycle};

#[async_trait]
impl Lifecycle for Discussion {
    fn create(attributes: Map<String, Value>) -> ForumResult<Self> {
        Discussion::from_attributes(attributes)
    }

    fn apply(&mut self, attributes: Map<String, Value>) -> ForumResult<()> {
        *self = self.propose(attributes)?;
        Ok(())
    }

    /// 저장 상태 대비 추가 외의 변경이 있으면 거부합니다.
    async fn on_update(
        &mut self,
        _ctx: &HookContext<'_, Self>,
        attributes: &mut Map<String, Value>,
    ) -> ForumResult<()> {
        let proposed = self.propose(attributes.clone())?;
        let changes = self.changes(&proposed)?;

        if !is_append_only(&changes) {
            let rejected: Vec<String> = changes
                .iter()
                .filter(|d| d.kind != DeltaKind::Add)
                .map(|d| d.dotted_path())
                .collect();
            debug!(discussion_id = %self.id, ?rejected, "Non-additive discussion update");
            return Err(ForumError::Validation(
                "You may only add to this model.".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;
    use forum_core::Caller;
    use forum_notification::ConfirmationMailer;
    use serde_json::json;

    fn attrs(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn stored() -> Discussion {
        Discussion::create(attrs(json!({
            "thread": {
                "topic": "Borrowing",
                "description": "Lifetimes",
                "created": "2024-01-01T00:00:00Z"
            },
            "comments": [
                {"user": "alice", "text": "first", "created": "2024-01-01T00:00:00Z"}
            ],
            "users": ["alice"]
        })))
        .unwrap()
    }

    async fn run_update(record: &mut Discussion, input: Value) -> ForumResult<()> {
        let store = MemoryStore::<Discussion>::new();
        let mailer = ConfirmationMailer::disabled();
        let caller = Caller::anonymous();
        let ctx = HookContext {
            caller: &caller,
            store: &store,
            mailer: &mailer,
        };
        let mut input = attrs(input);
        record.on_update(&ctx, &mut input).await?;
        record.apply(input)
    }

    #[tokio::test]
    async fn test_append_comment_accepted() {
        let mut discussion = stored();
        run_update(
            &mut discussion,
            json!({
                "comments": [
                    {"user": "alice", "text": "first", "created": "2024-01-01T00:00:00Z"},
                    {"user": "bob", "text": "second"}
                ],
                "users": ["alice", "bob"]
            }),
        )
        .await
        .unwrap();

        assert_eq!(discussion.comments.len(), 2);
        assert_eq!(discussion.users, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_edit_comment_rejected() {
        let mut discussion = stored();
        let before = discussion.clone();
        let err = run_update(
            &mut discussion,
            json!({
                "comments": [
                    {"user": "alice", "text": "rewritten", "created": "2024-01-01T00:00:00Z"}
                ]
            }),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ForumError::Validation(_)));
        assert_eq!(err.to_string(), "You may only add to this model.");
        assert_eq!(discussion, before);
    }

    #[tokio::test]
    async fn test_remove_comment_rejected() {
        let mut discussion = stored();
        let err = run_update(&mut discussion, json!({"comments": []}))
            .await
            .unwrap_err();
        assert!(matches!(err, ForumError::Validation(_)));
    }

    #[tokio::test]
    async fn test_reorder_rejected() {
        let mut discussion = stored();
        run_update(
            &mut discussion,
            json!({
                "comments": [
                    {"user": "alice", "text": "first", "created": "2024-01-01T00:00:00Z"},
                    {"user": "bob", "text": "second", "created": "2024-01-02T00:00:00Z"}
                ]
            }),
        )
        .await
        .unwrap();

        let err = run_update(
            &mut discussion,
            json!({
                "comments": [
                    {"user": "bob", "text": "second", "created": "2024-01-02T00:00:00Z"},
                    {"user": "alice", "text": "first", "created": "2024-01-01T00:00:00Z"}
                ]
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ForumError::Validation(_)));
    }

    #[tokio::test]
    async fn test_empty_update_is_noop() {
        let mut discussion = stored();
        let before = discussion.clone();
        run_update(&mut discussion, json!({})).await.unwrap();
        assert_eq!(discussion, before);
    }
}
