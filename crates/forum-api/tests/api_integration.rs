//! HTTP 수준 통합 테스트.
//!
//! 메모리 저장소와 기록용 메일 전송기로 전체 라우터를 구성하고
//! `oneshot`으로 요청을 보냅니다.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use chrono::Duration;
use serde_json::{json, Map, Value};
use tower::ServiceExt;
use uuid::Uuid;

use forum_api::auth::{encode_token, Subject, SubjectAttributes};
use forum_api::{build_router, AppState, Claims, ResourceLimits, TokenIssuer};
use forum_core::RateLimitSettings;
use forum_notification::{
    ConfirmationMailer, EmailMessage, NotificationResult, NotificationSender, CONFIRMATION_SUBJECT,
};

const SECRET: &str = "integration-test-secret";

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<EmailMessage>>,
}

impl Outbox {
    fn messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    fn last(&self) -> EmailMessage {
        self.messages().last().cloned().expect("no email sent")
    }
}

#[async_trait]
impl NotificationSender for Outbox {
    async fn send(&self, message: &EmailMessage) -> NotificationResult<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "outbox"
    }
}

struct TestApp {
    router: Router,
    outbox: Arc<Outbox>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_limits(None)
    }

    fn with_limits(limits: Option<&ResourceLimits>) -> Self {
        let outbox = Arc::new(Outbox::default());
        let state = AppState::in_memory(
            TokenIssuer::new(SECRET, Duration::minutes(5)),
            ConfirmationMailer::new(outbox.clone()),
        );

        Self {
            router: build_router(Arc::new(state), limits),
            outbox,
        }
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, headers, value)
    }

    /// 사용자 가입 후 ID 반환.
    async fn register(&self, username: &str, email: &str) -> Uuid {
        let (status, _, body) = self
            .call(
                Method::POST,
                "/v1/users",
                None,
                Some(json!({
                    "username": username,
                    "password": "correct-horse",
                    "email": email,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body["id"].as_str().unwrap().parse().unwrap()
    }

    async fn login(&self, username: &str) -> String {
        let (status, _, body) = self
            .call(
                Method::POST,
                "/v1/authentication",
                None,
                Some(json!({"username": username, "password": "correct-horse"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }
}

fn admin_token() -> String {
    let claims = Claims::new(
        Subject {
            id: Uuid::new_v4(),
            groups: vec!["administrator".to_string()],
            scope: Map::new(),
            attributes: SubjectAttributes {
                username: "admin".to_string(),
            },
        },
        Duration::minutes(5),
    );
    encode_token(&claims, SECRET).unwrap()
}

#[tokio::test]
async fn test_register_hides_private_fields_and_sends_confirmation() {
    let app = TestApp::new();

    let (status, _, body) = app
        .call(
            Method::POST,
            "/v1/users",
            None,
            Some(json!({
                "username": "alice",
                "password": "correct-horse",
                "email": "alice@example.com",
                "groups": ["administrator"],
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["type"], "users");
    let attributes = body["attributes"].as_object().unwrap();
    assert!(!attributes.contains_key("password"));
    assert!(!attributes.contains_key("secret"));

    let sent = app.outbox.messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["alice@example.com".to_string()]);
    assert_eq!(sent[0].subject, CONFIRMATION_SUBJECT);

    // 익명 가입자는 groups를 쓸 수 없음
    let token = app.login("alice").await;
    let (status, _, body) = app
        .call(Method::PATCH, "/v1/authentication", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["claims"]["data"]["groups"], json!(["users"]));
}

#[tokio::test]
async fn test_owner_reads_own_profile() {
    let app = TestApp::new();
    let id = app.register("alice", "alice@example.com").await;
    let token = app.login("alice").await;

    let (status, _, body) = app
        .call(Method::GET, &format!("/v1/users/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attributes"]["username"], "alice");
    assert_eq!(body["attributes"]["email"], "alice@example.com");
    assert!(body["attributes"].get("password").is_none());
    assert!(body["attributes"].get("login").is_some());

    // 다른 사용자에게는 이름이 보이지 않음
    app.register("bob", "bob@example.com").await;
    let bob = app.login("bob").await;
    let (status, _, body) = app
        .call(Method::GET, &format!("/v1/users/{id}"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["attributes"].get("username").is_none());
    assert!(body["attributes"].get("email").is_none());
}

#[tokio::test]
async fn test_token_issue_and_refresh() {
    let app = TestApp::new();
    let id = app.register("alice", "alice@example.com").await;

    let (status, _, issued) = app
        .call(
            Method::POST,
            "/v1/authentication",
            None,
            Some(json!({"username": "alice", "password": "correct-horse"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let claims = &issued["claims"];
    assert_eq!(claims["data"]["id"], id.to_string());
    assert_eq!(claims["data"]["attributes"]["username"], "alice");
    assert_eq!(
        claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap(),
        300
    );

    let token = issued["token"].as_str().unwrap();
    let (status, _, refreshed) = app
        .call(Method::PATCH, "/v1/authentication", Some(token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refreshed["claims"]["data"], issued["claims"]["data"]);
}

#[tokio::test]
async fn test_authentication_failures() {
    let app = TestApp::new();
    app.register("alice", "alice@example.com").await;

    let (status, _, body) = app
        .call(
            Method::POST,
            "/v1/authentication",
            None,
            Some(json!({"username": "alice", "password": "wrong-password"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid username and/or password.");

    let (status, _, body) = app
        .call(
            Method::POST,
            "/v1/authentication",
            None,
            Some(json!({"password": "correct-horse"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No username provided.");

    let (status, _, _) = app
        .call(Method::PATCH, "/v1/authentication", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = app
        .call(Method::GET, "/v1/discussions", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_after_user_deleted() {
    let app = TestApp::new();
    let id = app.register("alice", "alice@example.com").await;
    let token = app.login("alice").await;

    let (status, _, _) = app
        .call(Method::DELETE, &format!("/v1/users/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, body) = app
        .call(Method::PATCH, "/v1/authentication", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "User not found for token ID.");
}

#[tokio::test]
async fn test_duplicate_username_and_email() {
    let app = TestApp::new();
    app.register("alice", "alice@example.com").await;

    let (status, _, body) = app
        .call(
            Method::POST,
            "/v1/users",
            None,
            Some(json!({
                "username": "alice",
                "password": "correct-horse",
                "email": "other@example.com",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT_ERROR");

    let (status, _, _) = app
        .call(
            Method::POST,
            "/v1/users",
            None,
            Some(json!({
                "username": "alice2",
                "password": "correct-horse",
                "email": "alice@example.com",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_short_password_rejected() {
    let app = TestApp::new();

    let (status, _, body) = app
        .call(
            Method::POST,
            "/v1/users",
            None,
            Some(json!({"username": "alice", "password": "short", "email": "a@example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("at least 8"));
    assert!(app.outbox.messages().is_empty());
}

#[tokio::test]
async fn test_email_change_rotates_confirmation_key() {
    let app = TestApp::new();
    let id = app.register("alice", "alice@example.com").await;
    let token = app.login("alice").await;
    let original_key = app.outbox.last().text;
    let uri = format!("/v1/users/{id}");

    let (status, _, _) = app
        .call(
            Method::PATCH,
            &uri,
            Some(&token),
            Some(json!({"email": "alice@new.example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let rotated = app.outbox.last();
    assert_eq!(rotated.to, vec!["alice@new.example.com".to_string()]);
    assert_ne!(rotated.text, original_key);

    // 이전 키는 더 이상 유효하지 않음
    let (status, _, body) = app
        .call(Method::PATCH, &uri, Some(&token), Some(json!({"key": original_key})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid key.");

    let (status, _, body) = app
        .call(Method::PATCH, &uri, Some(&token), Some(json!({"key": rotated.text})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attributes"]["key"], rotated.text.as_str());
}

#[tokio::test]
async fn test_resend_confirmation_keeps_secret() {
    let app = TestApp::new();
    let id = app.register("alice", "alice@example.com").await;
    let token = app.login("alice").await;
    let first = app.outbox.last().text;

    let (status, _, _) = app
        .call(
            Method::PATCH,
            &format!("/v1/users/{id}"),
            Some(&token),
            Some(json!({"key": "$action-resend-key"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let sent = app.outbox.messages();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].text, first);
}

#[tokio::test]
async fn test_update_requires_ownership() {
    let app = TestApp::new();
    let alice = app.register("alice", "alice@example.com").await;
    app.register("bob", "bob@example.com").await;
    let bob = app.login("bob").await;
    let uri = format!("/v1/users/{alice}");
    let change = json!({"email": "stolen@example.com"});

    let (status, _, _) = app
        .call(Method::PATCH, &uri, Some(&bob), Some(change.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = app.call(Method::PATCH, &uri, None, Some(change)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = app.call(Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // 관리자는 모든 사용자를 수정할 수 있음
    let (status, _, body) = app
        .call(
            Method::PATCH,
            &uri,
            Some(&admin_token()),
            Some(json!({"groups": ["users", "moderators"]})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attributes"]["groups"], json!(["users", "moderators"]));
}

#[tokio::test]
async fn test_user_listing_requires_administrator() {
    let app = TestApp::new();
    app.register("alice", "alice@example.com").await;
    let alice = app.login("alice").await;

    let (status, _, _) = app.call(Method::GET, "/v1/users", Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, body) = app
        .call(Method::GET, "/v1/users", Some(&admin_token()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["attributes"]["username"], "alice");
}

#[tokio::test]
async fn test_discussion_is_append_only() {
    let app = TestApp::new();
    let admin = admin_token();

    let (status, _, _) = app
        .call(
            Method::POST,
            "/v1/discussions",
            None,
            Some(json!({"thread": {"topic": "Rust", "description": "Ownership"}})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, created) = app
        .call(
            Method::POST,
            "/v1/discussions",
            Some(&admin),
            Some(json!({"thread": {"topic": "Rust", "description": "Ownership"}})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/v1/discussions/{}", created["id"].as_str().unwrap());

    app.register("alice", "alice@example.com").await;
    let alice = app.login("alice").await;

    let (status, _, appended) = app
        .call(
            Method::PATCH,
            &uri,
            Some(&alice),
            Some(json!({
                "comments": [{"user": "alice", "text": "first"}],
                "users": ["alice"],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(appended["attributes"]["comments"][0]["text"], "first");
    assert_eq!(appended["attributes"]["users"], json!(["alice"]));

    // 기존 댓글 수정은 거부
    let mut edited = appended["attributes"]["comments"].clone();
    edited[0]["text"] = json!("rewritten");
    let (status, _, body) = app
        .call(Method::PATCH, &uri, Some(&alice), Some(json!({"comments": edited})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You may only add to this model.");

    // 댓글 삭제도 거부
    let (status, _, _) = app
        .call(Method::PATCH, &uri, Some(&alice), Some(json!({"comments": []})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // 쓸 수 없는 thread 입력은 조용히 무시
    let (status, _, body) = app
        .call(
            Method::PATCH,
            &uri,
            Some(&alice),
            Some(json!({"thread": {"topic": "Go", "description": "hijack"}})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attributes"]["thread"]["topic"], "Rust");

    let (status, _, listed) = app.call(Method::GET, "/v1/discussions", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["total"], 1);
    assert_eq!(listed["data"][0]["attributes"]["comments"][0]["user"], "alice");

    let (status, _, _) = app.call(Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = app.call(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = app.call(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_requests() {
    let app = TestApp::new();

    let (status, _, _) = app
        .call(Method::GET, "/v1/users/not-a-uuid", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = app
        .call(Method::GET, &format!("/v1/users/{}", Uuid::new_v4()), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _, _) = app
        .call(Method::POST, "/v1/users", None, Some(json!(["not", "an", "object"])))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rate_limit_per_resource() {
    let limits = ResourceLimits::from_settings(&RateLimitSettings {
        users_per_second: 2,
        discussions_per_second: 10,
        ..RateLimitSettings::default()
    })
    .unwrap();
    let app = TestApp::with_limits(Some(&limits));
    let uri = format!("/v1/users/{}", Uuid::new_v4());

    for _ in 0..2 {
        let (status, _, _) = app.call(Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    let (status, headers, body) = app.call(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(headers.contains_key(header::RETRY_AFTER));
    assert_eq!(body["code"], "RATE_LIMITED");

    // 다른 리소스와 헬스 체크는 별도 한도
    let (status, _, _) = app.call(Method::GET, "/v1/discussions", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = TestApp::new();

    let (status, _, body) = app
        .call(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/v1/users/{id}").is_some());
}
