//! OpenAPI 문서화 설정.
//!
//! utoipa를 사용하여 REST API의 OpenAPI 3.0 스펙을 생성합니다.
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//!
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use axum::Router;
use forum_core::{Comment, Discussion, Thread};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{Claims, Credentials, Subject, SubjectAttributes, TokenResponse};
use crate::error::ApiErrorResponse;
use crate::routes::{
    Attributes, ComponentHealth, ComponentState, ComponentStatus, HealthResponse, ResourceDocument,
    ResourceList,
};

/// Bearer 토큰 보안 스킴 등록.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Token issued by POST /v1/authentication."))
                    .build(),
            ),
        );
    }
}

/// Forum API 문서.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Forum API",
        description = r#"
# 포럼 서버 REST API

사용자 가입/인증과 추가 전용 공개 토론을 위한 REST API입니다.

## 인증

`POST /v1/authentication`으로 발급받은 토큰을
`Authorization: Bearer <token>` 헤더에 포함하세요. 토큰은 5분간 유효하며
`PATCH /v1/authentication`으로 갱신합니다. 헤더가 없으면 익명 호출로 처리됩니다.

## 접근 제어

응답 속성은 호출자의 역할에 따라 필터링되며, 쓸 수 없는 입력 속성은
에러 없이 무시됩니다.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8001", description = "로컬 개발 서버"),
    ),
    tags(
        (name = "health", description = "헬스 체크 - 서버 상태 확인"),
        (name = "authentication", description = "인증 - 토큰 발급/갱신"),
        (name = "users", description = "사용자 - 가입, 조회, 수정, 삭제"),
        (name = "discussions", description = "토론 - 추가 전용 공개 토론")
    ),
    components(
        schemas(
            // ===== Common =====
            ApiErrorResponse,
            Attributes,
            ResourceDocument,
            ResourceList,

            // ===== Health =====
            HealthResponse,
            ComponentHealth,
            ComponentState,
            ComponentStatus,

            // ===== Authentication =====
            Credentials,
            TokenResponse,
            Claims,
            Subject,
            SubjectAttributes,

            // ===== Discussions =====
            Discussion,
            Thread,
            Comment,
        )
    ),
    paths(
        // ===== Health =====
        crate::routes::health::health_check,
        crate::routes::health::health_ready,

        // ===== Authentication =====
        crate::routes::authentication::issue_token,
        crate::routes::authentication::refresh_token,

        // ===== Users =====
        crate::routes::users::create_user,
        crate::routes::users::list_users,
        crate::routes::users::get_user,
        crate::routes::users::update_user,
        crate::routes::users::delete_user,

        // ===== Discussions =====
        crate::routes::discussions::create_discussion,
        crate::routes::discussions::list_discussions,
        crate::routes::discussions::get_discussion,
        crate::routes::discussions::update_discussion,
        crate::routes::discussions::delete_discussion,
    )
)]
pub struct ApiDoc;

/// Swagger UI 라우터 생성.
///
/// - `/swagger-ui` - Swagger UI 대화형 문서
/// - `/api-docs/openapi.json` - OpenAPI JSON 스펙
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_paths() {
        let json = serde_json::to_string_pretty(&ApiDoc::openapi()).unwrap();

        assert!(json.contains("Forum API"));
        assert!(json.contains("/health/ready"));
        assert!(json.contains("/v1/authentication"));
        assert!(json.contains("/v1/users/{id}"));
        assert!(json.contains("/v1/discussions/{id}"));
    }

    #[test]
    fn test_openapi_security_scheme() {
        let spec = ApiDoc::openapi();
        let components = spec.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }

    #[test]
    fn test_openapi_contains_schemas() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();

        assert!(json.contains("ResourceDocument"));
        assert!(json.contains("TokenResponse"));
        assert!(json.contains("Discussion"));
        assert!(json.contains("ApiErrorResponse"));
    }

    #[test]
    fn test_swagger_ui_router_creates() {
        let _router: Router<()> = swagger_ui_router();
    }
}
