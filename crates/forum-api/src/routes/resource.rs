//! 리소스 요청 파이프라인.
//!
//! 모든 모델 라우트가 같은 순서로 처리됩니다.
//!
//! 1. 레코드 로드 (ID 라우트)
//! 2. 리소스 ACL 게이트
//! 3. 입력 필드 필터
//! 4. 라이프사이클 훅
//! 5. 저장
//! 6. 출력 필드 필터
//!
//! 게이트가 거부하면 필드 필터나 훅은 실행되지 않습니다.

use forum_core::{Caller, ForumError, Model, Operation};
use forum_notification::ConfirmationMailer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::lifecycle::{HookContext, Lifecycle};
use crate::metrics::record_resource_operation;
use crate::repository::DocumentStore;

/// 요청 본문 속성.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct Attributes(pub Map<String, Value>);

/// 단일 리소스 응답.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResourceDocument {
    /// 레코드 ID
    pub id: Uuid,
    /// 리소스 타입 ("users", "discussions")
    #[serde(rename = "type")]
    pub kind: String,
    /// 호출자가 읽을 수 있는 속성
    #[schema(value_type = Object)]
    pub attributes: Map<String, Value>,
}

/// 리소스 목록 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResourceList {
    /// 리소스 목록
    pub data: Vec<ResourceDocument>,
    /// 전체 개수
    pub total: usize,
}

/// 호출자 기준으로 읽을 수 있는 필드만 남겨 직렬화.
pub fn render<M: Model>(record: &M, caller: &Caller) -> ApiResult<ResourceDocument> {
    let roles = caller.roles_for(record.owner());
    let attributes = M::field_acl().filter_output(&roles, record.attributes()?);

    Ok(ResourceDocument {
        id: record.id(),
        kind: M::RESOURCE.to_string(),
        attributes,
    })
}

fn not_found<M: Model>(id: Uuid) -> ApiError {
    ForumError::NotFound(format!("No {} record with id {}.", M::RESOURCE, id)).into()
}

async fn load<M: Model>(store: &dyn DocumentStore<M>, id: Uuid) -> ApiResult<M> {
    store.get(id).await?.ok_or_else(|| not_found::<M>(id))
}

/// 결과를 메트릭으로 기록하고 그대로 반환.
fn observe<T>(resource: &'static str, operation: &'static str, result: ApiResult<T>) -> ApiResult<T> {
    let outcome = match &result {
        Ok(_) => "success",
        Err(err) => err.inner().code(),
    };
    record_resource_operation(resource, operation, outcome);
    result
}

/// 레코드 생성.
pub async fn create<M: Lifecycle>(
    store: &dyn DocumentStore<M>,
    mailer: &ConfirmationMailer,
    caller: &Caller,
    input: Map<String, Value>,
) -> ApiResult<ResourceDocument> {
    observe(M::RESOURCE, "create", create_record(store, mailer, caller, input).await)
}

async fn create_record<M: Lifecycle>(
    store: &dyn DocumentStore<M>,
    mailer: &ConfirmationMailer,
    caller: &Caller,
    input: Map<String, Value>,
) -> ApiResult<ResourceDocument> {
    let roles = caller.roles_for(None);
    M::resource_acl().authorize(&roles, Operation::Create)?;

    let input = M::field_acl().filter_input(&roles, input);
    let mut record = M::create(input)?;

    let ctx = HookContext {
        caller,
        store,
        mailer,
    };
    record.on_create(&ctx).await?;
    store.insert(&record).await?;

    info!(resource = M::RESOURCE, id = %record.id(), "Record created");
    render(&record, caller)
}

/// 전체 목록 조회.
///
/// 목록 권한은 소유자 없는 역할 집합으로 판정하고, 각 레코드는
/// 해당 레코드의 소유자 기준으로 필터링합니다.
pub async fn list<M: Model>(store: &dyn DocumentStore<M>, caller: &Caller) -> ApiResult<ResourceList> {
    observe(M::RESOURCE, "read_all", list_records(store, caller).await)
}

async fn list_records<M: Model>(
    store: &dyn DocumentStore<M>,
    caller: &Caller,
) -> ApiResult<ResourceList> {
    M::resource_acl().authorize(&caller.roles_for(None), Operation::ReadAll)?;

    let data = store
        .list()
        .await?
        .iter()
        .map(|record| render(record, caller))
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(ResourceList {
        total: data.len(),
        data,
    })
}

/// 단일 레코드 조회.
pub async fn read<M: Model>(
    store: &dyn DocumentStore<M>,
    caller: &Caller,
    id: Uuid,
) -> ApiResult<ResourceDocument> {
    observe(M::RESOURCE, "read", read_record(store, caller, id).await)
}

async fn read_record<M: Model>(
    store: &dyn DocumentStore<M>,
    caller: &Caller,
    id: Uuid,
) -> ApiResult<ResourceDocument> {
    let record = load(store, id).await?;
    M::resource_acl().authorize(&caller.roles_for(record.owner()), Operation::Read)?;
    render(&record, caller)
}

/// 레코드 수정.
pub async fn update<M: Lifecycle>(
    store: &dyn DocumentStore<M>,
    mailer: &ConfirmationMailer,
    caller: &Caller,
    id: Uuid,
    input: Map<String, Value>,
) -> ApiResult<ResourceDocument> {
    observe(
        M::RESOURCE,
        "update",
        update_record(store, mailer, caller, id, input).await,
    )
}

async fn update_record<M: Lifecycle>(
    store: &dyn DocumentStore<M>,
    mailer: &ConfirmationMailer,
    caller: &Caller,
    id: Uuid,
    input: Map<String, Value>,
) -> ApiResult<ResourceDocument> {
    let mut record = load(store, id).await?;
    let roles = caller.roles_for(record.owner());
    M::resource_acl().authorize(&roles, Operation::Update)?;

    let mut input = M::field_acl().filter_input(&roles, input);

    let ctx = HookContext {
        caller,
        store,
        mailer,
    };
    record.on_update(&ctx, &mut input).await?;
    record.apply(input)?;
    store.save(&record).await?;

    info!(resource = M::RESOURCE, id = %id, "Record updated");
    render(&record, caller)
}

/// 레코드 삭제.
pub async fn delete<M: Model>(store: &dyn DocumentStore<M>, caller: &Caller, id: Uuid) -> ApiResult<()> {
    observe(M::RESOURCE, "delete", delete_record(store, caller, id).await)
}

async fn delete_record<M: Model>(
    store: &dyn DocumentStore<M>,
    caller: &Caller,
    id: Uuid,
) -> ApiResult<()> {
    let record = load(store, id).await?;
    M::resource_acl().authorize(&caller.roles_for(record.owner()), Operation::Delete)?;

    if !store.delete(id).await? {
        return Err(not_found::<M>(id));
    }

    info!(resource = M::RESOURCE, id = %id, deleted_by = ?caller.id, "Record deleted");
    Ok(())
}
