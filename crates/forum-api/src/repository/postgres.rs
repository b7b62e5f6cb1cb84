//! PostgreSQL JSONB 문서 저장소.
//!
//! 리소스마다 `(id UUID PRIMARY KEY, document JSONB)` 테이블을 사용합니다.
//! 유일 필드는 `document->>'<field>'` 표현식 유니크 인덱스로 보장됩니다
//! (마이그레이션 참고).

use std::marker::PhantomData;

use async_trait::async_trait;
use forum_core::{ForumError, ForumResult, Model};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{conflict_message, DocumentStore, Filter};

/// 마이그레이션을 실행합니다.
pub async fn run_migrations(pool: &PgPool) -> ForumResult<()> {
    info!("Running database migrations...");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| ForumError::Storage(format!("migration failed: {}", e)))?;

    info!("Migrations completed successfully");
    Ok(())
}

/// PostgreSQL 문서 저장소.
pub struct PgDocumentStore<M> {
    pool: PgPool,
    _model: PhantomData<fn() -> M>,
}

impl<M> Clone for PgDocumentStore<M> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _model: PhantomData,
        }
    }
}

impl<M: Model> PgDocumentStore<M> {
    /// 연결 풀로 저장소 생성.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _model: PhantomData,
        }
    }

    fn table() -> &'static str {
        M::RESOURCE
    }

    fn decode(document: Value) -> ForumResult<M> {
        Ok(serde_json::from_value(document)?)
    }

    /// sqlx 에러를 도메인 에러로 변환. 유니크 위반은 `Conflict`.
    fn map_error(err: sqlx::Error) -> ForumError {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or_default();
                let field = M::UNIQUE_FIELDS
                    .iter()
                    .find(|f| constraint.contains(*f))
                    .copied()
                    .unwrap_or("id");
                return ForumError::Conflict(conflict_message(field));
            }
        }
        ForumError::Storage(err.to_string())
    }
}

fn filter_document(filter: Filter<'_>) -> Value {
    let map: Map<String, Value> = filter
        .iter()
        .map(|(field, value)| ((*field).to_string(), Value::String((*value).to_string())))
        .collect();
    Value::Object(map)
}

#[async_trait]
impl<M: Model + 'static> DocumentStore<M> for PgDocumentStore<M> {
    async fn insert(&self, record: &M) -> ForumResult<()> {
        let document = serde_json::to_value(record)?;
        let sql = format!("INSERT INTO {} (id, document) VALUES ($1, $2)", Self::table());

        sqlx::query(&sql)
            .bind(record.id())
            .bind(Json(document))
            .execute(&self.pool)
            .await
            .map_err(Self::map_error)?;
        Ok(())
    }

    async fn save(&self, record: &M) -> ForumResult<()> {
        let document = serde_json::to_value(record)?;
        let sql = format!(
            "UPDATE {} SET document = $2, updated_at = NOW() WHERE id = $1",
            Self::table()
        );

        let result = sqlx::query(&sql)
            .bind(record.id())
            .bind(Json(document))
            .execute(&self.pool)
            .await
            .map_err(Self::map_error)?;

        if result.rows_affected() == 0 {
            return Err(ForumError::NotFound(format!("{} not found.", M::RESOURCE)));
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> ForumResult<Option<M>> {
        let sql = format!("SELECT document FROM {} WHERE id = $1", Self::table());

        let row: Option<(Json<Value>,)> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::map_error)?;

        row.map(|(Json(doc),)| Self::decode(doc)).transpose()
    }

    async fn exists(&self, id: Uuid) -> ForumResult<bool> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", Self::table());

        let (exists,): (bool,) = sqlx::query_as(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(Self::map_error)?;
        Ok(exists)
    }

    async fn find_one(&self, filter: Filter<'_>) -> ForumResult<Option<M>> {
        let sql = format!(
            "SELECT document FROM {} WHERE document @> $1 ORDER BY created_at LIMIT 1",
            Self::table()
        );

        let row: Option<(Json<Value>,)> = sqlx::query_as(&sql)
            .bind(Json(filter_document(filter)))
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::map_error)?;

        row.map(|(Json(doc),)| Self::decode(doc)).transpose()
    }

    async fn list(&self) -> ForumResult<Vec<M>> {
        let sql = format!("SELECT document FROM {} ORDER BY created_at", Self::table());

        let rows: Vec<(Json<Value>,)> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(Self::map_error)?;

        rows.into_iter()
            .map(|(Json(doc),)| Self::decode(doc))
            .collect()
    }

    async fn delete(&self, id: Uuid) -> ForumResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", Self::table());

        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Self::map_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> ForumResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(Self::map_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_document() {
        let doc = filter_document(&[("username", "alice"), ("password", "hashed-abc")]);
        assert_eq!(
            doc,
            serde_json::json!({"username": "alice", "password": "hashed-abc"})
        );
    }
}
