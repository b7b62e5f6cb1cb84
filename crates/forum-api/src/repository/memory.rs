//! 메모리 문서 저장소.

use std::sync::Arc;

use async_trait::async_trait;
use forum_core::{ForumError, ForumResult, Model};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{conflict_message, DocumentStore, Filter};

/// 메모리 저장 레코드. 필터 검사를 위해 직렬화 문서를 함께 보관합니다.
#[derive(Debug, Clone)]
struct Entry<M> {
    record: M,
    document: Value,
}

/// 프로세스 메모리에 레코드를 보관하는 저장소.
///
/// 삽입 순서를 유지하며, 유일 필드는 쓰기 잠금 안에서 검사되어
/// 유일 인덱스와 같은 보장을 제공합니다.
pub struct MemoryStore<M> {
    entries: Arc<RwLock<Vec<Entry<M>>>>,
}

impl<M> Clone for MemoryStore<M> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<M> Default for MemoryStore<M> {
    fn default() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl<M: Model + Clone + 'static> MemoryStore<M> {
    /// 빈 저장소 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 레코드 수.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// 비어 있는지 여부.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn entry(record: &M) -> ForumResult<Entry<M>> {
        Ok(Entry {
            record: record.clone(),
            document: serde_json::to_value(record)?,
        })
    }

    fn check_unique(entries: &[Entry<M>], candidate: &Entry<M>) -> ForumResult<()> {
        let id = candidate.record.id();
        for field in M::UNIQUE_FIELDS {
            let Some(value) = candidate.document.get(*field) else {
                continue;
            };
            let taken = entries
                .iter()
                .any(|e| e.record.id() != id && e.document.get(*field) == Some(value));
            if taken {
                return Err(ForumError::Conflict(conflict_message(field)));
            }
        }
        Ok(())
    }
}

fn matches(document: &Value, filter: Filter<'_>) -> bool {
    filter
        .iter()
        .all(|(field, expected)| document.get(*field).and_then(Value::as_str) == Some(*expected))
}

#[async_trait]
impl<M: Model + Clone + 'static> DocumentStore<M> for MemoryStore<M> {
    async fn insert(&self, record: &M) -> ForumResult<()> {
        let entry = Self::entry(record)?;
        let mut entries = self.entries.write().await;

        if entries.iter().any(|e| e.record.id() == record.id()) {
            return Err(ForumError::Conflict(conflict_message("id")));
        }
        Self::check_unique(&entries, &entry)?;

        entries.push(entry);
        Ok(())
    }

    async fn save(&self, record: &M) -> ForumResult<()> {
        let entry = Self::entry(record)?;
        let mut entries = self.entries.write().await;

        Self::check_unique(&entries, &entry)?;

        let slot = entries
            .iter_mut()
            .find(|e| e.record.id() == record.id())
            .ok_or_else(|| ForumError::NotFound(format!("{} not found.", M::RESOURCE)))?;
        *slot = entry;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> ForumResult<Option<M>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .find(|e| e.record.id() == id)
            .map(|e| e.record.clone()))
    }

    async fn exists(&self, id: Uuid) -> ForumResult<bool> {
        let entries = self.entries.read().await;
        Ok(entries.iter().any(|e| e.record.id() == id))
    }

    async fn find_one(&self, filter: Filter<'_>) -> ForumResult<Option<M>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .find(|e| matches(&e.document, filter))
            .map(|e| e.record.clone()))
    }

    async fn list(&self) -> ForumResult<Vec<M>> {
        let entries = self.entries.read().await;
        Ok(entries.iter().map(|e| e.record.clone()).collect())
    }

    async fn delete(&self, id: Uuid) -> ForumResult<bool> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| e.record.id() != id);
        Ok(entries.len() != before)
    }
}
