//! Repository pattern for summary storage
//!
//! Summaries are append-only from the service's point of view: the trait
//! exposes create and read operations and nothing that mutates an existing
//! record.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Durable store for summaries, keyed by owner
#[async_trait]
pub trait SummaryRepository: Send + Sync {
    /// Persist a new summary, assigning its id and creation time
    async fn create(&self, summary: NewSummary) -> Result<Summary>;

    /// All summaries for an owner, newest first
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Summary>>;

    /// Look up a single summary
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Summary>>;

    /// Check the backing store is reachable
    async fn ping(&self) -> Result<()>;
}

/// Postgres-backed repository
#[derive(Clone)]
pub struct PgSummaryRepository {
    pool: DbPool,
}

impl PgSummaryRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SummaryRepository for PgSummaryRepository {
    async fn create(&self, summary: NewSummary) -> Result<Summary> {
        let now = Utc::now();

        let model = SummaryActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(summary.owner_id),
            title: Set(summary.title),
            content: Set(summary.content),
            file_url: Set(summary.file_url),
            prompt_version: Set(summary.prompt_version),
            model: Set(summary.model),
            created_at: Set(now.into()),
        };

        model
            .insert(self.pool.conn())
            .await
            .map_err(|e| AppError::Persistence {
                message: e.to_string(),
            })
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Summary>> {
        SummaryEntity::find()
            .filter(SummaryColumn::OwnerId.eq(owner_id))
            .order_by_desc(SummaryColumn::CreatedAt)
            .order_by_desc(SummaryColumn::Id)
            .all(self.pool.conn())
            .await
            .map_err(Into::into)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Summary>> {
        SummaryEntity::find_by_id(id)
            .one(self.pool.conn())
            .await
            .map_err(Into::into)
    }

    async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }
}

/// In-process repository for tests and `memory://` development runs
#[derive(Default)]
pub struct InMemorySummaryRepository {
    records: RwLock<HashMap<Uuid, Summary>>,
}

impl InMemorySummaryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored summaries across all owners
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl SummaryRepository for InMemorySummaryRepository {
    async fn create(&self, summary: NewSummary) -> Result<Summary> {
        let record = Summary {
            id: Uuid::new_v4(),
            owner_id: summary.owner_id,
            title: summary.title,
            content: summary.content,
            file_url: summary.file_url,
            prompt_version: summary.prompt_version,
            model: summary.model,
            created_at: Utc::now().into(),
        };

        self.records.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Summary>> {
        let mut summaries: Vec<Summary> = self
            .records
            .read()
            .await
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();

        // Ties on the timestamp fall back to id so ordering stays stable
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(summaries)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Summary>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_summary(owner: &str, title: &str) -> NewSummary {
        NewSummary {
            owner_id: owner.to_string(),
            title: title.to_string(),
            content: format!("```json\n{{\"title\":\"{}\"}}\n```", title),
            file_url: format!("https://store/{}/paper.pdf", owner),
            prompt_version: "summary-v1".to_string(),
            model: "test-model".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_unique_ids() {
        let repo = InMemorySummaryRepository::new();
        let a = repo.create(new_summary("alice", "A")).await.unwrap();
        let b = repo.create(new_summary("alice", "B")).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(repo.len().await, 2);
    }

    #[tokio::test]
    async fn test_list_by_owner_is_scoped_and_newest_first() {
        let repo = InMemorySummaryRepository::new();
        repo.create(new_summary("alice", "first")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        repo.create(new_summary("bob", "other")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        repo.create(new_summary("alice", "second")).await.unwrap();

        let listed = repo.list_by_owner("alice").await.unwrap();
        let titles: Vec<&str> = listed.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first"]);
        assert!(listed.iter().all(|s| s.owner_id == "alice"));
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let repo = InMemorySummaryRepository::new();
        let created = repo.create(new_summary("alice", "A")).await.unwrap();

        let found = repo.get_by_id(created.id).await.unwrap();
        assert_eq!(found, Some(created));
        assert!(repo.get_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let summary = Summary {
            id: Uuid::nil(),
            owner_id: "alice".to_string(),
            title: "Deep Nets".to_string(),
            content: "raw".to_string(),
            file_url: "https://store/x/paper.pdf".to_string(),
            prompt_version: "summary-v1".to_string(),
            model: "m".to_string(),
            created_at: Utc::now().into(),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["ownerId"], "alice");
        assert_eq!(json["fileUrl"], "https://store/x/paper.pdf");
        assert_eq!(json["promptVersion"], "summary-v1");
        assert!(json.get("createdAt").is_some());
    }
}
