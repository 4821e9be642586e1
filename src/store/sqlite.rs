// src/store/sqlite.rs
// sqlx-backed log store. Schema is created at startup; no migration
// tooling needed for a single table.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::info;

use super::{AnalysisLog, LogPage, LogPatch, LogStore, ScoreSet};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS analysis_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        input_text TEXT NOT NULL,
        feedback_text TEXT NOT NULL,
        model_name TEXT NOT NULL,
        score_overall INTEGER,
        score_grammar INTEGER,
        score_fluency INTEGER,
        score_pronunciation INTEGER,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )
"#;

const INSERT_LOG: &str = r#"
    INSERT INTO analysis_logs (
        input_text, feedback_text, model_name,
        score_overall, score_grammar, score_fluency, score_pronunciation
    ) VALUES (?, ?, ?, ?, ?, ?, ?)
    RETURNING *
"#;

const SELECT_LOG: &str = "SELECT * FROM analysis_logs WHERE id = ?";

const LIST_PAGE: &str = r#"
    SELECT * FROM analysis_logs
    ORDER BY id DESC
    LIMIT ? OFFSET ?
"#;

pub struct SqliteLogStore {
    pool: SqlitePool,
}

impl SqliteLogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create any missing tables.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        info!("analysis_logs table ready");
        Ok(())
    }
}

#[async_trait]
impl LogStore for SqliteLogStore {
    async fn create(
        &self,
        input_text: &str,
        feedback_text: &str,
        model_name: &str,
        scores: ScoreSet,
    ) -> Result<AnalysisLog> {
        let row = sqlx::query_as::<_, AnalysisLog>(INSERT_LOG)
            .bind(input_text)
            .bind(feedback_text)
            .bind(model_name)
            .bind(scores.overall)
            .bind(scores.grammar)
            .bind(scores.fluency)
            .bind(scores.pronunciation)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get(&self, id: i64) -> Result<Option<AnalysisLog>> {
        let row = sqlx::query_as::<_, AnalysisLog>(SELECT_LOG)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update(&self, id: i64, patch: LogPatch) -> Result<Option<AnalysisLog>> {
        let Some(existing) = self.get(id).await? else {
            return Ok(None);
        };

        let scores = patch.scores.unwrap_or_default();
        let row = sqlx::query_as::<_, AnalysisLog>(
            r#"
            UPDATE analysis_logs SET
                input_text = ?,
                feedback_text = ?,
                model_name = ?,
                score_overall = COALESCE(?, score_overall),
                score_grammar = COALESCE(?, score_grammar),
                score_fluency = COALESCE(?, score_fluency),
                score_pronunciation = COALESCE(?, score_pronunciation)
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(patch.input_text.map(|s| s.trim().to_string()).unwrap_or(existing.input_text))
        .bind(patch.feedback_text.map(|s| s.trim().to_string()).unwrap_or(existing.feedback_text))
        .bind(patch.model_name.map(|s| s.trim().to_string()).unwrap_or(existing.model_name))
        .bind(scores.overall)
        .bind(scores.grammar)
        .bind(scores.fluency)
        .bind(scores.pronunciation)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(Some(row))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM analysis_logs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, page: u32, per_page: u32) -> Result<LogPage> {
        let total = self.count().await?;
        let offset = (page.saturating_sub(1) as i64) * per_page as i64;
        let items = sqlx::query_as::<_, AnalysisLog>(LIST_PAGE)
            .bind(per_page as i64)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(LogPage {
            page,
            per_page,
            total,
            items,
        })
    }

    async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM analysis_logs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_store() -> SqliteLogStore {
        // Single connection so the in-memory database is shared.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteLogStore::new(pool);
        store.run_migrations().await.unwrap();
        store
    }

    #[tokio::test]
    async fn create_then_get_round_trip() {
        let store = test_store().await;
        let created = store
            .create("some input", "some feedback", "gpt-4o-mini", ScoreSet::default())
            .await
            .unwrap();
        assert!(created.id > 0);
        assert_eq!(created.input_text, "some input");
        assert!(created.score_overall.is_none());

        let fetched = store.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.feedback_text, "some feedback");
        assert_eq!(fetched.model_name, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let store = test_store().await;
        assert!(store.get(999).await.unwrap().is_none());
        assert!(store.update(999, LogPatch::default()).await.unwrap().is_none());
        assert!(!store.delete(999).await.unwrap());
    }

    #[tokio::test]
    async fn list_orders_newest_first_and_paginates() {
        let store = test_store().await;
        for i in 0..5 {
            store
                .create(&format!("input {i}"), "fb", "manual", ScoreSet::default())
                .await
                .unwrap();
        }

        let page = store.list(1, 2).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert!(page.items[0].id > page.items[1].id);
        assert_eq!(page.items[0].input_text, "input 4");

        let last = store.list(3, 2).await.unwrap();
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].input_text, "input 0");
    }

    #[tokio::test]
    async fn update_patches_only_provided_fields() {
        let store = test_store().await;
        let created = store
            .create("input", "feedback", "manual", ScoreSet::default())
            .await
            .unwrap();

        let patch = LogPatch {
            feedback_text: Some("better feedback".into()),
            scores: Some(ScoreSet {
                overall: Some(8),
                ..Default::default()
            }),
            ..Default::default()
        };
        let updated = store.update(created.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.input_text, "input");
        assert_eq!(updated.feedback_text, "better feedback");
        assert_eq!(updated.score_overall, Some(8));
        assert_eq!(updated.score_grammar, None);
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let store = test_store().await;
        let created = store
            .create("input", "feedback", "manual", ScoreSet::default())
            .await
            .unwrap();
        assert!(store.delete(created.id).await.unwrap());
        assert!(store.get(created.id).await.unwrap().is_none());
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
