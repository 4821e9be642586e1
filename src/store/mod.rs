// src/store/mod.rs
// Log store seam: entities and the trait the orchestrator and the CRUD
// handlers talk to. The SQLite implementation lives in sqlite.rs.

pub mod sqlite;

pub use sqlite::SqliteLogStore;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One persisted request/response pair.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AnalysisLog {
    pub id: i64,
    pub input_text: String,
    pub feedback_text: String,
    pub model_name: String,
    pub score_overall: Option<i64>,
    pub score_grammar: Option<i64>,
    pub score_fluency: Option<i64>,
    pub score_pronunciation: Option<i64>,
    pub created_at: Option<NaiveDateTime>,
}

/// Optional score columns, set only when present in the caller's payload.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ScoreSet {
    pub overall: Option<i64>,
    pub grammar: Option<i64>,
    pub fluency: Option<i64>,
    pub pronunciation: Option<i64>,
}

/// Partial update for an existing row. None means "leave unchanged".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogPatch {
    pub input_text: Option<String>,
    pub feedback_text: Option<String>,
    pub model_name: Option<String>,
    #[serde(default)]
    pub scores: Option<ScoreSet>,
}

/// One page of log rows, newest (highest id) first.
#[derive(Debug, Clone, Serialize)]
pub struct LogPage {
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub items: Vec<AnalysisLog>,
}

/// Keyed record store for analysis logs. The exam core only ever calls
/// `create`; the rest backs the CRUD surface.
#[async_trait]
pub trait LogStore: Send + Sync {
    async fn create(
        &self,
        input_text: &str,
        feedback_text: &str,
        model_name: &str,
        scores: ScoreSet,
    ) -> Result<AnalysisLog>;

    /// None when the id doesn't exist.
    async fn get(&self, id: i64) -> Result<Option<AnalysisLog>>;

    /// None when the id doesn't exist.
    async fn update(&self, id: i64, patch: LogPatch) -> Result<Option<AnalysisLog>>;

    /// False when the id doesn't exist.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Page is 1-based; per_page is clamped by the caller.
    async fn list(&self, page: u32, per_page: u32) -> Result<LogPage>;

    async fn count(&self) -> Result<i64>;
}
