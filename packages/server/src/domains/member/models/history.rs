use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::common::MemberId;

/// Append-only account history record
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub member_id: MemberId,
    pub app: String,
    pub log_type: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Entry owned by the core application.
    pub fn core(member_id: MemberId, log_type: &str, data: Value) -> Self {
        Self {
            member_id,
            app: "core".to_string(),
            log_type: log_type.to_string(),
            data,
            created_at: Utc::now(),
        }
    }

    pub async fn insert(&self, pool: &PgPool) -> Result<()> {
        sqlx::query(
            "INSERT INTO member_history (member_id, app, log_type, data, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(self.member_id)
        .bind(&self.app)
        .bind(&self.log_type)
        .bind(&self.data)
        .bind(self.created_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_member(member_id: MemberId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT member_id, app, log_type, data, created_at FROM member_history
             WHERE member_id = $1 ORDER BY id",
        )
        .bind(member_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
