use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::common::{MemberId, PendingPostId};

/// Content a guest submitted before creating an account
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct PendingPost {
    pub id: PendingPostId,
    pub email: String,
    pub content_class: String,
    pub content_id: i64,
    pub member_id: Option<MemberId>,
    pub created_at: DateTime<Utc>,
}

impl PendingPost {
    pub async fn find_by_id(id: PendingPostId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM posts_before_registering WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Claim the post for `member_id` unless someone already owns it.
    pub async fn attach_member(id: PendingPostId, member_id: MemberId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE posts_before_registering SET member_id = $2
             WHERE id = $1 AND member_id IS NULL",
        )
        .bind(id)
        .bind(member_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Whether `email` is the address the guest wrote the post with.
    pub fn written_by(&self, email: &str) -> bool {
        self.email.trim().eq_ignore_ascii_case(email.trim())
    }
}
