use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::common::MemberId;

const TOKEN_LEN: usize = 32;

/// Outstanding request to validate a freshly registered account
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct MemberValidation {
    pub token: String,
    pub member_id: MemberId,
    /// `user`, `admin` or `user_admin`
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

impl MemberValidation {
    /// New validation with a random 256-bit token.
    pub fn new(member_id: MemberId, kind: &str) -> Result<Self> {
        let mut token = [0u8; TOKEN_LEN];
        openssl::rand::rand_bytes(&mut token)?;

        Ok(Self {
            token: hex::encode(token),
            member_id,
            kind: kind.to_string(),
            created_at: Utc::now(),
        })
    }

    pub async fn insert(&self, pool: &PgPool) -> Result<()> {
        sqlx::query(
            "INSERT INTO member_validating (token, member_id, kind, created_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&self.token)
        .bind(self.member_id)
        .bind(&self.kind)
        .bind(self.created_at)
        .execute(pool)
        .await?;

        Ok(())
    }
}
