use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::common::MemberId;

/// Individual flags packed into `members.bit_options`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberFlag {
    ViewSigs,
    SecurityQuestionsOptOut,
    HasSecurityAnswers,
    Validating,
}

impl MemberFlag {
    const fn bit(self) -> i64 {
        match self {
            MemberFlag::ViewSigs => 1 << 0,
            MemberFlag::SecurityQuestionsOptOut => 1 << 1,
            MemberFlag::HasSecurityAnswers => 1 << 2,
            MemberFlag::Validating => 1 << 3,
        }
    }
}

/// Compact set of boolean member options.
#[derive(sqlx::Type, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[sqlx(transparent)]
pub struct MemberBitOptions(i64);

impl MemberBitOptions {
    pub fn from_bits(bits: i64) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> i64 {
        self.0
    }

    pub fn contains(self, flag: MemberFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn set(&mut self, flag: MemberFlag, enabled: bool) {
        if enabled {
            self.0 |= flag.bit();
        } else {
            self.0 &= !flag.bit();
        }
    }
}

/// Member model - SQL persistence layer
///
/// `password_hash` is `None` for accounts that never set a local password.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub member_group_id: i32,
    pub bit_options: MemberBitOptions,
    pub allow_admin_mails: bool,

    // Locale
    pub language: Option<String>,
    pub timezone: Option<String>,

    pub last_visit: DateTime<Utc>,
    pub joined_at: DateTime<Utc>,
}

impl Member {
    pub async fn find_by_id(id: MemberId, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM members WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_email(email: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM members WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Insert new member, returning the stored row
    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO members (
                id,
                name,
                email,
                password_hash,
                member_group_id,
                bit_options,
                allow_admin_mails,
                language,
                timezone,
                last_visit,
                joined_at
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING *",
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.email)
        .bind(&self.password_hash)
        .bind(self.member_group_id)
        .bind(self.bit_options)
        .bind(self.allow_admin_mails)
        .bind(&self.language)
        .bind(&self.timezone)
        .bind(self.last_visit)
        .bind(self.joined_at)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Write every mutable column back
    pub async fn update(&self, pool: &PgPool) -> Result<()> {
        sqlx::query(
            "UPDATE members
             SET name = $2,
                 email = $3,
                 password_hash = $4,
                 member_group_id = $5,
                 bit_options = $6,
                 allow_admin_mails = $7,
                 language = $8,
                 timezone = $9,
                 last_visit = $10
             WHERE id = $1",
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.email)
        .bind(&self.password_hash)
        .bind(self.member_group_id)
        .bind(self.bit_options)
        .bind(self.allow_admin_mails)
        .bind(&self.language)
        .bind(&self.timezone)
        .bind(self.last_visit)
        .execute(pool)
        .await?;

        Ok(())
    }
}
