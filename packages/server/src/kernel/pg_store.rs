//! Postgres-backed registration storage

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::common::{MemberId, PendingPostId};
use crate::domains::member::models::{
    HistoryEntry, Member, MemberValidation, PendingPost, ProfileField, SecurityAnswer,
};
use crate::kernel::{BaseHistoryLog, BaseRegistrationStore};

#[derive(Clone)]
pub struct PgRegistrationStore {
    pool: PgPool,
}

impl PgRegistrationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseRegistrationStore for PgRegistrationStore {
    async fn reserve_identity(&self, member: &Member) -> Result<Member> {
        member.insert(&self.pool).await
    }

    async fn finalize(&self, member: &Member) -> Result<()> {
        member.update(&self.pool).await
    }

    async fn insert_security_answers(&self, answers: &[SecurityAnswer]) -> Result<()> {
        SecurityAnswer::insert_batch(answers, &self.pool).await?;
        Ok(())
    }

    async fn find_profile_field(&self, id: i32) -> Result<Option<ProfileField>> {
        ProfileField::find_by_id(id, &self.pool).await
    }

    async fn claim_attachments(&self, upload_key: &str, member_id: MemberId) -> Result<u64> {
        ProfileField::claim_attachments(upload_key, member_id, &self.pool).await
    }

    async fn upsert_profile_values(
        &self,
        member_id: MemberId,
        values: &[(i32, String)],
    ) -> Result<()> {
        ProfileField::upsert_values(member_id, values, &self.pool).await?;
        Ok(())
    }

    async fn find_pending_post(&self, id: PendingPostId) -> Result<Option<PendingPost>> {
        PendingPost::find_by_id(id, &self.pool).await
    }

    async fn attach_pending_post(&self, id: PendingPostId, member_id: MemberId) -> Result<bool> {
        PendingPost::attach_member(id, member_id, &self.pool).await
    }

    async fn insert_validation(&self, validation: &MemberValidation) -> Result<()> {
        validation.insert(&self.pool).await
    }
}

#[async_trait]
impl BaseHistoryLog for PgRegistrationStore {
    async fn log(&self, entry: HistoryEntry) -> Result<()> {
        entry.insert(&self.pool).await
    }
}
