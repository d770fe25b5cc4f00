//! Default post-registration hook: queue validation and adopt the guest post

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::ValidationMode;
use crate::domains::member::models::{Member, MemberFlag, MemberValidation, PendingPost};
use crate::kernel::{BasePostRegistration, BaseRegistrationStore};

pub struct ValidationPostRegistration {
    store: Arc<dyn BaseRegistrationStore>,
    mode: ValidationMode,
}

impl ValidationPostRegistration {
    pub fn new(store: Arc<dyn BaseRegistrationStore>, mode: ValidationMode) -> Self {
        Self { store, mode }
    }

    /// Hand a guest post to the member who wrote it.
    ///
    /// Only unowned posts written with the member's email are adopted.
    async fn adopt_pending_post(&self, post: &PendingPost, member: &Member) -> Result<()> {
        if post.member_id.is_some() {
            warn!(member_id = %member.id, post_id = %post.id, "Pending post already has an owner, skipping");
            return Ok(());
        }

        if !post.written_by(&member.email) {
            warn!(member_id = %member.id, post_id = %post.id, "Pending post was written with another email, skipping");
            return Ok(());
        }

        if self.store.attach_pending_post(post.id, member.id).await? {
            info!(member_id = %member.id, post_id = %post.id, "Pending post attached to member");
        } else {
            warn!(member_id = %member.id, post_id = %post.id, "Pending post was claimed concurrently, skipping");
        }

        Ok(())
    }
}

#[async_trait]
impl BasePostRegistration for ValidationPostRegistration {
    async fn after_registration(
        &self,
        member: &mut Member,
        pending_post: Option<&PendingPost>,
        referrer: Option<&str>,
    ) -> Result<()> {
        if self.mode != ValidationMode::None {
            let validation = MemberValidation::new(member.id, self.mode.as_str())?;
            self.store.insert_validation(&validation).await?;

            member.bit_options.set(MemberFlag::Validating, true);
            self.store.finalize(member).await?;

            info!(member_id = %member.id, kind = %validation.kind, "Member awaiting validation");
        }

        if let Some(post) = pending_post {
            self.adopt_pending_post(post, member).await?;
        }

        debug!(member_id = %member.id, referrer = ?referrer, "Post-registration complete");
        Ok(())
    }
}
