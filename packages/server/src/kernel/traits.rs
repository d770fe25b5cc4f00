// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Registration logic lives in domains::member and talks to these traits.
//
// Naming convention: Base* for trait names (e.g., BaseRegistrationStore)

use anyhow::Result;
use async_trait::async_trait;

use crate::common::{MemberId, PendingPostId};
use crate::domains::member::models::{
    HistoryEntry, Member, MemberValidation, PendingPost, ProfileField, SecurityAnswer,
};

// =============================================================================
// Registration Storage Trait (Infrastructure)
// =============================================================================

/// Persistence used while creating a member.
///
/// Member writes are two-phase: `reserve_identity` stores the row so the id
/// can be referenced, `finalize` writes back whatever changed afterwards.
#[async_trait]
pub trait BaseRegistrationStore: Send + Sync {
    /// Insert the member and return the stored row
    async fn reserve_identity(&self, member: &Member) -> Result<Member>;

    /// Persist all mutations made since the identity was reserved
    async fn finalize(&self, member: &Member) -> Result<()>;

    /// Insert answer rows in one batch
    async fn insert_security_answers(&self, answers: &[SecurityAnswer]) -> Result<()>;

    async fn find_profile_field(&self, id: i32) -> Result<Option<ProfileField>>;

    /// Move attachments uploaded under a temporary key to the member.
    /// Returns how many were claimed.
    async fn claim_attachments(&self, upload_key: &str, member_id: MemberId) -> Result<u64>;

    /// Upsert profile field values keyed by (member, field)
    async fn upsert_profile_values(&self, member_id: MemberId, values: &[(i32, String)])
        -> Result<()>;

    async fn find_pending_post(&self, id: PendingPostId) -> Result<Option<PendingPost>>;

    /// Give an unowned pending post to the member. Returns false when the
    /// post was already owned or no longer exists.
    async fn attach_pending_post(&self, id: PendingPostId, member_id: MemberId) -> Result<bool>;

    async fn insert_validation(&self, validation: &MemberValidation) -> Result<()>;
}

// =============================================================================
// History Log Trait (Infrastructure - append-only audit sink)
// =============================================================================

#[async_trait]
pub trait BaseHistoryLog: Send + Sync {
    async fn log(&self, entry: HistoryEntry) -> Result<()>;
}

// =============================================================================
// Email Verifier Trait (Infrastructure - disposable address screening)
// =============================================================================

/// Outcome of screening an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailVerdict {
    Deliverable,
    Disposable,
    /// The verifier could not reach a decision (outage, timeout, bad reply).
    Unknown,
}

#[async_trait]
pub trait BaseEmailVerifier: Send + Sync {
    async fn verify(&self, email: &str) -> EmailVerdict;

    /// False for verifiers that accept every address without asking anyone.
    fn is_active(&self) -> bool {
        true
    }
}

// =============================================================================
// Encryption Trait (Infrastructure)
// =============================================================================

pub trait BaseEncryptor: Send + Sync {
    /// Encrypt plaintext into an opaque, storable tag
    fn encrypt(&self, plaintext: &str) -> Result<String>;

    /// Reverse `encrypt`
    fn decrypt(&self, tag: &str) -> Result<String>;
}

// =============================================================================
// Post-Registration Hook Trait
// =============================================================================

#[async_trait]
pub trait BasePostRegistration: Send + Sync {
    /// Runs once the member is fully persisted
    async fn after_registration(
        &self,
        member: &mut Member,
        pending_post: Option<&PendingPost>,
        referrer: Option<&str>,
    ) -> Result<()>;
}
