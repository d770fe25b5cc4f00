// TestDependencies - mock implementations for testing
//
// Provides in-memory services that can be injected into ServerDeps for tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{
    BaseEmailVerifier, BaseEncryptor, BaseHistoryLog, BasePostRegistration,
    BaseRegistrationStore, EmailVerdict, ServerDeps,
};
use crate::common::{MemberId, PendingPostId};
use crate::config::RegistrationSettings;
use crate::domains::member::models::{
    HistoryEntry, Member, MemberBitOptions, MemberValidation, PendingPost, ProfileField,
    SecurityAnswer,
};
use crate::domains::member::profile_steps::{ProfileStep, ProfileStepRegistry};
use crate::domains::member::values::RegistrationValues;

/// A member as it would look right after identity reservation.
pub fn sample_member() -> Member {
    let now = Utc::now();
    Member {
        id: MemberId::new(),
        name: "jane".to_string(),
        email: "jane@example.org".to_string(),
        password_hash: None,
        member_group_id: 3,
        bit_options: MemberBitOptions::default(),
        allow_admin_mails: false,
        language: None,
        timezone: None,
        last_visit: now,
        joined_at: now,
    }
}

// =============================================================================
// Mock Registration Store
// =============================================================================

#[derive(Default)]
struct StoreState {
    members: HashMap<MemberId, Member>,
    reserve_calls: usize,
    finalize_calls: usize,
    answers: Vec<SecurityAnswer>,
    fields: HashMap<i32, ProfileField>,
    profile_values: Vec<(MemberId, i32, String)>,
    claims: Vec<(String, MemberId)>,
    pending_posts: HashMap<PendingPostId, PendingPost>,
    validations: Vec<MemberValidation>,
}

pub struct MockRegistrationStore {
    state: Arc<Mutex<StoreState>>,
    fail_finalize: bool,
}

impl MockRegistrationStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            fail_finalize: false,
        }
    }

    /// Register a profile field definition
    pub fn with_field(self, id: i32, name: &str, field_type: &str) -> Self {
        self.state.lock().unwrap().fields.insert(
            id,
            ProfileField {
                id,
                name: name.to_string(),
                field_type: field_type.to_string(),
            },
        );
        self
    }

    pub fn with_pending_post(self, post: PendingPost) -> Self {
        self.state
            .lock()
            .unwrap()
            .pending_posts
            .insert(post.id, post);
        self
    }

    /// Make every `finalize` call fail (after the identity was reserved)
    pub fn failing_finalize(mut self) -> Self {
        self.fail_finalize = true;
        self
    }

    /// Stored members, in no particular order
    pub fn members(&self) -> Vec<Member> {
        self.state.lock().unwrap().members.values().cloned().collect()
    }

    pub fn member(&self, id: MemberId) -> Option<Member> {
        self.state.lock().unwrap().members.get(&id).cloned()
    }

    pub fn reserve_calls(&self) -> usize {
        self.state.lock().unwrap().reserve_calls
    }

    pub fn finalize_calls(&self) -> usize {
        self.state.lock().unwrap().finalize_calls
    }

    pub fn answers(&self) -> Vec<SecurityAnswer> {
        self.state.lock().unwrap().answers.clone()
    }

    pub fn profile_values(&self) -> Vec<(MemberId, i32, String)> {
        self.state.lock().unwrap().profile_values.clone()
    }

    /// Upload keys that were claimed, with the claiming member
    pub fn claims(&self) -> Vec<(String, MemberId)> {
        self.state.lock().unwrap().claims.clone()
    }

    pub fn pending_post(&self, id: PendingPostId) -> Option<PendingPost> {
        self.state.lock().unwrap().pending_posts.get(&id).cloned()
    }

    pub fn validations(&self) -> Vec<MemberValidation> {
        self.state.lock().unwrap().validations.clone()
    }
}

impl Default for MockRegistrationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRegistrationStore for MockRegistrationStore {
    async fn reserve_identity(&self, member: &Member) -> Result<Member> {
        let mut state = self.state.lock().unwrap();
        state.reserve_calls += 1;
        if state.members.contains_key(&member.id) {
            return Err(anyhow!("duplicate member id {}", member.id));
        }
        state.members.insert(member.id, member.clone());
        Ok(member.clone())
    }

    async fn finalize(&self, member: &Member) -> Result<()> {
        if self.fail_finalize {
            return Err(anyhow!("connection reset"));
        }
        let mut state = self.state.lock().unwrap();
        state.finalize_calls += 1;
        if !state.members.contains_key(&member.id) {
            return Err(anyhow!("member {} was never reserved", member.id));
        }
        state.members.insert(member.id, member.clone());
        Ok(())
    }

    async fn insert_security_answers(&self, answers: &[SecurityAnswer]) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .answers
            .extend_from_slice(answers);
        Ok(())
    }

    async fn find_profile_field(&self, id: i32) -> Result<Option<ProfileField>> {
        Ok(self.state.lock().unwrap().fields.get(&id).cloned())
    }

    async fn claim_attachments(&self, upload_key: &str, member_id: MemberId) -> Result<u64> {
        self.state
            .lock()
            .unwrap()
            .claims
            .push((upload_key.to_string(), member_id));
        Ok(1)
    }

    async fn upsert_profile_values(
        &self,
        member_id: MemberId,
        values: &[(i32, String)],
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        for (field_id, value) in values {
            state
                .profile_values
                .retain(|(m, f, _)| !(*m == member_id && f == field_id));
            state
                .profile_values
                .push((member_id, *field_id, value.clone()));
        }
        Ok(())
    }

    async fn find_pending_post(&self, id: PendingPostId) -> Result<Option<PendingPost>> {
        Ok(self.state.lock().unwrap().pending_posts.get(&id).cloned())
    }

    async fn attach_pending_post(&self, id: PendingPostId, member_id: MemberId) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        match state.pending_posts.get_mut(&id) {
            Some(post) if post.member_id.is_none() => {
                post.member_id = Some(member_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_validation(&self, validation: &MemberValidation) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .validations
            .push(validation.clone());
        Ok(())
    }
}

// =============================================================================
// Mock History Log
// =============================================================================

pub struct MockHistoryLog {
    entries: Arc<Mutex<Vec<HistoryEntry>>>,
}

impl MockHistoryLog {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Payloads logged under `log_type`, in order
    pub fn payloads(&self, log_type: &str) -> Vec<serde_json::Value> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.log_type == log_type)
            .map(|e| e.data.clone())
            .collect()
    }
}

impl Default for MockHistoryLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseHistoryLog for MockHistoryLog {
    async fn log(&self, entry: HistoryEntry) -> Result<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }
}

// =============================================================================
// Mock Email Verifier
// =============================================================================

pub struct MockEmailVerifier {
    verdict: EmailVerdict,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockEmailVerifier {
    pub fn new() -> Self {
        Self::with_verdict(EmailVerdict::Deliverable)
    }

    pub fn with_verdict(verdict: EmailVerdict) -> Self {
        Self {
            verdict,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Addresses that were checked
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockEmailVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseEmailVerifier for MockEmailVerifier {
    async fn verify(&self, email: &str) -> EmailVerdict {
        self.calls.lock().unwrap().push(email.to_string());
        self.verdict
    }
}

// =============================================================================
// Mock Encryptor
// =============================================================================

/// Reversible stand-in: `enc(<reversed plaintext>)`
pub struct MockEncryptor;

impl BaseEncryptor for MockEncryptor {
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        Ok(format!("enc({})", plaintext.chars().rev().collect::<String>()))
    }

    fn decrypt(&self, tag: &str) -> Result<String> {
        tag.strip_prefix("enc(")
            .and_then(|rest| rest.strip_suffix(')'))
            .map(|inner| inner.chars().rev().collect())
            .ok_or_else(|| anyhow!("not a mock ciphertext: {}", tag))
    }
}

// =============================================================================
// Recording Profile Step
// =============================================================================

/// Profile step that appends its key to a shared call log
pub struct RecordingProfileStep {
    key: &'static str,
    calls: Arc<Mutex<Vec<(&'static str, MemberId)>>>,
}

impl RecordingProfileStep {
    pub fn new(key: &'static str, calls: Arc<Mutex<Vec<(&'static str, MemberId)>>>) -> Self {
        Self { key, calls }
    }
}

#[async_trait]
impl ProfileStep for RecordingProfileStep {
    fn key(&self) -> &'static str {
        self.key
    }

    async fn augment_registration(
        &self,
        values: &mut RegistrationValues,
        member: &mut Member,
    ) -> Result<()> {
        self.calls.lock().unwrap().push((self.key, member.id));
        values.set(format!("step_{}", self.key), "done");
        Ok(())
    }
}

// =============================================================================
// Mock Post-Registration Hook
// =============================================================================

pub struct MockPostRegistration {
    calls: Arc<Mutex<Vec<(MemberId, Option<PendingPostId>, Option<String>)>>>,
}

impl MockPostRegistration {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<(MemberId, Option<PendingPostId>, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockPostRegistration {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BasePostRegistration for MockPostRegistration {
    async fn after_registration(
        &self,
        member: &mut Member,
        pending_post: Option<&PendingPost>,
        referrer: Option<&str>,
    ) -> Result<()> {
        self.calls.lock().unwrap().push((
            member.id,
            pending_post.map(|p| p.id),
            referrer.map(str::to_string),
        ));
        Ok(())
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

#[derive(Clone)]
pub struct TestDependencies {
    pub store: Arc<MockRegistrationStore>,
    pub history: Arc<MockHistoryLog>,
    pub email_verifier: Arc<MockEmailVerifier>,
    pub post_registration: Arc<MockPostRegistration>,
    pub profile_steps: ProfileStepRegistry,
    pub settings: RegistrationSettings,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MockRegistrationStore::new()),
            history: Arc::new(MockHistoryLog::new()),
            email_verifier: Arc::new(MockEmailVerifier::new()),
            post_registration: Arc::new(MockPostRegistration::new()),
            profile_steps: ProfileStepRegistry::new(),
            settings: RegistrationSettings::default(),
        }
    }

    /// Set a mock store
    pub fn mock_store(mut self, store: MockRegistrationStore) -> Self {
        self.store = Arc::new(store);
        self
    }

    /// Set a mock email verifier
    pub fn mock_email_verifier(mut self, verifier: MockEmailVerifier) -> Self {
        self.email_verifier = Arc::new(verifier);
        self
    }

    /// Append a profile step
    pub fn with_profile_step(mut self, step: Arc<dyn ProfileStep>) -> Self {
        self.profile_steps.register(step);
        self
    }

    pub fn with_settings(mut self, settings: RegistrationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Convert into ServerDeps for testing
    pub fn into_deps(&self) -> ServerDeps {
        ServerDeps::new(
            self.store.clone(),
            self.history.clone(),
            self.email_verifier.clone(),
            Arc::new(MockEncryptor),
            self.profile_steps.clone(),
            self.post_registration.clone(),
            self.settings.clone(),
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
