//! Server dependencies for registration (using traits for testability)
//!
//! This module provides the central dependency container handed to the
//! member creation procedure. All external services use trait abstractions.

use async_trait::async_trait;
use disposable_email::models::Verdict;
use disposable_email::DisposableEmailService;
use std::sync::Arc;
use tracing::warn;

use crate::config::RegistrationSettings;
use crate::domains::member::profile_steps::ProfileStepRegistry;
use crate::kernel::{
    BaseEmailVerifier, BaseEncryptor, BaseHistoryLog, BasePostRegistration,
    BaseRegistrationStore, EmailVerdict,
};

// =============================================================================
// DisposableEmailService Adapter (implements BaseEmailVerifier trait)
// =============================================================================

/// Wrapper around DisposableEmailService that implements BaseEmailVerifier
pub struct DisposableEmailAdapter(pub Arc<DisposableEmailService>);

impl DisposableEmailAdapter {
    pub fn new(service: Arc<DisposableEmailService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl BaseEmailVerifier for DisposableEmailAdapter {
    async fn verify(&self, email: &str) -> EmailVerdict {
        match self.0.check(email).await {
            Ok(Verdict::Disposable) => EmailVerdict::Disposable,
            Ok(Verdict::Deliverable) => EmailVerdict::Deliverable,
            Err(e) => {
                warn!(error = %e, "Disposable email check failed");
                EmailVerdict::Unknown
            }
        }
    }
}

/// Verifier used when no checker is configured: every address passes.
pub struct NoopEmailVerifier;

#[async_trait]
impl BaseEmailVerifier for NoopEmailVerifier {
    async fn verify(&self, _email: &str) -> EmailVerdict {
        EmailVerdict::Deliverable
    }

    fn is_active(&self) -> bool {
        false
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Dependencies of the member creation procedure
#[derive(Clone)]
pub struct ServerDeps {
    pub store: Arc<dyn BaseRegistrationStore>,
    pub history: Arc<dyn BaseHistoryLog>,
    pub email_verifier: Arc<dyn BaseEmailVerifier>,
    /// Encrypts security question answers before they are stored
    pub encryptor: Arc<dyn BaseEncryptor>,
    /// Ordered profile steps, fixed at startup
    pub profile_steps: ProfileStepRegistry,
    pub post_registration: Arc<dyn BasePostRegistration>,
    pub settings: RegistrationSettings,
}

impl ServerDeps {
    pub fn new(
        store: Arc<dyn BaseRegistrationStore>,
        history: Arc<dyn BaseHistoryLog>,
        email_verifier: Arc<dyn BaseEmailVerifier>,
        encryptor: Arc<dyn BaseEncryptor>,
        profile_steps: ProfileStepRegistry,
        post_registration: Arc<dyn BasePostRegistration>,
        settings: RegistrationSettings,
    ) -> Self {
        Self {
            store,
            history,
            email_verifier,
            encryptor,
            profile_steps,
            post_registration,
            settings,
        }
    }
}
