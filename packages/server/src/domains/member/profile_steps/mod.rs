//! Profile steps - extensions that run while an account is being created.
//!
//! Each step sees the submitted values and the freshly reserved member and
//! may change either. Steps run in the order they were registered.

mod timezone;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::domains::member::models::Member;
use crate::domains::member::values::RegistrationValues;

pub use timezone::TimezoneStep;

#[async_trait]
pub trait ProfileStep: Send + Sync {
    /// Short identifier used in logs.
    fn key(&self) -> &'static str;

    /// Called once per registration after the member id exists.
    async fn augment_registration(
        &self,
        values: &mut RegistrationValues,
        member: &mut Member,
    ) -> Result<()>;
}

/// Ordered set of profile steps.
#[derive(Clone, Default)]
pub struct ProfileStepRegistry {
    steps: Vec<Arc<dyn ProfileStep>>,
}

impl ProfileStepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Steps shipped with the application.
    pub fn builtin() -> Self {
        Self::new().with_step(Arc::new(TimezoneStep))
    }

    pub fn with_step(mut self, step: Arc<dyn ProfileStep>) -> Self {
        self.register(step);
        self
    }

    pub fn register(&mut self, step: Arc<dyn ProfileStep>) {
        self.steps.push(step);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ProfileStep>> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
