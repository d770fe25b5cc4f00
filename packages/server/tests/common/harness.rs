//! Test harness built on the in-memory dependencies.
//!
//! Every test gets fresh mocks, so nothing leaks between tests.

use registration_core::domains::member::{
    create_member, Member, ProfileFieldValues, RegistrationError, RegistrationValues,
    RequestContext,
};
use registration_core::kernel::TestDependencies;
use test_context::AsyncTestContext;

/// Route test output through the test writer, honoring RUST_LOG.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "registration_core=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Test harness with default settings and mock dependencies.
///
/// # Example using test-context
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &TestHarness) {
///     let member = ctx.register(valid_form()).await.unwrap();
/// }
/// ```
pub struct TestHarness {
    pub deps: TestDependencies,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::with_deps(TestDependencies::new())
    }
}

impl TestHarness {
    pub fn with_deps(deps: TestDependencies) -> Self {
        init_tracing();
        Self { deps }
    }

    /// Register with no profile fields, pending post or request headers.
    pub async fn register(&self, values: RegistrationValues) -> Result<Member, RegistrationError> {
        self.register_with(values, ProfileFieldValues::new(), &RequestContext::default())
            .await
    }

    pub async fn register_with(
        &self,
        values: RegistrationValues,
        profile_fields: ProfileFieldValues,
        request: &RequestContext,
    ) -> Result<Member, RegistrationError> {
        create_member(values, profile_fields, None, request, &self.deps.into_deps()).await
    }
}
