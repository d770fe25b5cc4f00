//! Kernel module - server infrastructure and dependencies.

pub mod crypto;
pub mod deps;
pub mod locale;
pub mod pg_store;
pub mod test_dependencies;
pub mod traits;

pub use crypto::{hash_password, verify_password, AesGcmEncryptor, CryptoError};
pub use deps::{DisposableEmailAdapter, NoopEmailVerifier, ServerDeps};
pub use locale::auto_detect_language;
pub use pg_store::PgRegistrationStore;
pub use test_dependencies::TestDependencies;
pub use traits::*;
