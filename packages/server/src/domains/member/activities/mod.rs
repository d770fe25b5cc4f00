//! Member domain activities - entry-point business logic
//!
//! Activities take raw request input, talk to infrastructure through
//! `ServerDeps` and return final models.

pub mod create_member;
pub mod post_registration;
pub mod security_questions;

pub use create_member::create_member;
pub use post_registration::ValidationPostRegistration;
pub use security_questions::record_security_questions;
