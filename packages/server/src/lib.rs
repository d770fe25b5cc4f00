// Member Registration Service - Core
//
// This crate creates forum member accounts: form validation, disposable email
// screening, identity reservation, profile steps, security questions, consent
// logging and the post-registration hand-off.
//
// Collaborators (storage, email checker, encryption, hooks) are injected
// through kernel::ServerDeps.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
