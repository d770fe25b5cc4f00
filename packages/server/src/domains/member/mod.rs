//! Member domain - creates member accounts from the registration form
//!
//! Architecture:
//!   HTTP route → activities::create_member → kernel traits (storage, history,
//!   email verifier, encryptor, post-registration hook)

pub mod activities;
pub mod data;
pub mod errors;
pub mod models;
pub mod profile_steps;
pub mod values;

// Re-export commonly used types
pub use activities::create_member;
pub use data::MemberData;
pub use errors::RegistrationError;
pub use models::member::Member;
pub use values::{ProfileFieldValues, RegistrationValues, RequestContext};
