//! Registration form fixtures.

use chrono::Utc;
use registration_core::common::PendingPostId;
use registration_core::domains::member::models::PendingPost;
use registration_core::domains::member::RegistrationValues;

/// A complete, valid registration form
pub fn valid_form() -> RegistrationValues {
    [
        ("username", "jane"),
        ("email_address", "jane@example.org"),
        ("password", "correct horse battery staple"),
    ]
    .into_iter()
    .collect()
}

/// `valid_form` with extra or overridden values
pub fn form_with(extra: &[(&str, &str)]) -> RegistrationValues {
    let mut values = valid_form();
    for (key, value) in extra {
        values.set(*key, *value);
    }
    values
}

pub fn pending_post(email: &str) -> PendingPost {
    PendingPost {
        id: PendingPostId::new(),
        email: email.to_string(),
        content_class: "topic".to_string(),
        content_id: 42,
        member_id: None,
        created_at: Utc::now(),
    }
}
