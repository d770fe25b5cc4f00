//! Submitted registration form data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const USERNAME: &str = "username";
pub const EMAIL_ADDRESS: &str = "email_address";
pub const PASSWORD: &str = "password";
pub const ADMIN_MAILS: &str = "reg_admin_mails";
pub const SECURITY_QUESTIONS_OPT_OUT: &str = "security_questions_optout";
/// Name the opt-out checkbox carries on the stock registration template.
pub const SECURITY_QUESTIONS_OPT_OUT_TITLE: &str = "security_questions_optout_title";

/// Raw form values keyed by field name. Profile steps may rewrite them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationValues(BTreeMap<String, String>);

impl RegistrationValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value with surrounding whitespace removed; blank counts as missing.
    pub fn get_trimmed(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Checkbox semantics: `1`, `true`, `on` and `yes` are ticked.
    pub fn is_checked(&self, key: &str) -> bool {
        matches!(
            self.get_trimmed(key).map(str::to_ascii_lowercase).as_deref(),
            Some("1" | "true" | "on" | "yes")
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RegistrationValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Custom profile field input keyed `field_<id>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileFieldValues(BTreeMap<String, String>);

impl ProfileFieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ProfileFieldValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Numeric id from a `field_<id>` key.
pub fn profile_field_id(key: &str) -> Option<i32> {
    key.strip_prefix("field_")?.parse().ok().filter(|id| *id > 0)
}

/// Request-scoped inputs that do not come from the form body.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Value of the `language` cookie.
    pub language_cookie: Option<String>,
    /// Raw `Accept-Language` header.
    pub accept_language: Option<String>,
    /// Session that editor uploads were attached to before the account existed.
    pub upload_session: Option<String>,
    /// Page the visitor came from, handed to the post-registration hook.
    pub referrer: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkbox_values() {
        let values: RegistrationValues = [("a", "1"), ("b", "On"), ("c", "0"), ("d", " ")]
            .into_iter()
            .collect();

        assert!(values.is_checked("a"));
        assert!(values.is_checked("b"));
        assert!(!values.is_checked("c"));
        assert!(!values.is_checked("d"));
        assert!(!values.is_checked("missing"));
    }

    #[test]
    fn test_get_trimmed_treats_blank_as_missing() {
        let values: RegistrationValues = [(EMAIL_ADDRESS, "   ")].into_iter().collect();
        assert!(values.contains(EMAIL_ADDRESS));
        assert_eq!(values.get_trimmed(EMAIL_ADDRESS), None);
    }

    #[test]
    fn test_profile_field_id() {
        assert_eq!(profile_field_id("field_12"), Some(12));
        assert_eq!(profile_field_id("field_"), None);
        assert_eq!(profile_field_id("field_x"), None);
        assert_eq!(profile_field_id("field_0"), None);
        assert_eq!(profile_field_id("custom_3"), None);
    }

    #[test]
    fn test_values_deserialize_from_flat_object() {
        let values: RegistrationValues =
            serde_json::from_str(r#"{"username":"jane","email_address":"jane@example.org"}"#)
                .unwrap();
        assert_eq!(values.get(USERNAME), Some("jane"));
    }
}
