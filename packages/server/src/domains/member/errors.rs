use thiserror::Error;

/// Reasons a registration attempt did not produce a member
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Email address is required.")]
    EmailRequired,

    #[error("Disposable email addresses are not allowed.")]
    DisposableEmail,

    #[error("We could not verify your email address right now. Please try again later.")]
    EmailCheckUnavailable,

    #[error("Unknown profile field: {0}")]
    UnknownProfileField(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl RegistrationError {
    /// Stable code shown to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmailRequired => "email_required_error",
            Self::DisposableEmail => "disposable_email_error",
            Self::EmailCheckUnavailable => "email_check_unavailable",
            Self::UnknownProfileField(_) => "unknown_profile_field",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Whether the message is safe to show the person filling in the form.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }
}
