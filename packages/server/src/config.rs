use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use dotenvy::dotenv;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub answer_encryption_key: String,
    pub disposable_email: DisposableEmailConfig,
    pub registration: RegistrationSettings,
}

/// Settings for the outbound disposable email checker.
#[derive(Debug, Clone)]
pub struct DisposableEmailConfig {
    pub endpoint: String,
    pub token_type: String,
    /// `None` disables the checker entirely.
    pub api_token: Option<String>,
    pub timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            answer_encryption_key: env::var("ANSWER_ENCRYPTION_KEY")
                .context("ANSWER_ENCRYPTION_KEY must be set")?,
            disposable_email: DisposableEmailConfig {
                endpoint: env::var("DISPOSABLE_EMAIL_ENDPOINT")
                    .unwrap_or_else(|_| disposable_email::DEFAULT_ENDPOINT.to_string()),
                token_type: env::var("DISPOSABLE_EMAIL_TOKEN_TYPE")
                    .unwrap_or_else(|_| "TOKEN TYPE".to_string()),
                api_token: env::var("DISPOSABLE_EMAIL_API_TOKEN")
                    .ok()
                    .filter(|token| !token.trim().is_empty()),
                timeout: checker_timeout(env::var("DISPOSABLE_EMAIL_TIMEOUT_SECS").ok().as_deref())?,
            },
            registration: RegistrationSettings::from_env()?,
        })
    }
}

/// Site-wide switches consulted while creating a member.
#[derive(Debug, Clone)]
pub struct RegistrationSettings {
    pub registration_mode: RegistrationMode,
    pub default_member_group: i32,
    pub security_questions_enabled: bool,
    pub security_questions_prompt: SecurityQuestionPrompt,
    pub privacy_policy_mode: PrivacyPolicyMode,
    pub validation_mode: ValidationMode,
    /// Locale codes of the installed languages, in preference order.
    pub installed_languages: Vec<String>,
    pub email_check_failure_policy: EmailCheckFailurePolicy,
}

impl Default for RegistrationSettings {
    fn default() -> Self {
        Self {
            registration_mode: RegistrationMode::Normal,
            default_member_group: 3,
            security_questions_enabled: false,
            security_questions_prompt: SecurityQuestionPrompt::Optional,
            privacy_policy_mode: PrivacyPolicyMode::Internal,
            validation_mode: ValidationMode::User,
            installed_languages: vec!["en-US".to_string()],
            email_check_failure_policy: EmailCheckFailurePolicy::FailOpen,
        }
    }
}

impl RegistrationSettings {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            registration_mode: parse_var("REGISTRATION_MODE", defaults.registration_mode)?,
            default_member_group: parse_var("DEFAULT_MEMBER_GROUP", defaults.default_member_group)?,
            security_questions_enabled: parse_var(
                "SECURITY_QUESTIONS_ENABLED",
                defaults.security_questions_enabled,
            )?,
            security_questions_prompt: parse_var(
                "SECURITY_QUESTIONS_PROMPT",
                defaults.security_questions_prompt,
            )?,
            privacy_policy_mode: parse_var("PRIVACY_POLICY_MODE", defaults.privacy_policy_mode)?,
            validation_mode: parse_var("VALIDATION_MODE", defaults.validation_mode)?,
            installed_languages: env::var("INSTALLED_LANGUAGES")
                .map(|raw| parse_language_list(&raw))
                .unwrap_or(defaults.installed_languages),
            email_check_failure_policy: parse_var(
                "DISPOSABLE_EMAIL_FAILURE_POLICY",
                defaults.email_check_failure_policy,
            )?,
        })
    }

    /// Security questions are asked on the registration form itself.
    pub fn security_questions_at_registration(&self) -> bool {
        self.security_questions_enabled
            && matches!(
                self.security_questions_prompt,
                SecurityQuestionPrompt::Register | SecurityQuestionPrompt::Optional
            )
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Into<anyhow::Error>,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|e| {
            let err: anyhow::Error = e.into();
            err.context(format!("{} has an invalid value", name))
        }),
        Err(_) => Ok(default),
    }
}

/// Checker request timeout in whole seconds; must be at least 1.
fn checker_timeout(raw: Option<&str>) -> Result<Duration> {
    let secs: u64 = match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .context("DISPOSABLE_EMAIL_TIMEOUT_SECS must be a valid number")?,
        None => 5,
    };

    if secs == 0 {
        bail!("DISPOSABLE_EMAIL_TIMEOUT_SECS must be greater than 0");
    }

    Ok(Duration::from_secs(secs))
}

fn parse_language_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationMode {
    Normal,
    Full,
    Redirect,
    Disabled,
}

impl RegistrationMode {
    pub fn is_enabled(self) -> bool {
        self != RegistrationMode::Disabled
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Full => "full",
            Self::Redirect => "redirect",
            Self::Disabled => "disabled",
        }
    }
}

impl FromStr for RegistrationMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "full" => Ok(Self::Full),
            "redirect" => Ok(Self::Redirect),
            "disabled" => Ok(Self::Disabled),
            other => bail!("unknown registration mode: {}", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityQuestionPrompt {
    Register,
    Optional,
    Never,
}

impl FromStr for SecurityQuestionPrompt {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "register" => Ok(Self::Register),
            "optional" => Ok(Self::Optional),
            "never" | "none" => Ok(Self::Never),
            other => bail!("unknown security question prompt: {}", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivacyPolicyMode {
    None,
    Internal,
    External,
}

impl FromStr for PrivacyPolicyMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "internal" => Ok(Self::Internal),
            "external" => Ok(Self::External),
            other => bail!("unknown privacy policy mode: {}", other),
        }
    }
}

/// Who has to approve a new account before it is fully active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    None,
    User,
    Admin,
    UserAdmin,
}

impl ValidationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::User => "user",
            Self::Admin => "admin",
            Self::UserAdmin => "user_admin",
        }
    }
}

impl FromStr for ValidationMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "user_admin" => Ok(Self::UserAdmin),
            other => bail!("unknown validation mode: {}", other),
        }
    }
}

/// What to do when the disposable email checker cannot give an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailCheckFailurePolicy {
    FailOpen,
    FailClosed,
}

impl FromStr for EmailCheckFailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "fail_open" | "open" => Ok(Self::FailOpen),
            "fail_closed" | "closed" => Ok(Self::FailClosed),
            other => Err(anyhow!("unknown email check failure policy: {}", other)),
        }
    }
}
