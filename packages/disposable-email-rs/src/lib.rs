// Client for the api-aries disposable email checker.
// https://support.api-aries.online/hc/articles/1/3/3/email-checker

use std::time::Duration;

pub mod models;
use reqwest::{header, Client, StatusCode};
use thiserror::Error;
use tracing::debug;

use crate::models::{CheckerResponse, Verdict};

pub const DEFAULT_ENDPOINT: &str = "https://api.api-aries.online/v1/checkers/proxy/email/";

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),

    #[error("Disposable email checker timed out")]
    Timeout,

    #[error("Request to disposable email checker failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Disposable email checker returned status {0}")]
    Status(u16),

    #[error("Failed to parse disposable email checker response: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("Disposable email checker response has no verdict")]
    MissingVerdict,
}

impl From<reqwest::Error> for CheckError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CheckError::Timeout
        } else {
            CheckError::Transport(e)
        }
    }
}

#[derive(Debug, Clone)]
pub struct DisposableEmailOptions {
    pub endpoint: String,
    pub token_type: String,
    pub api_token: String,
    pub timeout: Duration,
}

impl DisposableEmailOptions {
    pub fn new(token_type: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token_type: token_type.into(),
            api_token: api_token.into(),
            timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DisposableEmailService {
    options: DisposableEmailOptions,
    client: Client,
}

impl DisposableEmailService {
    pub fn new(options: DisposableEmailOptions) -> Result<Self, CheckError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "Type",
            options
                .token_type
                .parse()
                .map_err(|_| CheckError::InvalidHeader("Type"))?,
        );
        let mut token: header::HeaderValue = options
            .api_token
            .parse()
            .map_err(|_| CheckError::InvalidHeader("APITOKEN"))?;
        token.set_sensitive(true);
        headers.insert("APITOKEN", token);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(options.timeout)
            .build()
            .map_err(CheckError::Client)?;

        Ok(Self { options, client })
    }

    /// Ask the checker whether `email` belongs to a throwaway mail provider.
    ///
    /// Only a 200 response carrying `"disposable": "yes"` (any case) counts as
    /// disposable. Every other outcome is either `Deliverable` or an error so
    /// the caller decides how to treat an unreachable checker.
    pub async fn check(&self, email: &str) -> Result<Verdict, CheckError> {
        let response = self
            .client
            .get(&self.options.endpoint)
            .query(&[("email", email)])
            .send()
            .await?;

        let status = response.status();
        debug!(status = status.as_u16(), "Disposable email checker responded");

        if status != StatusCode::OK {
            return Err(CheckError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: CheckerResponse = serde_json::from_str(&body).map_err(CheckError::Malformed)?;

        parsed.verdict().ok_or(CheckError::MissingVerdict)
    }
}
