//! Registration endpoint.

use axum::{
    extract::Extension,
    http::{
        header::{ACCEPT_LANGUAGE, COOKIE, REFERER},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::common::PendingPostId;
use crate::domains::member::{
    create_member, MemberData, ProfileFieldValues, RegistrationError, RegistrationValues,
    RequestContext,
};
use crate::server::app::AppState;

/// Header carrying the session editor uploads were stored under.
pub const UPLOAD_SESSION_HEADER: &str = "x-upload-session";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub values: RegistrationValues,
    #[serde(default)]
    pub profile_fields: ProfileFieldValues,
    pub pending_post_id: Option<PendingPostId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error_code: String,
    pub message: String,
}

pub struct ApiError(RegistrationError);

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RegistrationError::EmailRequired | RegistrationError::DisposableEmail => {
                StatusCode::FORBIDDEN
            }
            RegistrationError::EmailCheckUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            RegistrationError::UnknownProfileField(_) => StatusCode::BAD_REQUEST,
            RegistrationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if self.0.is_user_facing() {
            self.0.to_string()
        } else {
            error!(error = %self.0, "Registration failed");
            "Registration failed. Please try again later.".to_string()
        };

        let body = ErrorBody {
            error_code: self.0.code().to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// Create a member from a submitted registration form.
pub async fn register_handler(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MemberData>), ApiError> {
    let context = request_context(&headers);

    let pending_post = match request.pending_post_id {
        Some(id) => {
            let post = state
                .deps
                .store
                .find_pending_post(id)
                .await
                .map_err(RegistrationError::from)?;
            if post.is_none() {
                warn!(post_id = %id, "Pending post not found, registering without it");
            }
            post
        }
        None => None,
    };

    let member = create_member(
        request.values,
        request.profile_fields,
        pending_post,
        &context,
        &state.deps,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(MemberData::from(member))))
}

fn request_context(headers: &HeaderMap) -> RequestContext {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    RequestContext {
        language_cookie: headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|cookies| cookie_value(cookies, "language")),
        accept_language: header(ACCEPT_LANGUAGE.as_str()),
        upload_session: header(UPLOAD_SESSION_HEADER),
        referrer: header(REFERER.as_str()),
    }
}

fn cookie_value(cookies: &str, name: &str) -> Option<String> {
    cookies
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_value() {
        assert_eq!(
            cookie_value("session=abc; language=de-DE", "language"),
            Some("de-DE".to_string())
        );
        assert_eq!(cookie_value("languages=fr", "language"), None);
        assert_eq!(cookie_value("language=", "language"), None);
    }

    #[test]
    fn test_request_context_reads_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("language=fr-FR"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.8"));
        headers.insert(UPLOAD_SESSION_HEADER, HeaderValue::from_static("sess-1"));
        headers.insert(REFERER, HeaderValue::from_static("https://forum.example/thread/4"));

        let context = request_context(&headers);

        assert_eq!(context.language_cookie.as_deref(), Some("fr-FR"));
        assert_eq!(context.accept_language.as_deref(), Some("en-US,en;q=0.8"));
        assert_eq!(context.upload_session.as_deref(), Some("sess-1"));
        assert_eq!(
            context.referrer.as_deref(),
            Some("https://forum.example/thread/4")
        );
    }
}
