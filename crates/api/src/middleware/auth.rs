//! HTTP Basic authentication extractor for Axum handlers.
//!
//! Operator credentials come from [`ServerConfig`](crate::config::ServerConfig);
//! there is no user database. Add [`AuthOperator`] as an extractor
//! parameter to any handler that requires authentication.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use base64::Engine;

use crate::state::AppState;

/// Authenticated operator extracted from an `Authorization: Basic` header.
#[derive(Debug, Clone)]
pub struct AuthOperator {
    /// The authenticated username.
    pub username: String,
}

/// 401 response carrying a `WWW-Authenticate` challenge so browsers show
/// the credential prompt.
#[derive(Debug)]
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Basic realm=\"Login Required\"")],
            axum::Json(serde_json::json!({
                "error": "Authentication required",
                "code": "UNAUTHORIZED",
            })),
        )
            .into_response()
    }
}

/// Parse `Basic <base64(user:pass)>` into its credential pair.
fn decode_basic(auth_header: &str) -> Option<(String, String)> {
    let encoded = auth_header.strip_prefix("Basic ")?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (username, password) = credentials.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

impl FromRequestParts<AppState> for AuthOperator {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthRejection)?;

        let (username, password) = decode_basic(header_value).ok_or(AuthRejection)?;

        if username != state.config.auth_username || password != state.config.auth_password {
            tracing::warn!(%username, "Rejected Basic auth attempt");
            return Err(AuthRejection);
        }

        Ok(AuthOperator { username })
    }
}
