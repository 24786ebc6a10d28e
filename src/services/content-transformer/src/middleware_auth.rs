use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::debug;

use crate::{
    error::AppError,
    sessions::{is_valid_session_id, AnonymousSession, SESSION_HEADER},
    supabase::Session,
    AppState,
};

const UNKNOWN: &str = "unknown";

/// Access token from the `Authorization` header, with any `Bearer ` prefix
/// removed
pub fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Raw bearer token, if the caller sent one; not validated
#[derive(Debug, Clone)]
pub struct BearerToken(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(BearerToken(extract_bearer(&parts.headers)))
    }
}

/// Caller details recorded with security events
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientMeta {
    pub ip_address: String,
    pub user_agent: String,
}

impl ClientMeta {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header_value = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Self {
            ip_address: header_value("x-forwarded-for")
                .or_else(|| header_value("x-real-ip"))
                .unwrap_or_else(|| UNKNOWN.to_string()),
            user_agent: header_value(header::USER_AGENT.as_str())
                .unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientMeta::from_headers(&parts.headers))
    }
}

/// Signed-in caller, or `None` for anonymous requests
///
/// A token that Supabase rejects fails the request with 401 rather than
/// silently downgrading to anonymous.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<Session>);

async fn resolve_session(parts: &Parts, state: &AppState) -> Result<Option<Session>, AppError> {
    let Some(token) = extract_bearer(&parts.headers) else {
        return Ok(None);
    };

    let Some(supabase) = &state.supabase else {
        debug!("Ignoring bearer token: Supabase is not configured");
        return Ok(None);
    };

    // The anon key is sent as a bearer by browser clients that are not
    // signed in
    if supabase.is_anon_key(&token) {
        return Ok(None);
    }

    let user = supabase
        .get_user(&token)
        .await
        .map_err(|_| AppError::Unauthorized("Invalid authentication".to_string()))?;
    debug!("Authenticated user {}", user.id);

    Ok(Some(Session {
        user,
        access_token: token,
    }))
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(resolve_session(parts, state).await?))
    }
}

/// Anonymous browser session named by the `X-Session-Id` header
#[derive(Clone)]
pub struct BrowserSession(pub Arc<AnonymousSession>);

fn browser_session(parts: &Parts, state: &AppState) -> Result<BrowserSession, AppError> {
    let id = parts
        .headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .unwrap_or_default();

    if !is_valid_session_id(id) {
        return Err(AppError::ValidationError(
            "A valid X-Session-Id header is required for anonymous requests".to_string(),
        ));
    }

    Ok(BrowserSession(state.anonymous.session(id)))
}

#[async_trait]
impl FromRequestParts<AppState> for BrowserSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        browser_session(parts, state)
    }
}

/// Whoever owns the history a request reads or writes
#[derive(Clone)]
pub enum Caller {
    User(Session),
    Anonymous(Arc<AnonymousSession>),
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match resolve_session(parts, state).await? {
            Some(session) => Ok(Caller::User(session)),
            None => Ok(Caller::Anonymous(browser_session(parts, state)?.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_bearer() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer(&headers).as_deref(), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("raw-token"));
        assert_eq!(extract_bearer(&headers).as_deref(), Some("raw-token"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer(&headers), None);
    }

    #[test]
    fn test_client_meta_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            ClientMeta::from_headers(&headers),
            ClientMeta {
                ip_address: "unknown".into(),
                user_agent: "unknown".into()
            }
        );

        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        headers.insert(header::USER_AGENT, HeaderValue::from_static("curl/8"));
        assert_eq!(ClientMeta::from_headers(&headers).ip_address, "10.0.0.2");

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7"));
        let meta = ClientMeta::from_headers(&headers);
        assert_eq!(meta.ip_address, "203.0.113.7");
        assert_eq!(meta.user_agent, "curl/8");
    }
}
