//! Bearer-token authentication for handlers.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::debug;

use crate::domain::Caller;

use super::error::ApiError;
use super::routes::ServerContext;

const LOG_TARGET: &str = "server::auth";

/// Caller resolved from `Authorization: Bearer <token>`, along with the token
/// itself so logout can revoke it.
#[derive(Debug, Clone)]
pub struct Session {
    pub caller: Caller,
    pub token: String,
}

pub fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .extensions
            .get::<Arc<ServerContext>>()
            .cloned()
            .ok_or_else(|| ApiError::internal("server context missing"))?;

        let Some(token) = bearer_token(parts).map(str::to_owned) else {
            debug!(target: LOG_TARGET, path = %parts.uri.path(), "missing bearer token");
            return Err(ApiError::unauthorized("missing bearer token"));
        };

        let caller = ctx.registry.authenticate(&token).await?;
        Ok(Session { caller, token })
    }
}
