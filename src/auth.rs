//! Bearer-token authentication. Token issuance is an external concern; this
//! layer only checks that a credential is presented and matches the
//! configured token.

use crate::error::AppError;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

/// Extractor for the optional `Authorization: Bearer <token>` credential.
#[derive(Clone, Debug)]
pub struct BearerToken(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(BearerToken(bearer_from_parts(parts)))
    }
}

fn bearer_from_parts(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Middleware guarding all resource routes: a missing or mismatched bearer
/// token is rejected with `UNAUTHENTICATED`/401 in the envelope shape.
pub async fn require_auth(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token =
        token.ok_or_else(|| AppError::Unauthenticated("missing bearer token".into()))?;
    if let Some(expected) = &state.api_token {
        if token != *expected {
            return Err(AppError::Unauthenticated("invalid bearer token".into()));
        }
    }
    Ok(next.run(request).await)
}
