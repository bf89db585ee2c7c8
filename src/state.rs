//! Shared application state. The registry is built once at startup and read
//! only for the process lifetime.

use crate::registry::ResourceRegistry;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub registry: Arc<ResourceRegistry>,
    /// Expected bearer token; `None` accepts any non-empty credential
    /// (verification delegated to an upstream issuer/proxy).
    pub api_token: Option<String>,
}
