//! Resource routes: one generic controller behind slug-parameterized paths.
//! The static `/schema` and `/columns` segments are registered ahead of the
//! `/:id` capture so they are never shadowed by it.

use crate::auth::require_auth;
use crate::handlers::resource::{columns, destroy, index, schema, show, store, update};
use crate::state::AppState;
use axum::{middleware, routing::get, Router};

pub fn resource_routes(state: AppState) -> Router {
    Router::new()
        .route("/:resource", get(index).post(store))
        .route("/:resource/schema", get(schema))
        .route("/:resource/columns", get(columns))
        .route(
            "/:resource/:id",
            get(show).put(update).patch(update).delete(destroy),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
}
