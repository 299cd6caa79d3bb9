use std::path::Path;

use axum::Router;

use crate::state::SharedState;

/// Swagger UI and OpenAPI JSON.
pub mod docs;
/// Health check route.
pub mod health;
/// Static host and viewer pages.
pub mod pages;
/// Room state API.
pub mod rooms;

/// Compose all route trees, wiring in shared state and documentation routes.
///
/// Page routes are only mounted when `static_dir` is given and exists.
pub fn router(state: SharedState, static_dir: Option<&Path>) -> Router<()> {
    let mut api_router = health::router().merge(rooms::router());

    if let Some(pages) = static_dir.and_then(pages::router) {
        api_router = api_router.merge(pages);
    }

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
