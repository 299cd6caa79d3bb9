use std::path::Path;

use axum::Router;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{info, warn};

use crate::state::SharedState;

/// Serve the landing, host and viewer pages plus any other file from
/// `static_dir`. Returns `None` when the directory does not exist.
pub fn router(static_dir: &Path) -> Option<Router<SharedState>> {
    if !static_dir.is_dir() {
        warn!(path = %static_dir.display(), "static directory missing; page routes disabled");
        return None;
    }
    info!(path = %static_dir.display(), "serving static pages");

    let page = |name: &str| ServeFile::new(static_dir.join(name));
    Some(
        Router::new()
            .route_service("/", page("index.html"))
            .route_service("/host", page("host.html"))
            .route_service("/viewer", page("viewer.html"))
            .fallback_service(ServeDir::new(static_dir)),
    )
}
