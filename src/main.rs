//! Family Feud room server entrypoint: room state API, health check, docs and
//! static pages.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use family_feud_back::{
    config::{AppConfig, ServerConfig},
    dao::room_store::{MemoryRoomStore, RoomStore},
    routes,
    services::room_sweeper,
    state::{AppState, SharedState},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let rooms: Arc<dyn RoomStore> = Arc::new(MemoryRoomStore::with_limit(config.server.max_rooms));
    let app_state = AppState::new(rooms.clone());

    tokio::spawn(room_sweeper::run(
        rooms,
        config.server.room_ttl,
        config.server.sweep_interval,
    ));
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state, &config.server);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState, server: &ServerConfig) -> Router<()> {
    routes::router(state, Some(server.static_dir.as_path()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
