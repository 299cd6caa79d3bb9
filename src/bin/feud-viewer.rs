//! Terminal viewer: mirror a room's board until interrupted.
//!
//! Usage: `feud-viewer [CODE]`. Without a code the room this device last
//! joined is used.

use std::{env, sync::Arc};

use anyhow::Context;
use family_feud_back::{
    config::AppConfig,
    services::{
        board::TerminalRenderer,
        viewer_service::{ConnectionStatus, ViewerController},
    },
    state::room::{Role, RoomCode},
    sync::{FileStore, LocalStore, StateReader, remote, session},
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let local: Arc<dyn LocalStore> = Arc::new(
        FileStore::open(&config.client.storage_dir).context("opening local storage")?,
    );

    let room = match env::args().nth(1) {
        Some(raw) => {
            let room = RoomCode::parse(&raw)?;
            session::join_room(local.as_ref(), &room, Role::Viewer)?;
            Some(room)
        }
        None => session::current_room(local.as_ref())?.map(|(room, _)| room),
    };

    let remote = remote::connect(config.client.server_url.as_deref())
        .context("building room server client")?;
    let reader = StateReader::new(local, remote);
    let renderer = TerminalRenderer::new(std::io::stdout(), true);

    let viewer = ViewerController::new(room, reader, renderer)
        .context("run `feud-viewer CODE` with the code shown by the host")?;
    let room = viewer.room().clone();
    eprintln!("Watching room {room}. Press Ctrl+C to stop.");

    let handle = viewer.spawn(config.client.poll_interval);
    let mut status = handle.status();
    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                match *status.borrow_and_update() {
                    ConnectionStatus::Connected => eprintln!("Connected to room {room}."),
                    ConnectionStatus::Waiting => eprintln!("Waiting for host..."),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.shutdown().await;
    info!(room = %room, "viewer stopped");
    Ok(())
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
