//! Terminal host console: create or resume a room and drive its game.
//!
//! Usage: `feud-host [new | join CODE]`. Without arguments the room this
//! device last hosted is resumed, or a new one is created.

use std::{env, io::Write, sync::Arc};

use anyhow::{Context, bail};
use family_feud_back::{
    config::AppConfig,
    services::{
        host_console::{self, HELP, HostCommand, Outcome},
        host_service::{HostError, HostSession},
    },
    state::{
        bank::QuestionBank,
        room::{Role, RoomCode},
    },
    sync::{FileStore, LocalStore, StateSync, remote, session},
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let local: Arc<dyn LocalStore> = Arc::new(
        FileStore::open(&config.client.storage_dir).context("opening local storage")?,
    );
    let room = pick_room(local.as_ref())?;

    let bank = match QuestionBank::load(&config.client.question_bank) {
        Ok(bank) => bank,
        Err(err) => {
            warn!(error = %err, "question bank unavailable; only custom questions can be played");
            QuestionBank::default()
        }
    };
    let remote = remote::connect(config.client.server_url.as_deref())
        .context("building room server client")?;
    let sync = StateSync::new(room, local, remote, config.client.write_policy);
    let mut session = HostSession::open(bank, sync).await;

    println!("Hosting room {}. Viewers join with this code.", session.room());
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let Some(line) = lines.next_line().await.context("reading console input")? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<HostCommand>() {
            Ok(command) => command,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };

        match host_console::apply(&mut session, command) {
            Ok(Outcome::Continue(message)) => println!("{message}"),
            Ok(Outcome::Quit) => break,
            Ok(Outcome::End) => {
                let room = session.room().clone();
                session.end_room().await.context("ending room")?;
                println!("Room {room} ended.");
                return Ok(());
            }
            Err(HostError::Game(err)) => println!("{err}"),
            Err(err @ HostError::Persist(_)) => {
                return Err(err).context("game state can no longer be saved");
            }
        }
    }

    println!("Leaving room {} running.", session.room());
    session.close().await;
    Ok(())
}

/// Resolve the room from the command line and the device's session keys.
fn pick_room(local: &dyn LocalStore) -> anyhow::Result<RoomCode> {
    let args: Vec<String> = env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["new"] => Ok(session::create_room(local)?),
        ["join", code] => {
            let room = RoomCode::parse(code)?;
            session::join_room(local, &room, Role::Host)?;
            Ok(room)
        }
        [] => match session::current_room(local)? {
            Some((room, Role::Host)) => Ok(room),
            _ => Ok(session::create_room(local)?),
        },
        _ => bail!("usage: feud-host [new | join CODE]"),
    }
}

fn prompt() -> anyhow::Result<()> {
    print!("> ");
    std::io::stdout().flush().context("writing prompt")
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
