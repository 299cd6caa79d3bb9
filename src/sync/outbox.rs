//! Background delivery of host snapshots to the remote store.
//!
//! The outbox only ever holds the newest snapshot: submitting while a delivery
//! is retrying supersedes the pending one, so the remote replica converges on
//! the latest host state without replaying history.

use std::{sync::Arc, time::Duration};

use tokio::{sync::watch, task::JoinHandle, time::sleep};
use tracing::{debug, warn};

use crate::state::{game::GameState, room::RoomCode};

use super::remote::RemoteStore;

const INITIAL_DELAY: Duration = Duration::from_millis(500);
const MAX_DELAY: Duration = Duration::from_secs(8);

/// Handle feeding snapshots to the delivery task.
pub struct Outbox {
    tx: watch::Sender<Option<GameState>>,
    worker: JoinHandle<()>,
}

impl Outbox {
    /// Spawn the delivery task for `room`. Must be called inside a Tokio runtime.
    pub fn spawn(remote: Arc<dyn RemoteStore>, room: RoomCode, max_attempts: u32) -> Self {
        let (tx, rx) = watch::channel(None);
        let worker = tokio::spawn(run(remote, room, rx, max_attempts.max(1)));
        Self { tx, worker }
    }

    /// Queue `state` for delivery, replacing any snapshot not yet delivered.
    pub fn submit(&self, state: GameState) {
        self.tx.send_replace(Some(state));
    }

    /// Stop accepting snapshots and wait until the last one has been handled.
    pub async fn close(self) {
        let Self { tx, worker } = self;
        drop(tx);
        if let Err(err) = worker.await {
            warn!(error = %err, "remote sync task ended abnormally");
        }
    }
}

async fn run(
    remote: Arc<dyn RemoteStore>,
    room: RoomCode,
    mut rx: watch::Receiver<Option<GameState>>,
    max_attempts: u32,
) {
    while rx.changed().await.is_ok() {
        let Some(snapshot) = rx.borrow_and_update().clone() else {
            continue;
        };
        deliver(remote.as_ref(), &room, snapshot, max_attempts, &rx).await;
    }
    debug!(room = %room, "remote sync task stopped");
}

/// Push one snapshot with bounded exponential backoff. Gives up early when a
/// newer snapshot is waiting.
async fn deliver(
    remote: &dyn RemoteStore,
    room: &RoomCode,
    snapshot: GameState,
    max_attempts: u32,
    rx: &watch::Receiver<Option<GameState>>,
) {
    let mut delay = INITIAL_DELAY;

    for attempt in 1..=max_attempts {
        match remote.push_state(room.clone(), snapshot.clone()).await {
            Ok(()) => return,
            Err(err) if attempt == max_attempts => {
                warn!(
                    room = %room,
                    revision = snapshot.revision,
                    attempt,
                    error = %err,
                    "failed to sync state to server; giving up on this snapshot"
                );
                return;
            }
            Err(err) => {
                warn!(room = %room, attempt, error = %err, "failed to sync state to server; retrying");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
                if rx.has_changed().unwrap_or(false) {
                    debug!(room = %room, "newer snapshot queued; dropping stale retry");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use futures::future::BoxFuture;

    use super::*;
    use crate::sync::error::{RemoteError, RemoteResult};

    #[derive(Default)]
    struct FlakyRemote {
        failures_left: AtomicU32,
        attempts: AtomicU32,
        delivered: Mutex<Vec<u64>>,
    }

    impl RemoteStore for Arc<FlakyRemote> {
        fn push_state(&self, _room: RoomCode, state: GameState) -> BoxFuture<'static, RemoteResult<()>> {
            let this = self.clone();
            Box::pin(async move {
                this.attempts.fetch_add(1, Ordering::SeqCst);
                let left = this.failures_left.load(Ordering::SeqCst);
                if left > 0 {
                    this.failures_left.store(left - 1, Ordering::SeqCst);
                    return Err(RemoteError::RequestStatus {
                        url: "test".into(),
                        status: 503,
                    });
                }
                this.delivered.lock().unwrap().push(state.revision);
                Ok(())
            })
        }

        fn fetch_state(&self, _room: RoomCode) -> BoxFuture<'static, RemoteResult<GameState>> {
            Box::pin(async { Ok(GameState::default()) })
        }

        fn delete_state(&self, _room: RoomCode) -> BoxFuture<'static, RemoteResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn revision(n: u64) -> GameState {
        GameState {
            revision: n,
            ..GameState::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_delivered() {
        let remote = Arc::new(FlakyRemote::default());
        remote.failures_left.store(2, Ordering::SeqCst);

        let outbox = Outbox::spawn(Arc::new(remote.clone()), RoomCode::parse("ROOM1").unwrap(), 3);
        outbox.submit(revision(1));
        outbox.close().await;

        assert_eq!(remote.attempts.load(Ordering::SeqCst), 3);
        assert_eq!(*remote.delivered.lock().unwrap(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let remote = Arc::new(FlakyRemote::default());
        remote.failures_left.store(10, Ordering::SeqCst);

        let outbox = Outbox::spawn(Arc::new(remote.clone()), RoomCode::parse("ROOM1").unwrap(), 2);
        outbox.submit(revision(1));
        outbox.close().await;

        assert_eq!(remote.attempts.load(Ordering::SeqCst), 2);
        assert!(remote.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn latest_snapshot_wins() {
        let remote = Arc::new(FlakyRemote::default());

        let outbox = Outbox::spawn(Arc::new(remote.clone()), RoomCode::parse("ROOM1").unwrap(), 1);
        outbox.submit(revision(1));
        outbox.submit(revision(2));
        outbox.submit(revision(3));
        outbox.close().await;

        let delivered = remote.delivered.lock().unwrap().clone();
        assert_eq!(delivered.last(), Some(&3));
        assert!(!delivered.contains(&2));
    }
}
