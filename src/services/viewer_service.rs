//! Viewer side of a room: a read-only mirror refreshed by polling.

use std::time::Duration;

use thiserror::Error;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, info, warn};

use crate::{
    state::{game::GameState, room::RoomCode},
    sync::StateReader,
};

/// Period shared by the poll loop and the connection check.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Errors preventing a viewer from starting.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// No room was joined on this device; the viewer has nothing to mirror.
    #[error("no room code found; join a room from the landing page first")]
    MissingRoomCode,
}

/// Whether the host's state is currently reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Some replica holds state for the room.
    Connected,
    /// Nothing found yet.
    Waiting,
}

/// Sink receiving every applied snapshot.
pub trait Renderer: Send + 'static {
    /// Draw `state`.
    fn render(&mut self, state: &GameState);
}

/// Decide whether `incoming` supersedes the last applied snapshot.
///
/// Newer revisions win. Unversioned snapshots (revision 0 on both sides) fall
/// back to structural comparison.
pub fn is_newer(last: Option<&GameState>, incoming: &GameState) -> bool {
    match last {
        None => true,
        Some(last) if incoming.revision > last.revision => true,
        Some(last) => incoming.revision == 0 && last.revision == 0 && incoming != last,
    }
}

/// Poll-and-render loop for one room.
pub struct ViewerController<R> {
    room: RoomCode,
    reader: StateReader,
    renderer: R,
    last_applied: Option<GameState>,
}

impl<R: Renderer> ViewerController<R> {
    /// Build a viewer for `room`. A missing room code is fatal.
    pub fn new(
        room: Option<RoomCode>,
        reader: StateReader,
        renderer: R,
    ) -> Result<Self, ViewerError> {
        let room = room.ok_or(ViewerError::MissingRoomCode)?;
        Ok(Self {
            room,
            reader,
            renderer,
            last_applied: None,
        })
    }

    /// Room being mirrored.
    pub fn room(&self) -> &RoomCode {
        &self.room
    }

    /// Snapshot most recently rendered.
    pub fn last_applied(&self) -> Option<&GameState> {
        self.last_applied.as_ref()
    }

    /// Renderer receiving the snapshots.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Read once and re-render if the state moved forward. Returns whether a
    /// render happened.
    pub async fn poll_once(&mut self) -> bool {
        let Some(state) = self.reader.read(&self.room).await else {
            // The room was ended or never existed; a recreated room starts its
            // revisions over, so forget the guard.
            if self.last_applied.take().is_some() {
                info!(room = %self.room, "room state disappeared");
            }
            return false;
        };

        if !is_newer(self.last_applied.as_ref(), &state) {
            if let Some(last) = &self.last_applied {
                if state.revision < last.revision {
                    debug!(
                        room = %self.room,
                        stale = state.revision,
                        applied = last.revision,
                        "ignoring stale snapshot"
                    );
                }
            }
            return false;
        }

        self.renderer.render(&state);
        self.last_applied = Some(state);
        true
    }

    /// Run the poll loop and the connection check on their own timers until
    /// [`ViewerHandle::shutdown`] is called.
    pub fn spawn(self, period: Duration) -> ViewerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Waiting);

        let status_task = tokio::spawn(run_connection_check(
            self.reader.clone(),
            self.room.clone(),
            period,
            status_tx,
            shutdown_rx.clone(),
        ));
        let poll_task = tokio::spawn(run_poll_loop(self, period, shutdown_rx));

        ViewerHandle {
            status: status_rx,
            shutdown: shutdown_tx,
            tasks: vec![poll_task, status_task],
        }
    }
}

/// Check both replicas once.
pub async fn check_connection(reader: &StateReader, room: &RoomCode) -> ConnectionStatus {
    match reader.read(room).await {
        Some(_) => ConnectionStatus::Connected,
        None => ConnectionStatus::Waiting,
    }
}

async fn run_poll_loop<R: Renderer>(
    mut viewer: ViewerController<R>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                viewer.poll_once().await;
            }
            _ = shutdown.changed() => break,
        }
    }
    debug!(room = %viewer.room, "viewer poll loop stopped");
}

async fn run_connection_check(
    reader: StateReader,
    room: RoomCode,
    period: Duration,
    status: watch::Sender<ConnectionStatus>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let next = check_connection(&reader, &room).await;
                status.send_if_modified(|current| {
                    if *current == next {
                        return false;
                    }
                    *current = next;
                    true
                });
            }
            _ = shutdown.changed() => break,
        }
    }
}

/// Running viewer tasks.
pub struct ViewerHandle {
    status: watch::Receiver<ConnectionStatus>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl ViewerHandle {
    /// Subscribe to connection status changes.
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Stop both timers and wait for them to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            if let Err(err) = task.await {
                warn!(error = %err, "viewer task ended abnormally");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::{
        services::host_service::HostSession,
        state::{
            bank::QuestionBank,
            game::{Answer, Question, Team},
        },
        sync::{
            LocalStore, MemoryStore, StateSync, WritePolicy, state_key,
            testing::{FakeRemote, remote_of},
        },
    };

    #[derive(Clone, Default)]
    struct RecordingRenderer {
        frames: Arc<Mutex<Vec<GameState>>>,
    }

    impl Renderer for RecordingRenderer {
        fn render(&mut self, state: &GameState) {
            self.frames.lock().unwrap().push(state.clone());
        }
    }

    fn room() -> RoomCode {
        RoomCode::parse("VIEW01").unwrap()
    }

    fn snapshot(strikes: u32, revision: u64) -> GameState {
        GameState {
            current: Some(Question {
                question: "Name a fruit".into(),
                answers: vec![Answer {
                    text: "Apple".into(),
                    points: 40,
                }],
            }),
            strikes,
            score_a: 15,
            score_b: 5,
            revision,
            ..GameState::default()
        }
    }

    fn viewer(fake: &Arc<FakeRemote>) -> (ViewerController<RecordingRenderer>, RecordingRenderer) {
        let local: Arc<dyn LocalStore> = Arc::new(MemoryStore::new());
        let reader = StateReader::new(local, Some(remote_of(fake)));
        let renderer = RecordingRenderer::default();
        let viewer = ViewerController::new(Some(room()), reader, renderer.clone()).unwrap();
        (viewer, renderer)
    }

    #[test]
    fn missing_room_code_is_fatal() {
        let local: Arc<dyn LocalStore> = Arc::new(MemoryStore::new());
        let reader = StateReader::new(local, None);
        assert!(matches!(
            ViewerController::new(None, reader, RecordingRenderer::default()),
            Err(ViewerError::MissingRoomCode)
        ));
    }

    #[test]
    fn newer_revision_wins() {
        assert!(is_newer(None, &snapshot(0, 0)));
        assert!(is_newer(Some(&snapshot(2, 4)), &snapshot(2, 5)));
        assert!(!is_newer(Some(&snapshot(2, 5)), &snapshot(3, 4)));
        assert!(!is_newer(Some(&snapshot(2, 5)), &snapshot(2, 5)));
    }

    #[test]
    fn unversioned_snapshots_compare_structurally() {
        assert!(is_newer(Some(&snapshot(2, 0)), &snapshot(3, 0)));
        assert!(!is_newer(Some(&snapshot(2, 0)), &snapshot(2, 0)));
    }

    #[tokio::test]
    async fn strike_change_triggers_rerender() {
        let fake = FakeRemote::shared();
        let (mut viewer, renderer) = viewer(&fake);

        fake.rooms.insert(room(), snapshot(2, 10));
        assert!(viewer.poll_once().await);
        assert!(!viewer.poll_once().await);

        fake.rooms.insert(room(), snapshot(3, 11));
        assert!(viewer.poll_once().await);

        let frames = renderer.frames.lock().unwrap();
        assert_eq!(frames.len(), 2);
        let last = frames.last().unwrap();
        assert_eq!(last.strikes, 3);
        assert_eq!((last.score_a, last.score_b), (15, 5));
    }

    #[tokio::test]
    async fn stale_snapshot_is_not_applied() {
        let fake = FakeRemote::shared();
        let (mut viewer, renderer) = viewer(&fake);

        fake.rooms.insert(room(), snapshot(3, 8));
        assert!(viewer.poll_once().await);
        fake.rooms.insert(room(), snapshot(1, 7));
        assert!(!viewer.poll_once().await);

        assert_eq!(viewer.last_applied().unwrap().strikes, 3);
        assert_eq!(renderer.frames.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn falls_back_to_local_replica_when_server_is_down() {
        let fake = FakeRemote::shared();
        fake.set_offline(true);
        let local: Arc<dyn LocalStore> = Arc::new(MemoryStore::new());
        local
            .set(&state_key(&room()), &serde_json::to_string(&snapshot(1, 3)).unwrap())
            .unwrap();
        let reader = StateReader::new(local, Some(remote_of(&fake)));
        let mut viewer =
            ViewerController::new(Some(room()), reader, RecordingRenderer::default()).unwrap();

        assert!(viewer.poll_once().await);
        assert_eq!(viewer.last_applied().unwrap().revision, 3);
    }

    #[tokio::test]
    async fn ended_room_resets_revision_guard() {
        let fake = FakeRemote::shared();
        let (mut viewer, _renderer) = viewer(&fake);

        fake.rooms.insert(room(), snapshot(0, 40));
        assert!(viewer.poll_once().await);
        fake.rooms.remove(&room());
        assert!(!viewer.poll_once().await);
        assert!(viewer.last_applied().is_none());

        fake.rooms.insert(room(), snapshot(0, 1));
        assert!(viewer.poll_once().await);
    }

    async fn host_on(fake: &Arc<FakeRemote>, local: Arc<dyn LocalStore>) -> HostSession {
        let bank = QuestionBank::new(vec![snapshot(0, 0).current.unwrap()]);
        let sync = StateSync::new(room(), local, Some(remote_of(fake)), WritePolicy::BestEffort);
        HostSession::open(bank, sync).await
    }

    #[tokio::test]
    async fn host_resuming_on_another_device_keeps_viewers_in_step() {
        let fake = FakeRemote::shared();
        let (mut viewer, renderer) = viewer(&fake);

        let mut first = host_on(&fake, Arc::new(MemoryStore::new())).await;
        first.select_question(0).unwrap();
        first.reveal_next().unwrap();
        first.award_points(Team::A).unwrap();
        first.register_strike().unwrap();
        first.set_score(Team::B, 20).unwrap();
        first.close().await;
        assert!(viewer.poll_once().await);
        assert_eq!(viewer.last_applied().unwrap().revision, 5);

        let mut second = host_on(&fake, Arc::new(MemoryStore::new())).await;
        assert_eq!(second.state().revision, 5);
        second.set_score(Team::A, 999).unwrap();
        second.close().await;

        assert!(viewer.poll_once().await);
        let shown = viewer.last_applied().unwrap();
        assert_eq!(shown.score_a, 999);
        assert_eq!(shown.score_b, 20);
        assert_eq!(shown.revision, 6);
        assert_eq!(renderer.frames.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn host_with_damaged_local_file_continues_server_revisions() {
        let fake = FakeRemote::shared();
        let (mut viewer, _renderer) = viewer(&fake);
        fake.rooms.insert(room(), snapshot(1, 12));
        assert!(viewer.poll_once().await);

        let local: Arc<dyn LocalStore> = Arc::new(MemoryStore::new());
        local.set(&state_key(&room()), "{truncated").unwrap();
        let mut host = host_on(&fake, local).await;
        host.register_strike().unwrap();
        host.close().await;

        assert!(viewer.poll_once().await);
        assert_eq!(viewer.last_applied().unwrap().strikes, 2);
        assert_eq!(viewer.last_applied().unwrap().revision, 13);
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_viewer_reports_connection_and_renders() {
        let fake = FakeRemote::shared();
        let (viewer, renderer) = viewer(&fake);
        let handle = viewer.spawn(DEFAULT_POLL_INTERVAL);
        let mut status = handle.status();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(*status.borrow(), ConnectionStatus::Waiting);

        fake.rooms.insert(room(), snapshot(1, 1));
        status.changed().await.unwrap();
        assert_eq!(*status.borrow(), ConnectionStatus::Connected);

        tokio::time::sleep(DEFAULT_POLL_INTERVAL).await;
        handle.shutdown().await;
        assert_eq!(renderer.frames.lock().unwrap().len(), 1);
    }
}
