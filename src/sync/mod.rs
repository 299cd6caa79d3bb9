//! Host/viewer state synchronization: a synchronous local replica plus a
//! best-effort remote replica, both keyed by room code.

pub mod error;
pub mod local;
pub mod outbox;
pub mod remote;
pub mod session;

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::state::{game::GameState, room::RoomCode};

pub use self::error::{LocalStoreError, RemoteError, SyncError};
pub use self::local::{FileStore, LocalStore, MemoryStore};
pub use self::outbox::Outbox;
pub use self::remote::RemoteStore;

/// Prefix of the per-room state key.
pub const STATE_KEY_PREFIX: &str = "familyfeud_gamestate_";
/// Key holding the room code this device last joined.
pub const ROOM_CODE_KEY: &str = "familyfeud_roomcode";
/// Key holding the role (`host` or `viewer`) this device joined as.
pub const ROLE_KEY: &str = "familyfeud_role";

/// Local key of the state for `room`.
pub fn state_key(room: &RoomCode) -> String {
    format!("{STATE_KEY_PREFIX}{room}")
}

/// How host writes reach the remote replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WritePolicy {
    /// Never contact the remote store.
    LocalOnly,
    /// One delivery attempt per snapshot.
    BestEffort,
    /// Up to `max_attempts` deliveries with exponential backoff.
    Retry {
        /// Attempts per snapshot, including the first.
        max_attempts: u32,
    },
}

impl WritePolicy {
    fn attempts(&self) -> Option<u32> {
        match self {
            WritePolicy::LocalOnly => None,
            WritePolicy::BestEffort => Some(1),
            WritePolicy::Retry { max_attempts } => Some(*max_attempts),
        }
    }
}

impl Default for WritePolicy {
    fn default() -> Self {
        WritePolicy::Retry { max_attempts: 3 }
    }
}

/// Read side of the protocol: remote first, local fallback.
#[derive(Clone)]
pub struct StateReader {
    local: Arc<dyn LocalStore>,
    remote: Option<Arc<dyn RemoteStore>>,
}

impl StateReader {
    /// Build a reader over the given replicas.
    pub fn new(local: Arc<dyn LocalStore>, remote: Option<Arc<dyn RemoteStore>>) -> Self {
        Self { local, remote }
    }

    /// Fetch the newest available state for `room`, or `None` when neither
    /// replica has usable data.
    pub async fn read(&self, room: &RoomCode) -> Option<GameState> {
        if let Some(remote) = &self.remote {
            match remote.fetch_state(room.clone()).await {
                Ok(state) => return Some(state),
                Err(err) if err.is_not_found() => {
                    debug!(room = %room, "room unknown to server; falling back to local state")
                }
                Err(err) => {
                    warn!(room = %room, error = %err, "failed to read state from server; falling back to local state")
                }
            }
        }
        self.read_local(room)
    }

    /// Read the local replica only. Malformed data reads as empty.
    pub fn read_local(&self, room: &RoomCode) -> Option<GameState> {
        let key = state_key(room);
        match self.local.get(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<GameState>(&raw) {
                Ok(state) => Some(state),
                Err(err) => {
                    warn!(key = %key, error = %err, "stored game state is malformed; ignoring it");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(key = %key, error = %err, "failed to read local game state");
                None
            }
        }
    }
}

/// Write side of the protocol, owned by the host session of one room.
pub struct StateSync {
    room: RoomCode,
    local: Arc<dyn LocalStore>,
    remote: Option<Arc<dyn RemoteStore>>,
    outbox: Option<Outbox>,
}

impl StateSync {
    /// Wire the replicas for `room`. Spawns the outbox task unless the policy is
    /// [`WritePolicy::LocalOnly`] or there is no remote, so it must run inside a
    /// Tokio runtime in that case.
    pub fn new(
        room: RoomCode,
        local: Arc<dyn LocalStore>,
        remote: Option<Arc<dyn RemoteStore>>,
        policy: WritePolicy,
    ) -> Self {
        let outbox = match (&remote, policy.attempts()) {
            (Some(remote), Some(attempts)) => {
                Some(Outbox::spawn(remote.clone(), room.clone(), attempts))
            }
            _ => None,
        };

        Self {
            room,
            local,
            remote,
            outbox,
        }
    }

    /// Room these replicas belong to.
    pub fn room(&self) -> &RoomCode {
        &self.room
    }

    /// Local replica, also holding the device's session keys.
    pub fn local(&self) -> &dyn LocalStore {
        self.local.as_ref()
    }

    /// Reader sharing these replicas.
    pub fn reader(&self) -> StateReader {
        StateReader::new(self.local.clone(), self.remote.clone())
    }

    /// Persist `state`: synchronous local write, then queue the remote copy.
    pub fn write(&self, state: &GameState) -> Result<(), SyncError> {
        let raw = serde_json::to_string(state)?;
        self.local.set(&state_key(&self.room), &raw)?;
        if let Some(outbox) = &self.outbox {
            outbox.submit(state.clone());
        }
        Ok(())
    }

    /// Previously stored local state for this room, if any.
    pub fn load_local(&self) -> Option<GameState> {
        self.reader().read_local(&self.room)
    }

    /// Highest-revision state held by either replica.
    ///
    /// A host resuming on another device, or over a damaged local file, must
    /// continue the server's revision sequence or viewers will treat its
    /// writes as stale.
    pub async fn load_latest(&self) -> Option<GameState> {
        let local = self.load_local();
        let remote = match &self.remote {
            Some(remote) => match remote.fetch_state(self.room.clone()).await {
                Ok(state) => Some(state),
                Err(err) if err.is_not_found() => None,
                Err(err) => {
                    warn!(room = %self.room, error = %err, "failed to read state from server; resuming from local state");
                    None
                }
            },
            None => None,
        };

        match (local, remote) {
            (Some(local), Some(remote)) if remote.revision > local.revision => Some(remote),
            (Some(local), _) => Some(local),
            (None, remote) => remote,
        }
    }

    /// Remove both replicas of the room. Remote failures are only logged.
    pub async fn clear(&self) -> Result<(), SyncError> {
        self.local.remove(&state_key(&self.room))?;
        if let Some(remote) = &self.remote {
            if let Err(err) = remote.delete_state(self.room.clone()).await {
                warn!(room = %self.room, error = %err, "failed to delete state on server");
            }
        }
        Ok(())
    }

    /// Flush pending remote deliveries and stop the outbox. Later writes stay
    /// local.
    pub async fn shutdown(&mut self) {
        if let Some(outbox) = self.outbox.take() {
            outbox.close().await;
        }
    }
}
