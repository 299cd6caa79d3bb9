use time::OffsetDateTime;

use crate::state::{game::GameState, room::RoomCode};

/// Room state as held by the server, stamped with its last write time.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomEntity {
    /// Room the snapshot belongs to.
    pub room: RoomCode,
    /// Snapshot as last written by the host.
    pub state: GameState,
    /// Time of the last write.
    pub updated_at: OffsetDateTime,
}

impl RoomEntity {
    /// Wrap `state` as written now.
    pub fn new(room: RoomCode, state: GameState) -> Self {
        Self {
            room,
            state,
            updated_at: OffsetDateTime::now_utc(),
        }
    }
}
