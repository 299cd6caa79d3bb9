//! Device-level bookkeeping of which room this device joined and as what.

use tracing::{info, warn};

use crate::state::room::{Role, RoomCode};

use super::{LocalStore, ROLE_KEY, ROOM_CODE_KEY, SyncError, state_key};

/// Start a brand-new room hosted from this device.
///
/// Any state lingering under the generated code is discarded.
pub fn create_room(local: &dyn LocalStore) -> Result<RoomCode, SyncError> {
    let room = RoomCode::generate();
    join_room(local, &room, Role::Host)?;
    local.remove(&state_key(&room))?;
    info!(room = %room, "created new room");
    Ok(room)
}

/// Remember `room` and `role` as this device's current session.
pub fn join_room(local: &dyn LocalStore, room: &RoomCode, role: Role) -> Result<(), SyncError> {
    local.set(ROOM_CODE_KEY, room.as_str())?;
    local.set(ROLE_KEY, role.as_str())?;
    info!(room = %room, role = role.as_str(), "joined room");
    Ok(())
}

/// Room code and role stored by a previous [`join_room`], if still valid.
pub fn current_room(local: &dyn LocalStore) -> Result<Option<(RoomCode, Role)>, SyncError> {
    let Some(raw_code) = local.get(ROOM_CODE_KEY)? else {
        return Ok(None);
    };
    let room = match RoomCode::parse(&raw_code) {
        Ok(room) => room,
        Err(err) => {
            warn!(value = %raw_code, error = %err, "ignoring stored room code");
            return Ok(None);
        }
    };

    let role = local
        .get(ROLE_KEY)?
        .and_then(|raw| raw.parse::<Role>().ok())
        .unwrap_or(Role::Viewer);
    Ok(Some((room, role)))
}

/// Forget the current session and the local state of `room`.
pub fn leave_room(local: &dyn LocalStore, room: &RoomCode) -> Result<(), SyncError> {
    local.remove(ROOM_CODE_KEY)?;
    local.remove(&state_key(room))?;
    local.remove(ROLE_KEY)?;
    Ok(())
}
