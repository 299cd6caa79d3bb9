use tracing::{debug, info, warn};

use crate::{
    dao::models::RoomEntity,
    dto::room::RoomStateAck,
    error::ServiceError,
    state::{SharedState, game::GameState, room::RoomCode},
};

/// Normalize a room code taken from a request path.
pub fn parse_room(raw: &str) -> Result<RoomCode, ServiceError> {
    Ok(RoomCode::parse(raw)?)
}

/// Latest snapshot stored for `raw_room`.
pub async fn get_state(state: &SharedState, raw_room: &str) -> Result<GameState, ServiceError> {
    let room = parse_room(raw_room)?;
    let entity = state
        .rooms()
        .find_state(room.clone())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room {room} has no state")))?;
    Ok(entity.state)
}

/// Replace the snapshot of `raw_room` with `game`.
///
/// Last write wins: a revision lower than the stored one is accepted and only
/// logged.
pub async fn save_state(
    state: &SharedState,
    raw_room: &str,
    game: GameState,
) -> Result<RoomStateAck, ServiceError> {
    let room = parse_room(raw_room)?;
    if !game.is_consistent() {
        return Err(ServiceError::InvalidInput(
            "revealed answers must point into the current question".into(),
        ));
    }

    let entity = RoomEntity::new(room.clone(), game);
    let ack = RoomStateAck::from(&entity);
    let previous = state.rooms().save_state(entity).await?;

    match previous {
        Some(previous) if previous.state.revision > ack.revision => {
            warn!(
                room = %room,
                stored = previous.state.revision,
                incoming = ack.revision,
                "room revision went backwards; keeping the newest write"
            );
        }
        Some(_) => debug!(room = %room, revision = ack.revision, "room state updated"),
        None => info!(room = %room, revision = ack.revision, "room state created"),
    }

    Ok(ack)
}

/// Forget `raw_room`. Deleting an unknown room succeeds.
pub async fn delete_state(state: &SharedState, raw_room: &str) -> Result<(), ServiceError> {
    let room = parse_room(raw_room)?;
    if state.rooms().delete_state(room.clone()).await? {
        info!(room = %room, "room state deleted");
    }
    Ok(())
}
