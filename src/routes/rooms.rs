use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::room::RoomStateAck,
    error::AppError,
    services::room_service,
    state::{SharedState, game::GameState},
};

/// Routes exposing the per-room state slot shared by hosts and viewers.
pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/api/rooms/{code}/state",
        get(get_state).post(save_state).delete(delete_state),
    )
}

/// Fetch the latest snapshot pushed by the room's host.
#[utoipa::path(
    get,
    path = "/api/rooms/{code}/state",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code (case-insensitive)")),
    responses(
        (status = 200, description = "Current room state", body = GameState),
        (status = 400, description = "Invalid room code"),
        (status = 404, description = "Room has no state")
    )
)]
pub async fn get_state(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<GameState>, AppError> {
    let game = room_service::get_state(&state, &code).await?;
    Ok(Json(game))
}

/// Store a snapshot for the room, replacing the previous one.
#[utoipa::path(
    post,
    path = "/api/rooms/{code}/state",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code (case-insensitive)")),
    request_body = GameState,
    responses(
        (status = 200, description = "Snapshot stored", body = RoomStateAck),
        (status = 400, description = "Invalid room code or payload"),
        (status = 503, description = "Server holds its maximum number of rooms")
    )
)]
pub async fn save_state(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    payload: Result<Json<GameState>, JsonRejection>,
) -> Result<Json<RoomStateAck>, AppError> {
    let Json(game) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let ack = room_service::save_state(&state, &code, game).await?;
    Ok(Json(ack))
}

/// Drop the room's snapshot. Idempotent.
#[utoipa::path(
    delete,
    path = "/api/rooms/{code}/state",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code (case-insensitive)")),
    responses(
        (status = 204, description = "Room state removed"),
        (status = 400, description = "Invalid room code")
    )
)]
pub async fn delete_state(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<StatusCode, AppError> {
    room_service::delete_state(&state, &code).await?;
    Ok(StatusCode::NO_CONTENT)
}
