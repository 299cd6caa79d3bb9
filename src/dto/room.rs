use serde::Serialize;
use utoipa::ToSchema;

use crate::dao::models::RoomEntity;

use super::format_timestamp;

/// Acknowledgement returned after a room snapshot was stored.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomStateAck {
    /// Normalized room code.
    pub room: String,
    /// Revision of the stored snapshot.
    pub revision: u64,
    /// RFC 3339 time of the write.
    pub updated_at: String,
}

impl From<&RoomEntity> for RoomStateAck {
    fn from(entity: &RoomEntity) -> Self {
        Self {
            room: entity.room.to_string(),
            revision: entity.state.revision,
            updated_at: format_timestamp(entity.updated_at),
        }
    }
}
