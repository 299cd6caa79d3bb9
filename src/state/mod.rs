/// Custom-question bank.
pub mod bank;
/// Game state record and its mutations.
pub mod game;
/// Room codes and device roles.
pub mod room;

use std::sync::Arc;

use crate::dao::room_store::RoomStore;

/// Reference-counted handle to the server state.
pub type SharedState = Arc<AppState>;

/// Central server state: the room snapshot store.
pub struct AppState {
    rooms: Arc<dyn RoomStore>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(rooms: Arc<dyn RoomStore>) -> SharedState {
        Arc::new(Self { rooms })
    }

    /// Handle to the room store.
    pub fn rooms(&self) -> Arc<dyn RoomStore> {
        self.rooms.clone()
    }
}
