//! Server-side room snapshot storage.

/// In-process store backed by DashMap.
pub mod memory;

use std::time::Duration;

use futures::future::BoxFuture;

use crate::{
    dao::{models::RoomEntity, storage::StorageResult},
    state::room::RoomCode,
};

pub use self::memory::MemoryRoomStore;

/// Abstraction over where the server keeps room snapshots.
pub trait RoomStore: Send + Sync {
    /// Insert or replace the room's snapshot, returning the previous one.
    fn save_state(&self, entity: RoomEntity) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;
    /// Snapshot of the room, if held.
    fn find_state(&self, room: RoomCode) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;
    /// Remove the room; `false` when it was not stored.
    fn delete_state(&self, room: RoomCode) -> BoxFuture<'static, StorageResult<bool>>;
    /// Drop rooms untouched for longer than `ttl`, returning how many went.
    fn purge_idle(&self, ttl: Duration) -> BoxFuture<'static, StorageResult<usize>>;
    /// Fail when the store cannot take new rooms.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
