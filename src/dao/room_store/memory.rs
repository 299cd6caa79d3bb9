use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::time::Instant;

use crate::{
    dao::{
        models::RoomEntity,
        storage::{StorageError, StorageResult},
    },
    state::room::RoomCode,
};

use super::RoomStore;

struct StoredRoom {
    entity: RoomEntity,
    touched: Instant,
}

/// Process-local room store. Contents are lost on restart.
///
/// Holds at most `limit` rooms; updates to rooms already held always succeed.
/// The limit is checked before inserting, so concurrent creations may overshoot
/// it slightly.
#[derive(Clone)]
pub struct MemoryRoomStore {
    rooms: Arc<DashMap<RoomCode, StoredRoom>>,
    limit: usize,
}

impl Default for MemoryRoomStore {
    fn default() -> Self {
        Self::with_limit(usize::MAX)
    }
}

impl MemoryRoomStore {
    /// Store without a room limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store refusing new rooms once `limit` are held.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            limit,
        }
    }

    /// Number of rooms currently held.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether no room is held.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    fn is_full(&self) -> bool {
        self.rooms.len() >= self.limit
    }

    fn purge_older_than(&self, ttl: Duration, now: Instant) -> usize {
        let before = self.rooms.len();
        self.rooms
            .retain(|_, stored| now.saturating_duration_since(stored.touched) <= ttl);
        before.saturating_sub(self.rooms.len())
    }
}

impl RoomStore for MemoryRoomStore {
    fn save_state(&self, entity: RoomEntity) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            if store.is_full() && !store.rooms.contains_key(&entity.room) {
                return Err(StorageError::CapacityReached { limit: store.limit });
            }
            let previous = store.rooms.insert(
                entity.room.clone(),
                StoredRoom {
                    entity,
                    touched: Instant::now(),
                },
            );
            Ok(previous.map(|stored| stored.entity))
        })
    }

    fn find_state(&self, room: RoomCode) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let rooms = self.rooms.clone();
        Box::pin(async move { Ok(rooms.get(&room).map(|stored| stored.entity.clone())) })
    }

    fn delete_state(&self, room: RoomCode) -> BoxFuture<'static, StorageResult<bool>> {
        let rooms = self.rooms.clone();
        Box::pin(async move { Ok(rooms.remove(&room).is_some()) })
    }

    fn purge_idle(&self, ttl: Duration) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.purge_older_than(ttl, Instant::now())) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let result = if self.is_full() {
            Err(StorageError::CapacityReached { limit: self.limit })
        } else {
            Ok(())
        };
        Box::pin(async move { result })
    }
}
