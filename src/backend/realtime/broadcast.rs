/**
 * Room Broadcasting
 *
 * `RoomHub` owns one `tokio::sync::broadcast` channel per project room plus a
 * single global channel that every connection listens to. Room channels are
 * created on first join and swept by a periodic task once nobody listens.
 *
 * A send never blocks. A receiver that falls behind by more than the channel
 * capacity skips the oldest messages and is told how many it missed.
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

use crate::shared::{ProjectId, ServerMessage};

/// Broadcast channels for project rooms and the global feed
#[derive(Clone)]
pub struct RoomHub {
    rooms: Arc<Mutex<HashMap<ProjectId, broadcast::Sender<ServerMessage>>>>,
    global: broadcast::Sender<ServerMessage>,
    capacity: usize,
}

impl RoomHub {
    /// `capacity` must be greater than zero
    pub fn new(capacity: usize) -> Self {
        let (global, _) = broadcast::channel(capacity);
        Self {
            rooms: Arc::new(Mutex::new(HashMap::new())),
            global,
            capacity,
        }
    }

    fn rooms(&self) -> MutexGuard<'_, HashMap<ProjectId, broadcast::Sender<ServerMessage>>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to a room, creating its channel if needed
    pub fn subscribe_room(&self, project_id: ProjectId) -> broadcast::Receiver<ServerMessage> {
        let capacity = self.capacity;
        self.rooms()
            .entry(project_id)
            .or_insert_with(|| broadcast::channel(capacity).0)
            .subscribe()
    }

    pub fn subscribe_global(&self) -> broadcast::Receiver<ServerMessage> {
        self.global.subscribe()
    }

    /// Send to every member of a room.
    ///
    /// Returns the number of receivers reached, 0 if the room has none.
    pub fn broadcast_to_room(&self, project_id: ProjectId, message: ServerMessage) -> usize {
        let Some(sender) = self.rooms().get(&project_id).cloned() else {
            tracing::debug!("[Realtime] No room for project {}, {} dropped", project_id, message.kind());
            return 0;
        };

        match sender.send(message) {
            Ok(count) => {
                tracing::debug!("[Realtime] Room {} broadcast to {} subscribers", project_id, count);
                count
            }
            Err(_) => {
                tracing::debug!("[Realtime] Room {} has no subscribers", project_id);
                0
            }
        }
    }

    /// Send to every connection
    pub fn broadcast_global(&self, message: ServerMessage) -> usize {
        let kind = message.kind();
        match self.global.send(message) {
            Ok(count) => {
                tracing::info!("[Realtime] {} broadcast to {} connections", kind, count);
                count
            }
            Err(_) => {
                tracing::debug!("[Realtime] No connections to receive {}", kind);
                0
            }
        }
    }

    /// Drop room channels without receivers; returns how many were removed
    pub fn cleanup_inactive_rooms(&self) -> usize {
        let mut rooms = self.rooms();
        let before = rooms.len();
        rooms.retain(|_, sender| sender.receiver_count() > 0);
        before - rooms.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms().len()
    }

    /// Members currently subscribed to a room
    pub fn subscriber_count(&self, project_id: ProjectId) -> usize {
        self.rooms()
            .get(&project_id)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    pub fn connection_count(&self) -> usize {
        self.global.receiver_count()
    }
}
