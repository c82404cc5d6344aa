/**
 * Connection Session
 *
 * A `Session` is the server-side state of one realtime connection: the rooms
 * it joined, its view of the global feed, and a private reply queue.
 * `next_outbound` merges the three into the single stream of messages that
 * the socket writes out.
 *
 * A session that falls behind in a room has missed pixel edits. When it was
 * given the registry it answers the gap with a full `Grid` of that project,
 * so the client canvas converges again.
 *
 * Dropping a session drops its receivers, which is all it takes to leave
 * every room.
 */

use std::collections::{HashSet, VecDeque};
use tokio::sync::mpsc;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{StreamExt, StreamMap};
use uuid::Uuid;

use crate::backend::realtime::broadcast::RoomHub;
use crate::backend::registry::SharedRegistry;
use crate::shared::{ProjectId, ServerMessage};

pub struct Session {
    id: Uuid,
    hub: RoomHub,
    rooms: StreamMap<ProjectId, BroadcastStream<ServerMessage>>,
    global: BroadcastStream<ServerMessage>,
    reply_tx: mpsc::UnboundedSender<ServerMessage>,
    reply_rx: mpsc::UnboundedReceiver<ServerMessage>,
    registry: Option<SharedRegistry>,
    resync: VecDeque<ProjectId>,
}

impl Session {
    pub fn new(hub: RoomHub) -> Self {
        let global = BroadcastStream::new(hub.subscribe_global());
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        Self {
            id: Uuid::new_v4(),
            hub,
            rooms: StreamMap::new(),
            global,
            reply_tx,
            reply_rx,
            registry: None,
            resync: VecDeque::new(),
        }
    }

    /// Resend grids from `registry` after lagging in a room
    pub fn with_registry(mut self, registry: SharedRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Join a room. Joining twice is a no-op.
    pub fn join(&mut self, project_id: ProjectId) {
        if self.rooms.contains_key(&project_id) {
            return;
        }
        let receiver = self.hub.subscribe_room(project_id);
        self.rooms.insert(project_id, BroadcastStream::new(receiver));
        tracing::debug!("[Realtime] Session {} joined room {}", self.id, project_id);
    }

    /// Leave a room; returns false if the session was not a member
    pub fn leave(&mut self, project_id: ProjectId) -> bool {
        let left = self.rooms.remove(&project_id).is_some();
        if left {
            tracing::debug!("[Realtime] Session {} left room {}", self.id, project_id);
        }
        left
    }

    pub fn is_member(&self, project_id: ProjectId) -> bool {
        self.rooms.contains_key(&project_id)
    }

    pub fn rooms(&self) -> HashSet<ProjectId> {
        self.rooms.keys().copied().collect()
    }

    /// Queue a message for this connection only
    pub fn reply(&self, message: ServerMessage) {
        // The receiver lives in `self`, so this cannot fail while the
        // session exists.
        let _ = self.reply_tx.send(message);
    }

    /// Next message to write to the connection.
    ///
    /// Replies come first, then grid resyncs, then room and global traffic.
    /// Lagged receivers are logged and skipped. Returns `None` once the hub
    /// is gone. Cancel safe.
    pub async fn next_outbound(&mut self) -> Option<ServerMessage> {
        loop {
            if let Ok(message) = self.reply_rx.try_recv() {
                return Some(message);
            }
            if let Some(message) = self.next_resync().await {
                return Some(message);
            }

            tokio::select! {
                biased;
                Some(message) = self.reply_rx.recv() => return Some(message),
                Some((project_id, item)) = self.rooms.next() => match item {
                    Ok(message) => return Some(message),
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "[Realtime] Session {} lagged in room {}, skipped {} messages",
                            self.id,
                            project_id,
                            skipped
                        );
                        if self.registry.is_some() && !self.resync.contains(&project_id) {
                            self.resync.push_back(project_id);
                        }
                    }
                },
                item = self.global.next() => match item {
                    Some(Ok(message)) => return Some(message),
                    Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                        tracing::warn!("[Realtime] Session {} lagged, skipped {} global messages", self.id, skipped);
                    }
                    None => {
                        tracing::warn!("[Realtime] Global channel closed, ending session {}", self.id);
                        return None;
                    }
                },
            }
        }
    }

    /// Current grid of the oldest pending resync. The entry is only dropped
    /// once the grid has been read.
    async fn next_resync(&mut self) -> Option<ServerMessage> {
        let registry = self.registry.as_ref()?;
        while let Some(&project_id) = self.resync.front() {
            let grid = registry.read().await.find_by_id(project_id).map(|p| p.grid.clone());
            self.resync.pop_front();
            match grid {
                Some(grid) => return Some(ServerMessage::Grid { project_id, grid }),
                None => tracing::debug!("[Realtime] No grid to resync for project {}", project_id),
            }
        }
        None
    }
}
