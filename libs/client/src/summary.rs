//! Access to the room-summary mirror and its live update feed.
//!
//! The mirror itself belongs to the sync layer; this module defines the
//! read-only contract the hierarchy and room-list components consume, an
//! in-memory implementation backed by `DashMap`, and the broadcast feed that
//! carries mirror mutations to interested fetchers.

use std::sync::Arc;

use dashmap::DashMap;
use tessera_common::RoomSummary;
use tokio::sync::broadcast;

/// Capacity of the update feed. Receivers that fall behind skip updates
/// (`RecvError::Lagged`) and should recompute from the store.
const FEED_CAPACITY: usize = 4096;

/// Read-only view of the room-summary mirror.
pub trait RoomSummaryProvider: Send + Sync {
    /// Ids of every room currently known to the mirror.
    fn room_ids(&self) -> Vec<String>;

    /// Summary of one room, if known.
    fn summary(&self, room_id: &str) -> Option<Arc<RoomSummary>>;
}

/// One mutation of the room mirror, as observed by the sync layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryUpdate {
    RoomAdded(String),
    RoomRemoved(String),
    SummaryChanged(String),
    DirectRoomsChanged,
}

/// Broadcast hub for summary updates. Cloneable; hand one to each component
/// that must react to mirror changes.
#[derive(Clone)]
pub struct SummaryFeed {
    sender: broadcast::Sender<SummaryUpdate>,
}

impl SummaryFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SummaryUpdate> {
        self.sender.subscribe()
    }

    /// Publish an update. A send with no receivers is fine.
    pub fn publish(&self, update: SummaryUpdate) {
        let _ = self.sender.send(update);
    }
}

impl Default for SummaryFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// `DashMap`-backed summary mirror, used by tests and by hosts that keep the
/// mirror in memory.
pub struct MemoryRoomSummaryStore {
    rooms: DashMap<String, Arc<RoomSummary>>,
    feed: SummaryFeed,
}

impl MemoryRoomSummaryStore {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            feed: SummaryFeed::new(),
        }
    }

    /// The feed this store publishes its own mutations to.
    pub fn feed(&self) -> &SummaryFeed {
        &self.feed
    }

    /// Insert or replace a summary, publishing the matching update.
    pub fn upsert(&self, summary: RoomSummary) {
        let room_id = summary.room_id.clone();
        let existed = self
            .rooms
            .insert(room_id.clone(), Arc::new(summary))
            .is_some();
        self.feed.publish(if existed {
            SummaryUpdate::SummaryChanged(room_id)
        } else {
            SummaryUpdate::RoomAdded(room_id)
        });
    }

    pub fn remove(&self, room_id: &str) {
        if self.rooms.remove(room_id).is_some() {
            self.feed
                .publish(SummaryUpdate::RoomRemoved(room_id.to_string()));
        }
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl Default for MemoryRoomSummaryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomSummaryProvider for MemoryRoomSummaryStore {
    fn room_ids(&self) -> Vec<String> {
        self.rooms.iter().map(|entry| entry.key().clone()).collect()
    }

    fn summary(&self, room_id: &str) -> Option<Arc<RoomSummary>> {
        self.rooms.get(room_id).map(|entry| entry.value().clone())
    }
}
