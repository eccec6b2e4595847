//! Session-level façade tying the space components together.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use tessera_common::RoomSummary;

use crate::summary::RoomSummaryProvider;

use super::child::SpaceChildEvent;
use super::notify::{PushRuleSource, SpaceNotificationCounter};
use super::store::{SpaceGraphStore, SpaceStoreConfig};
use super::{Space, SpaceGraph, SpaceMemberSource};

/// Owns the known spaces, the current graph snapshot, the durable cache,
/// and the notification counter for one account.
///
/// The current graph is a single atomically-replaced `Arc`: readers always
/// see either the previous or the next complete snapshot. All configuration
/// is passed in at construction; nothing here reads global state.
pub struct SpaceService {
    user_id: String,
    spaces: RwLock<HashMap<String, Space>>,
    graph: RwLock<Arc<SpaceGraph>>,
    store: SpaceGraphStore,
    counter: SpaceNotificationCounter,
}

impl SpaceService {
    /// Create the service, restoring the last persisted graph if one exists
    /// (falling back to its backup, then to an empty graph).
    pub fn new(user_id: impl Into<String>, store_config: SpaceStoreConfig) -> Self {
        let store = SpaceGraphStore::new(store_config);
        let graph = store.load_or_backup().unwrap_or_default();
        Self {
            user_id: user_id.into(),
            spaces: RwLock::new(HashMap::new()),
            graph: RwLock::new(Arc::new(graph)),
            store,
            counter: SpaceNotificationCounter::new(),
        }
    }

    pub fn local_user_id(&self) -> &str {
        &self.user_id
    }

    /// The current graph snapshot.
    pub fn graph(&self) -> Arc<SpaceGraph> {
        self.graph.read().clone()
    }

    pub fn notification_counter(&self) -> &SpaceNotificationCounter {
        &self.counter
    }

    /// A copy of one known space, if any.
    pub fn space(&self, space_id: &str) -> Option<Space> {
        self.spaces.read().get(space_id).cloned()
    }

    /// Forget a space, e.g. after the local user left it.
    pub fn remove_space(&self, space_id: &str) {
        self.spaces.write().remove(space_id);
    }

    /// Refresh one space's children from its current child state events,
    /// creating the space on first sight. Other spaces are untouched.
    pub fn refresh_space_children(
        &self,
        space_id: &str,
        events: &[SpaceChildEvent],
        summaries: &dyn RoomSummaryProvider,
        members: &dyn SpaceMemberSource,
    ) {
        let mut spaces = self.spaces.write();
        let space = spaces
            .entry(space_id.to_string())
            .or_insert_with(|| Space::new(space_id));
        space.refresh_children(events, summaries, members, &self.user_id);
    }

    /// Rebuild the whole graph from a stable snapshot of the current inputs,
    /// swap it in, persist it, and recompute notification counts.
    ///
    /// Blocking; run on a worker when called from an interactive path. A
    /// store failure is logged and the in-memory graph stays authoritative.
    pub fn rebuild_graph(
        &self,
        summaries: &dyn RoomSummaryProvider,
        direct_rooms_by_member: &HashMap<String, Vec<String>>,
        push_rules: &dyn PushRuleSource,
    ) -> Arc<SpaceGraph> {
        // Copy-on-read: aggregation must not observe concurrent mutation.
        let spaces = self.spaces.read().clone();

        let all_room_ids: BTreeSet<String> = summaries.room_ids().into_iter().collect();
        let rooms: Vec<Arc<RoomSummary>> = all_room_ids
            .iter()
            .filter_map(|room_id| summaries.summary(room_id))
            .collect();

        let graph = Arc::new(SpaceGraph::build(
            &spaces,
            &all_room_ids,
            direct_rooms_by_member,
        ));

        *self.graph.write() = graph.clone();

        if !self.store.save(&graph) {
            tracing::warn!(user_id = %self.user_id, "graph not persisted, in-memory snapshot remains authoritative");
        }

        self.counter.compute(
            &graph.space_room_ids,
            &rooms,
            &graph.ancestors_per_room_id,
            push_rules,
        );

        graph
    }

    pub fn ancestors_of(&self, room_id: &str) -> BTreeSet<String> {
        self.graph
            .read()
            .ancestors_of(room_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn descendants_of(&self, space_id: &str) -> BTreeSet<String> {
        self.graph
            .read()
            .descendants_of(space_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_orphaned(&self, room_id: &str) -> bool {
        self.graph.read().is_orphaned(room_id)
    }
}
