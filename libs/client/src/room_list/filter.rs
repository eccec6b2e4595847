//! Room-list filtering: one declarative criteria set, evaluated either over
//! an in-memory slice or through a summary store, behind a shared contract.

use std::collections::HashSet;
use std::sync::Arc;

use tessera_common::{data_types, DataTypes, RoomSummary};

use crate::space::Space;
use crate::summary::RoomSummaryProvider;

/// Snapshot of the space a query is scoped to: its direct child-room set
/// (filtering is by direct membership, not ancestor closure) and its
/// suggested set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpaceScope {
    pub space_id: String,
    pub child_room_ids: HashSet<String>,
    pub suggested_room_ids: HashSet<String>,
}

impl From<&Space> for SpaceScope {
    fn from(space: &Space) -> Self {
        Self {
            space_id: space.space_id.clone(),
            child_room_ids: space.child_room_ids.iter().cloned().collect(),
            suggested_room_ids: space.suggested_room_ids.clone(),
        }
    }
}

/// Declarative filter criteria. The matching semantics live in
/// [`RoomListFilter::matches`] and nowhere else; every evaluator defers to
/// it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomListFilter {
    /// Rooms must carry at least one of these flags, when non-empty.
    pub data_types: DataTypes,
    /// Rooms carrying any of these flags are excluded.
    pub not_data_types: DataTypes,
    /// Case-insensitive substring match on display names.
    pub query: Option<String>,
    /// Restrict to direct children of one space.
    pub space: Option<SpaceScope>,
    /// Only rooms the scoping space flags as suggested. When set, data-type
    /// criteria are not consulted.
    pub only_suggested: bool,
}

impl RoomListFilter {
    /// The exclusion set applied by [`all_rooms`](Self::all_rooms): rooms a
    /// room list never shows unless asked explicitly.
    pub fn default_not_data_types() -> DataTypes {
        data_types::HIDDEN | data_types::CONFERENCE_USER | data_types::SPACE
    }

    /// The default query: everything except hidden, conference-user, and
    /// space rooms.
    pub fn all_rooms() -> Self {
        Self {
            not_data_types: Self::default_not_data_types(),
            ..Default::default()
        }
    }

    pub fn matches(&self, room: &RoomSummary) -> bool {
        if self.only_suggested {
            let Some(scope) = &self.space else {
                return false;
            };
            return scope.suggested_room_ids.contains(&room.room_id) && self.matches_query(room);
        }

        if let Some(scope) = &self.space {
            if !scope.child_room_ids.contains(&room.room_id) {
                return false;
            }
        }

        if !self.data_types.is_empty() && !room.data_types.contains_any(self.data_types) {
            return false;
        }
        if room.data_types.contains_any(self.not_data_types) {
            return false;
        }

        self.matches_query(room)
    }

    fn matches_query(&self, room: &RoomSummary) -> bool {
        let Some(query) = self.query.as_deref().filter(|q| !q.is_empty()) else {
            return true;
        };
        let query = query.to_lowercase();

        let name_matches = |name: &Option<String>| {
            name.as_deref()
                .map(|name| name.to_lowercase().contains(&query))
                .unwrap_or(false)
        };

        name_matches(&room.display_name)
            || room
                .space_child_info
                .as_ref()
                .map(|info| name_matches(&info.display_name))
                .unwrap_or(false)
    }
}

/// A way of producing the rooms matching a filter. Two implementations share
/// [`RoomListFilter::matches`]: a slice scan and a store-backed query.
pub trait FilterEvaluator: Send + Sync {
    fn rooms_matching(&self, filter: &RoomListFilter) -> Vec<Arc<RoomSummary>>;
}

/// Evaluates a filter over an in-memory snapshot of summaries.
pub struct InMemoryEvaluator {
    rooms: Vec<Arc<RoomSummary>>,
}

impl InMemoryEvaluator {
    pub fn new(rooms: Vec<Arc<RoomSummary>>) -> Self {
        Self { rooms }
    }
}

impl FilterEvaluator for InMemoryEvaluator {
    fn rooms_matching(&self, filter: &RoomListFilter) -> Vec<Arc<RoomSummary>> {
        self.rooms
            .iter()
            .filter(|room| filter.matches(room))
            .cloned()
            .collect()
    }
}

/// Evaluates a filter by querying a summary store.
pub struct StoreEvaluator {
    provider: Arc<dyn RoomSummaryProvider>,
}

impl StoreEvaluator {
    pub fn new(provider: Arc<dyn RoomSummaryProvider>) -> Self {
        Self { provider }
    }
}

impl FilterEvaluator for StoreEvaluator {
    fn rooms_matching(&self, filter: &RoomListFilter) -> Vec<Arc<RoomSummary>> {
        self.provider
            .room_ids()
            .into_iter()
            .filter_map(|room_id| self.provider.summary(&room_id))
            .filter(|room| filter.matches(room))
            .collect()
    }
}
