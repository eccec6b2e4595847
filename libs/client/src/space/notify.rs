//! Categorized unread/highlight aggregation over the space hierarchy.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::{Add, AddAssign};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tessera_common::{data_types, Membership, RoomSummary};

/// Yes/no push-rule signal: whether a room only notifies on mentions.
///
/// Push-rule evaluation belongs to the sync layer; the counter only consumes
/// this one bit, and uses it to count the highlight-only figure instead of
/// the full notification figure for a room.
pub trait PushRuleSource: Send + Sync {
    fn is_mentions_only(&self, room_id: &str) -> bool;
}

/// A [`PushRuleSource`] for hosts without push-rule data: nothing is
/// mentions-only.
pub struct NoPushRules;

impl PushRuleSource for NoPushRules {
    fn is_mentions_only(&self, _room_id: &str) -> bool {
        false
    }
}

/// Categorized missed-discussion counters.
///
/// Combination is associative and commutative with the all-zero state as
/// identity, so partial sums can be merged in any order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationState {
    pub favourite_missed_discussions_count: u64,
    pub favourite_missed_discussions_highlighted_count: u64,
    pub direct_missed_discussions_count: u64,
    pub direct_missed_discussions_highlighted_count: u64,
    pub group_missed_discussions_count: u64,
    pub group_missed_discussions_highlighted_count: u64,
}

impl NotificationState {
    pub fn all_count(&self) -> u64 {
        self.favourite_missed_discussions_count
            + self.direct_missed_discussions_count
            + self.group_missed_discussions_count
    }

    pub fn all_highlight_count(&self) -> u64 {
        self.favourite_missed_discussions_highlighted_count
            + self.direct_missed_discussions_highlighted_count
            + self.group_missed_discussions_highlighted_count
    }
}

impl Add for NotificationState {
    type Output = NotificationState;

    fn add(self, rhs: NotificationState) -> NotificationState {
        NotificationState {
            favourite_missed_discussions_count: self.favourite_missed_discussions_count
                + rhs.favourite_missed_discussions_count,
            favourite_missed_discussions_highlighted_count: self
                .favourite_missed_discussions_highlighted_count
                + rhs.favourite_missed_discussions_highlighted_count,
            direct_missed_discussions_count: self.direct_missed_discussions_count
                + rhs.direct_missed_discussions_count,
            direct_missed_discussions_highlighted_count: self
                .direct_missed_discussions_highlighted_count
                + rhs.direct_missed_discussions_highlighted_count,
            group_missed_discussions_count: self.group_missed_discussions_count
                + rhs.group_missed_discussions_count,
            group_missed_discussions_highlighted_count: self
                .group_missed_discussions_highlighted_count
                + rhs.group_missed_discussions_highlighted_count,
        }
    }
}

impl AddAssign for NotificationState {
    fn add_assign(&mut self, rhs: NotificationState) {
        *self = *self + rhs;
    }
}

#[derive(Default)]
struct CounterSnapshot {
    home: NotificationState,
    per_space: HashMap<String, NotificationState>,
}

/// Aggregated notification counts for home and for every space.
///
/// `compute` is synchronous and blocking; callers on an interactive path
/// should run it on a worker and let readers keep seeing the prior snapshot,
/// which is replaced atomically once the new one is ready.
pub struct SpaceNotificationCounter {
    snapshot: RwLock<CounterSnapshot>,
}

impl SpaceNotificationCounter {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(CounterSnapshot::default()),
        }
    }

    /// Recompute every state from scratch and swap the snapshot.
    ///
    /// `ancestors_per_room` is the flattened ancestor map of the current
    /// graph; a room contributes to each space in its ancestor set.
    pub fn compute(
        &self,
        space_ids: &BTreeSet<String>,
        rooms: &[Arc<RoomSummary>],
        ancestors_per_room: &BTreeMap<String, BTreeSet<String>>,
        push_rules: &dyn PushRuleSource,
    ) {
        let started = Instant::now();
        let mut next = CounterSnapshot::default();

        for room in rooms {
            // A space never contributes counts itself.
            if room.is_space() {
                continue;
            }

            let state = room_notification_state(room, push_rules);
            if state == NotificationState::default() {
                continue;
            }

            next.home += state;
            let Some(ancestors) = ancestors_per_room.get(&room.room_id) else {
                continue;
            };
            for ancestor_id in ancestors {
                if space_ids.contains(ancestor_id) {
                    *next.per_space.entry(ancestor_id.clone()).or_default() += state;
                }
            }
        }

        *self.snapshot.write() = next;
        tracing::debug!(
            rooms = rooms.len(),
            spaces = space_ids.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "notification counts recomputed"
        );
    }

    /// The aggregate state over every room.
    pub fn home_notification_state(&self) -> NotificationState {
        self.snapshot.read().home
    }

    /// The state for one space. Zero for unknown or quiet spaces.
    pub fn notification_state(&self, space_id: &str) -> NotificationState {
        self.snapshot
            .read()
            .per_space
            .get(space_id)
            .copied()
            .unwrap_or_default()
    }

    /// The sum over every space except the named one ("everything else").
    pub fn notification_state_excluding(&self, space_id: &str) -> NotificationState {
        let snapshot = self.snapshot.read();
        snapshot
            .per_space
            .iter()
            .filter(|(id, _)| id.as_str() != space_id)
            .fold(NotificationState::default(), |sum, (_, state)| sum + *state)
    }
}

impl Default for SpaceNotificationCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// One room's contribution, bucketed into exactly one of favorite, direct,
/// or group (highest-priority match wins).
fn room_notification_state(
    room: &RoomSummary,
    push_rules: &dyn PushRuleSource,
) -> NotificationState {
    let mut state = NotificationState::default();

    if room.notification_count > 0 {
        let counted = if push_rules.is_mentions_only(&room.room_id) {
            room.highlight_count
        } else {
            room.notification_count
        };
        let highlighted = room.highlight_count;

        if room.is_typed(data_types::FAVORITED) {
            state.favourite_missed_discussions_count += counted;
            state.favourite_missed_discussions_highlighted_count += highlighted;
        } else if room.is_direct() {
            state.direct_missed_discussions_count += counted;
            state.direct_missed_discussions_highlighted_count += highlighted;
        } else {
            state.group_missed_discussions_count += counted;
            state.group_missed_discussions_highlighted_count += highlighted;
        }
    } else if room.membership == Membership::Invite {
        // Pending invitations always surface as one highlighted unit.
        if room.is_direct() {
            state.direct_missed_discussions_highlighted_count += 1;
        } else {
            state.group_missed_discussions_highlighted_count += 1;
        }
    }

    state
}
