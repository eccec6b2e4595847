//! Space hierarchy: per-space child derivation, whole-graph aggregation,
//! durable caching, and notification aggregation.

pub mod child;
pub mod graph;
pub mod notify;
pub mod service;
pub mod store;

pub use graph::SpaceGraph;
pub use notify::{NoPushRules, NotificationState, PushRuleSource, SpaceNotificationCounter};
pub use service::SpaceService;
pub use store::{SpaceGraphStore, SpaceStoreConfig};

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::summary::RoomSummaryProvider;
use child::SpaceChildEvent;

/// Member-list resolution for a space, supplied by the sync layer.
///
/// Failures here are survivable: a refresh that cannot resolve members still
/// computes child edges and only skips implicit direct-room folding.
pub trait SpaceMemberSource: Send + Sync {
    fn members_of(&self, space_id: &str) -> Result<Vec<String>, MemberFetchError>;
}

#[derive(Debug, Error)]
#[error("could not fetch members of {space_id}: {reason}")]
pub struct MemberFetchError {
    pub space_id: String,
    pub reason: String,
}

/// A room acting as a container for other rooms and sub-spaces.
///
/// Children are derived from the space's own state events; other members are
/// used to fold direct-message rooms into the hierarchy as implicit children.
#[derive(Debug, Clone, Default)]
pub struct Space {
    pub space_id: String,
    /// Server-supplied ordering hint for this space itself. Display only.
    pub order: Option<String>,
    /// Direct children, de-duplicated, in first-seen order.
    pub child_room_ids: Vec<String>,
    /// The subset of children that are themselves spaces.
    pub child_space_ids: HashSet<String>,
    /// Children advertised for eager display.
    pub suggested_room_ids: HashSet<String>,
    /// Valid order hints per child, for display tie-breaking. Children with
    /// no hint, or an invalid one, are absent.
    pub child_orders: HashMap<String, String>,
    /// Members of this space other than the local user.
    pub other_member_ids: HashSet<String>,
}

impl Space {
    pub fn new(space_id: impl Into<String>) -> Self {
        Self {
            space_id: space_id.into(),
            ..Default::default()
        }
    }

    /// Re-derive this space's children and suggested set from its current
    /// child state events, then resolve its member list.
    ///
    /// Idempotent: replaying unchanged events yields identical sets. An
    /// event with empty content removes the child it names; a `suggested`
    /// flag toggles membership of that child in the suggested set. A member
    /// fetch failure is logged and leaves `other_member_ids` untouched for
    /// this pass.
    ///
    /// Returns the resulting ordered child list and suggested set.
    pub fn refresh_children(
        &mut self,
        events: &[SpaceChildEvent],
        summaries: &dyn RoomSummaryProvider,
        members: &dyn SpaceMemberSource,
        local_user_id: &str,
    ) -> (Vec<String>, HashSet<String>) {
        for event in events {
            let child_id = event.state_key.as_str();
            match event.live_content() {
                Some(content) => {
                    if !self.child_room_ids.iter().any(|id| id == child_id) {
                        self.child_room_ids.push(child_id.to_string());
                    }
                    if content.suggested {
                        self.suggested_room_ids.insert(child_id.to_string());
                    } else {
                        self.suggested_room_ids.remove(child_id);
                    }
                    match content.valid_order() {
                        Some(order) => {
                            self.child_orders
                                .insert(child_id.to_string(), order.to_string());
                        }
                        None => {
                            self.child_orders.remove(child_id);
                        }
                    }
                    let is_space = summaries
                        .summary(child_id)
                        .map(|summary| summary.is_space())
                        .unwrap_or(false);
                    if is_space {
                        self.child_space_ids.insert(child_id.to_string());
                    } else {
                        self.child_space_ids.remove(child_id);
                    }
                }
                None => {
                    self.child_room_ids.retain(|id| id != child_id);
                    self.child_space_ids.remove(child_id);
                    self.suggested_room_ids.remove(child_id);
                    self.child_orders.remove(child_id);
                }
            }
        }

        match members.members_of(&self.space_id) {
            Ok(member_ids) => {
                self.other_member_ids = member_ids
                    .into_iter()
                    .filter(|member_id| member_id != local_user_id)
                    .collect();
            }
            Err(error) => {
                tracing::warn!(
                    space_id = %self.space_id,
                    %error,
                    "member resolution failed, skipping direct-room folding this pass"
                );
            }
        }

        (
            self.child_room_ids.clone(),
            self.suggested_room_ids.clone(),
        )
    }

    /// The display order hint for one child, if it carried a valid one.
    pub fn child_order(&self, child_id: &str) -> Option<&str> {
        self.child_orders.get(child_id).map(String::as_str)
    }
}
