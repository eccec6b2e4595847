//! Whole-graph aggregation: one immutable snapshot of the space hierarchy.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use super::Space;

type IdSet = BTreeSet<String>;
type EdgeMap = BTreeMap<String, IdSet>;

/// Immutable snapshot of the derived space hierarchy.
///
/// Built wholesale by [`SpaceGraph::build`] and replaced, never mutated, on
/// every recomputation. The serialized form is the versioned cache document:
/// every field is a required key, and a document missing any of them fails
/// to decode as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceGraph {
    /// Every known space id.
    #[serde(rename = "spaceRoomIds")]
    pub space_room_ids: IdSet,
    /// Direct parents of each room or space id.
    #[serde(rename = "parentIdsPerRoomId")]
    pub parent_ids_per_room_id: EdgeMap,
    /// Transitive parents of each id that has at least one parent.
    #[serde(rename = "ancestorsPerRoomId")]
    pub ancestors_per_room_id: EdgeMap,
    /// Transitive children of each space id.
    #[serde(rename = "descendantsPerRoomId")]
    pub descendants_per_room_id: EdgeMap,
    /// Spaces with no parent.
    #[serde(rename = "rootSpaceIds")]
    pub root_space_ids: IdSet,
    /// Rooms that belong to no space.
    #[serde(rename = "orphanedRoomIds")]
    pub orphaned_room_ids: IdSet,
    /// Direct-message rooms that belong to no space.
    #[serde(rename = "orphanedDirectRoomIds")]
    pub orphaned_direct_room_ids: IdSet,
}

impl SpaceGraph {
    /// Aggregate the current set of spaces into one snapshot.
    ///
    /// Parent edges come from inverting each space's child list, unioned
    /// with implicit edges folding a member's direct rooms into every space
    /// that member belongs to; an implicit edge can add parents but never
    /// removes an explicit one. Closures are reachability over those edges,
    /// bounded by a visited set, so cyclic input terminates and the
    /// ancestor/descendant maps stay exact duals of each other. Ids
    /// referenced by edges but absent from `all_room_ids` are carried as
    /// leaves; they never abort the build.
    pub fn build(
        spaces: &HashMap<String, Space>,
        all_room_ids: &BTreeSet<String>,
        direct_rooms_by_member: &HashMap<String, Vec<String>>,
    ) -> SpaceGraph {
        let mut parent_ids: EdgeMap = BTreeMap::new();

        for space in spaces.values() {
            for child_id in &space.child_room_ids {
                parent_ids
                    .entry(child_id.clone())
                    .or_default()
                    .insert(space.space_id.clone());
            }
            for member_id in &space.other_member_ids {
                let Some(direct_rooms) = direct_rooms_by_member.get(member_id) else {
                    continue;
                };
                for room_id in direct_rooms {
                    parent_ids
                        .entry(room_id.clone())
                        .or_default()
                        .insert(space.space_id.clone());
                }
            }
        }

        // Child edges as the exact inverse of the parent edges, so the two
        // closures below cannot disagree.
        let mut child_ids: EdgeMap = BTreeMap::new();
        for (child_id, parents) in &parent_ids {
            for parent_id in parents {
                child_ids
                    .entry(parent_id.clone())
                    .or_default()
                    .insert(child_id.clone());
            }
        }

        let mut ancestors: EdgeMap = BTreeMap::new();
        for id in parent_ids.keys() {
            ancestors.insert(id.clone(), reachable(id, &parent_ids));
        }

        let space_room_ids: IdSet = spaces.keys().cloned().collect();

        let mut descendants: EdgeMap = BTreeMap::new();
        for space_id in &space_room_ids {
            descendants.insert(space_id.clone(), reachable(space_id, &child_ids));
        }

        let root_space_ids: IdSet = space_room_ids
            .iter()
            .filter(|space_id| {
                parent_ids
                    .get(*space_id)
                    .map(|parents| parents.is_empty())
                    .unwrap_or(true)
            })
            .cloned()
            .collect();

        let direct_room_ids: IdSet = direct_rooms_by_member
            .values()
            .flatten()
            .cloned()
            .collect();

        let orphaned_room_ids: IdSet = all_room_ids
            .iter()
            .filter(|room_id| !space_room_ids.contains(*room_id))
            .filter(|room_id| {
                ancestors
                    .get(*room_id)
                    .map(|set| set.is_empty())
                    .unwrap_or(true)
            })
            .cloned()
            .collect();

        let orphaned_direct_room_ids: IdSet = orphaned_room_ids
            .iter()
            .filter(|room_id| direct_room_ids.contains(*room_id))
            .cloned()
            .collect();

        SpaceGraph {
            space_room_ids,
            parent_ids_per_room_id: parent_ids,
            ancestors_per_room_id: ancestors,
            descendants_per_room_id: descendants,
            root_space_ids,
            orphaned_room_ids,
            orphaned_direct_room_ids,
        }
    }

    pub fn ancestors_of(&self, room_id: &str) -> Option<&IdSet> {
        self.ancestors_per_room_id.get(room_id)
    }

    pub fn descendants_of(&self, space_id: &str) -> Option<&IdSet> {
        self.descendants_per_room_id.get(space_id)
    }

    pub fn is_orphaned(&self, room_id: &str) -> bool {
        self.orphaned_room_ids.contains(room_id)
    }
}

/// Every id reachable from `start` over `edges`, excluding `start` itself.
///
/// The visited set both bounds the traversal under cycles and de-duplicates
/// shared sub-graphs.
fn reachable(start: &str, edges: &EdgeMap) -> IdSet {
    let mut visited: IdSet = IdSet::new();
    visited.insert(start.to_string());
    let mut queue: VecDeque<String> = VecDeque::from([start.to_string()]);
    let mut result = IdSet::new();

    while let Some(id) = queue.pop_front() {
        let Some(next_ids) = edges.get(&id) else {
            continue;
        };
        for next_id in next_ids {
            if visited.insert(next_id.clone()) {
                result.insert(next_id.clone());
                queue.push_back(next_id.clone());
            }
        }
    }

    result
}
