//! Per-room denormalized summary facts, as mirrored from the sync feed.
//!
//! Summaries are produced by the sync layer and are read-only inputs to the
//! hierarchy and room-list subsystems: nothing here ever mutates one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data_types::{self, DataTypes};

/// The local user's membership state in a room.
///
/// Ordered so that ascending order puts invites before joined rooms, which
/// the "invites first" sort key relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Membership {
    Invite,
    Join,
    Leave,
    Ban,
    Unknown,
}

/// Delivery state of the most recent locally-sent message in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentStatus {
    /// Everything sent from this room was acknowledged.
    Ok,
    /// At least one message failed to send.
    Failed,
}

/// Pointer to the last message event of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMessage {
    pub event_id: String,
    pub origin_server_ts: DateTime<Utc>,
}

/// Facts about a room known only through a space-child relationship, e.g.
/// a suggested room the user has not joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceChildInfo {
    pub display_name: Option<String>,
    /// Server-supplied ordering hint. Display tie-breaking only.
    pub order: Option<String>,
}

/// Denormalized, read-only facts about one room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub room_id: String,
    pub display_name: Option<String>,
    pub topic: Option<String>,
    pub membership: Membership,
    /// Unread messages that triggered a notification.
    pub notification_count: u64,
    /// Unread messages that triggered a highlight (mention).
    pub highlight_count: u64,
    pub data_types: DataTypes,
    pub sent_status: SentStatus,
    pub last_message: Option<LastMessage>,
    /// Lexicographic tag order for favorite rooms, if tagged.
    pub favorite_tag_order: Option<String>,
    pub space_child_info: Option<SpaceChildInfo>,
}

impl RoomSummary {
    /// A joined, untyped room with no activity. Fixture base for hosts/tests.
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            display_name: None,
            topic: None,
            membership: Membership::Join,
            notification_count: 0,
            highlight_count: 0,
            data_types: DataTypes::empty(),
            sent_status: SentStatus::Ok,
            last_message: None,
            favorite_tag_order: None,
            space_child_info: None,
        }
    }

    /// `true` if at least one of the given flags applies to this room.
    pub fn is_typed(&self, types: DataTypes) -> bool {
        self.data_types.contains_any(types)
    }

    pub fn is_direct(&self) -> bool {
        self.is_typed(data_types::DIRECT)
    }

    pub fn is_space(&self) -> bool {
        self.is_typed(data_types::SPACE)
    }

    pub fn has_any_notification(&self) -> bool {
        self.notification_count > 0
    }

    pub fn has_any_highlight(&self) -> bool {
        self.highlight_count > 0
    }

    pub fn has_any_unread(&self) -> bool {
        self.is_typed(data_types::UNREAD)
    }
}
