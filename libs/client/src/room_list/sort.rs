//! Multi-key room ordering with independently togglable keys.

use std::cmp::Ordering;
use std::sync::Arc;

use tessera_common::RoomSummary;

/// Prioritized sort keys. Enabled keys apply as successive tie-breakers in
/// the fixed order they are declared below; disabling one removes it from
/// the chain without affecting the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomListSort {
    /// Invited rooms before joined rooms.
    pub invites_first: bool,
    /// Rooms with unsent messages first.
    pub sent_status: bool,
    /// Rooms with highlights, then rooms with notifications, first.
    pub missed_notifications_first: bool,
    /// Rooms with unread messages first.
    pub unread_messages_first: bool,
    /// Most recent last-message first; rooms without one last.
    pub last_event_date: bool,
    /// Case-insensitive display name, ascending; unnamed rooms last.
    pub alphabetical: bool,
    /// Lexicographically "bigger" favorite tags first.
    pub favorite_tag: bool,
}

impl Default for RoomListSort {
    fn default() -> Self {
        Self {
            invites_first: true,
            sent_status: true,
            missed_notifications_first: false,
            unread_messages_first: false,
            last_event_date: true,
            alphabetical: false,
            favorite_tag: false,
        }
    }
}

impl RoomListSort {
    /// Every key disabled: input order is preserved (the sort is stable).
    pub fn unsorted() -> Self {
        Self {
            invites_first: false,
            sent_status: false,
            missed_notifications_first: false,
            unread_messages_first: false,
            last_event_date: false,
            alphabetical: false,
            favorite_tag: false,
        }
    }

    pub fn sort_rooms(&self, rooms: &mut [Arc<RoomSummary>]) {
        rooms.sort_by(|a, b| self.compare(a, b));
    }

    pub fn compare(&self, a: &RoomSummary, b: &RoomSummary) -> Ordering {
        if self.invites_first {
            let ordering = a.membership.cmp(&b.membership);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        if self.sent_status {
            let ordering = b.sent_status.cmp(&a.sent_status);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        if self.missed_notifications_first {
            let ordering = b
                .has_any_highlight()
                .cmp(&a.has_any_highlight())
                .then_with(|| b.has_any_notification().cmp(&a.has_any_notification()));
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        if self.unread_messages_first {
            let ordering = b.has_any_unread().cmp(&a.has_any_unread());
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        if self.last_event_date {
            let a_ts = a.last_message.as_ref().map(|m| m.origin_server_ts);
            let b_ts = b.last_message.as_ref().map(|m| m.origin_server_ts);
            let ordering = b_ts.cmp(&a_ts);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        if self.alphabetical {
            let a_name = a.display_name.as_deref().map(str::to_lowercase);
            let b_name = b.display_name.as_deref().map(str::to_lowercase);
            // Named rooms first, then ascending by name.
            let ordering = match (a_name, b_name) {
                (Some(a_name), Some(b_name)) => a_name.cmp(&b_name),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        if self.favorite_tag {
            let ordering = b.favorite_tag_order.cmp(&a.favorite_tag_order);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}
