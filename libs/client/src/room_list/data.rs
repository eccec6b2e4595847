//! Immutable room-list snapshots handed to presentation layers.

use std::sync::Arc;

use tessera_common::{Membership, RoomSummary, SentStatus};

use super::pagination::PaginationOptions;

/// Aggregate figures over a set of rooms. When the set is one page of a
/// larger result, `total` carries the figures for the whole result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomListCounts {
    pub number_of_rooms: usize,
    pub number_of_invited_rooms: usize,
    pub number_of_unsent_rooms: usize,
    /// Rooms with pending notifications. Invited rooms always count as
    /// notified.
    pub number_of_notified_rooms: usize,
    pub number_of_highlighted_rooms: usize,
    pub total_notification_count: u64,
    pub total_highlight_count: u64,
    /// Whole-result figures, when this instance covers only a page.
    pub total: Option<Box<RoomListCounts>>,
}

impl RoomListCounts {
    pub fn with_rooms(rooms: &[Arc<RoomSummary>]) -> Self {
        let mut counts = Self::default();
        for room in rooms {
            counts.number_of_rooms += 1;
            let invited = room.membership == Membership::Invite;
            if invited {
                counts.number_of_invited_rooms += 1;
            }
            if room.sent_status == SentStatus::Failed {
                counts.number_of_unsent_rooms += 1;
            }
            if invited || room.has_any_notification() {
                counts.number_of_notified_rooms += 1;
            }
            if room.has_any_highlight() {
                counts.number_of_highlighted_rooms += 1;
            }
            counts.total_notification_count += room.notification_count;
            counts.total_highlight_count += room.highlight_count;
        }
        counts
    }
}

/// One materialized view: the rooms currently loaded, their counts, and the
/// pagination they were loaded under. Snapshots are never mutated; the
/// fetcher replaces the whole value on every recompute.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomListData {
    pub rooms: Vec<Arc<RoomSummary>>,
    pub counts: RoomListCounts,
    pub pagination: PaginationOptions,
}

impl RoomListData {
    pub fn new(
        rooms: Vec<Arc<RoomSummary>>,
        counts: RoomListCounts,
        pagination: PaginationOptions,
    ) -> Self {
        Self {
            rooms,
            counts,
            pagination,
        }
    }

    /// Zero-based index of the last fully or partially loaded page. Zero when
    /// pagination is disabled or nothing is loaded.
    pub fn current_page(&self) -> usize {
        let Some(page_size) = self.pagination.page_size() else {
            return 0;
        };
        let loaded = self.rooms.len();
        if loaded == 0 {
            return 0;
        }
        let full_pages = loaded / page_size;
        if loaded % page_size == 0 {
            full_pages - 1
        } else {
            full_pages
        }
    }

    /// Whether the whole result holds rooms beyond the loaded ones.
    pub fn has_more_rooms(&self) -> bool {
        match &self.counts.total {
            Some(total) => self.counts.number_of_rooms < total.number_of_rooms,
            None => false,
        }
    }

    /// The room at a loaded index, if in range.
    pub fn room_at(&self, index: usize) -> Option<&Arc<RoomSummary>> {
        self.rooms.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rooms(n: usize) -> Vec<Arc<RoomSummary>> {
        (0..n)
            .map(|i| Arc::new(RoomSummary::new(format!("!room{i}:s"))))
            .collect()
    }

    #[test]
    fn counts_bucket_invites_unsent_and_notifications() {
        let mut invited = RoomSummary::new("!inv:s");
        invited.membership = Membership::Invite;
        let mut failed = RoomSummary::new("!fail:s");
        failed.sent_status = SentStatus::Failed;
        let mut noisy = RoomSummary::new("!noisy:s");
        noisy.notification_count = 4;
        noisy.highlight_count = 1;

        let counts = RoomListCounts::with_rooms(&[
            Arc::new(invited),
            Arc::new(failed),
            Arc::new(noisy),
            Arc::new(RoomSummary::new("!quiet:s")),
        ]);

        assert_eq!(counts.number_of_rooms, 4);
        assert_eq!(counts.number_of_invited_rooms, 1);
        assert_eq!(counts.number_of_unsent_rooms, 1);
        // The invited room is notified even with a zero count.
        assert_eq!(counts.number_of_notified_rooms, 2);
        assert_eq!(counts.number_of_highlighted_rooms, 1);
        assert_eq!(counts.total_notification_count, 4);
        assert_eq!(counts.total_highlight_count, 1);
    }

    #[test]
    fn current_page_tracks_loaded_rooms() {
        let page = |loaded: usize| {
            let rooms = rooms(loaded);
            let counts = RoomListCounts::with_rooms(&rooms);
            RoomListData::new(rooms, counts, PaginationOptions::Custom(10)).current_page()
        };

        assert_eq!(page(0), 0);
        assert_eq!(page(5), 0);
        assert_eq!(page(10), 0);
        assert_eq!(page(11), 1);
        assert_eq!(page(20), 1);
        assert_eq!(page(21), 2);
    }

    #[test]
    fn current_page_is_zero_without_pagination() {
        let rooms = rooms(42);
        let counts = RoomListCounts::with_rooms(&rooms);
        let data = RoomListData::new(rooms, counts, PaginationOptions::None);
        assert_eq!(data.current_page(), 0);
    }

    #[test]
    fn has_more_rooms_compares_against_total() {
        let loaded = rooms(10);
        let mut counts = RoomListCounts::with_rooms(&loaded);
        counts.total = Some(Box::new(RoomListCounts::with_rooms(&rooms(25))));
        let data = RoomListData::new(loaded, counts, PaginationOptions::Custom(10));
        assert!(data.has_more_rooms());

        let everything = rooms(25);
        let mut counts = RoomListCounts::with_rooms(&everything);
        counts.total = Some(Box::new(RoomListCounts::with_rooms(&rooms(25))));
        let data = RoomListData::new(everything, counts, PaginationOptions::Custom(10));
        assert!(!data.has_more_rooms());
    }

    #[test]
    fn room_at_is_total() {
        let loaded = rooms(3);
        let counts = RoomListCounts::with_rooms(&loaded);
        let data = RoomListData::new(loaded, counts, PaginationOptions::None);
        assert_eq!(data.room_at(2).map(|r| r.room_id.as_str()), Some("!room2:s"));
        assert!(data.room_at(3).is_none());
    }
}
