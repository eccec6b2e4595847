//! Space hierarchy and room-list views over a local room mirror.
//!
//! This crate derives a directed hierarchy of spaces and rooms from per-room
//! state events, persists the derived graph crash-safely, aggregates unread
//! and highlight counts over it, and serves filtered, sorted, paginated
//! room-list views to presentation layers. It performs no network I/O of its
//! own: every input arrives already materialized from the sync layer.

pub mod error;
pub mod observer;
pub mod room_list;
pub mod space;
pub mod summary;

pub use error::StoreError;
pub use observer::{ObserverHandle, ObserverRegistry};
pub use room_list::{
    FetchMode, FetcherState, PaginationOptions, RoomListChange, RoomListCounts, RoomListData,
    RoomListFetchOptions, RoomListFetcher, RoomListFilter, RoomListSort, SpaceScope,
};
pub use space::{
    NotificationState, Space, SpaceGraph, SpaceGraphStore, SpaceNotificationCounter, SpaceService,
    SpaceStoreConfig,
};
pub use summary::{MemoryRoomSummaryStore, RoomSummaryProvider, SummaryFeed, SummaryUpdate};
