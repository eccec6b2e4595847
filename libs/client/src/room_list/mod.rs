//! Filtered, sorted, paginated room-list views over the summary mirror.

pub mod data;
pub mod fetcher;
pub mod filter;
pub mod pagination;
pub mod sort;

pub use data::{RoomListCounts, RoomListData};
pub use fetcher::{
    FetchMode, FetcherState, RoomListChange, RoomListFetchOptions, RoomListFetcher,
};
pub use filter::{
    FilterEvaluator, InMemoryEvaluator, RoomListFilter, SpaceScope, StoreEvaluator,
};
pub use pagination::PaginationOptions;
pub use sort::RoomListSort;
