//! Incremental room-list fetching over the summary mirror.
//!
//! A fetcher owns one filtered, sorted, paginated view. Every recompute
//! builds a fresh immutable [`RoomListData`] snapshot and swaps it in whole;
//! readers never observe a partially updated list. In async mode recomputes
//! run on the blocking pool and stale results are discarded by generation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tessera_common::RoomSummary;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::observer::{ObserverHandle, ObserverRegistry};
use crate::summary::{RoomSummaryProvider, SummaryFeed};

use super::data::{RoomListCounts, RoomListData};
use super::filter::RoomListFilter;
use super::pagination::PaginationOptions;
use super::sort::RoomListSort;

/// Where recomputation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Inline, on the calling thread. Deterministic; meant for tests and
    /// already-backgrounded callers.
    Sync,
    /// On the blocking pool, with last-write-wins publication. Requires a
    /// tokio runtime.
    Async,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetcherState {
    /// No fetch has run yet.
    Idle,
    /// A recompute is in flight.
    Loading,
    /// A snapshot is available.
    Ready,
    /// Terminal. Every subsequent command is a no-op.
    Stopped,
}

/// Payload delivered to observers on every published snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomListChange {
    /// Whether the whole-result room count differs from the previous
    /// snapshot's. Always true when pagination is disabled.
    pub total_counts_changed: bool,
}

#[derive(Debug, Clone)]
pub struct RoomListFetchOptions {
    pub filter: RoomListFilter,
    pub sort: RoomListSort,
    pub pagination: PaginationOptions,
    pub mode: FetchMode,
}

impl Default for RoomListFetchOptions {
    fn default() -> Self {
        Self {
            filter: RoomListFilter::all_rooms(),
            sort: RoomListSort::default(),
            pagination: PaginationOptions::default(),
            mode: FetchMode::Sync,
        }
    }
}

struct FetcherInner {
    provider: Arc<dyn RoomSummaryProvider>,
    options: RwLock<RoomListFetchOptions>,
    state: RwLock<FetcherState>,
    data: RwLock<Option<Arc<RoomListData>>>,
    observers: ObserverRegistry<RoomListChange>,
    generation: AtomicU64,
}

impl FetcherInner {
    /// Filter, sort, and cut the mirror down to the first `upto` rooms
    /// (`None` loads everything).
    fn compute_data(&self, upto: Option<usize>) -> Arc<RoomListData> {
        let options = self.options.read().clone();

        let mut matched: Vec<Arc<RoomSummary>> = self
            .provider
            .room_ids()
            .into_iter()
            .filter_map(|room_id| self.provider.summary(&room_id))
            .filter(|room| options.filter.matches(room))
            .collect();
        options.sort.sort_rooms(&mut matched);

        let total = options
            .pagination
            .page_size()
            .map(|_| Box::new(RoomListCounts::with_rooms(&matched)));
        if let Some(upto) = upto {
            matched.truncate(upto);
        }
        let mut counts = RoomListCounts::with_rooms(&matched);
        counts.total = total;

        Arc::new(RoomListData::new(matched, counts, options.pagination))
    }

    /// Swap in a snapshot and notify. `Stopped` is terminal: the state lock
    /// is held across the check and the data swap, so a recompute that raced
    /// `stop` is discarded here rather than resurrecting the fetcher.
    fn publish(&self, new_data: Arc<RoomListData>) {
        let mut state = self.state.write();
        if *state == FetcherState::Stopped {
            return;
        }
        let previous = self.data.write().replace(new_data.clone());
        *state = FetcherState::Ready;
        drop(state);

        let total_counts_changed = match new_data.pagination.page_size() {
            None => true,
            Some(_) => {
                let old_total = previous
                    .as_ref()
                    .and_then(|data| data.counts.total.as_ref())
                    .map(|total| total.number_of_rooms);
                let new_total = new_data
                    .counts
                    .total
                    .as_ref()
                    .map(|total| total.number_of_rooms);
                old_total != new_total
            }
        };
        self.observers.notify(&RoomListChange {
            total_counts_changed,
        });
    }

    fn execute(self: &Arc<Self>, upto: Option<usize>) {
        {
            let mut state = self.state.write();
            if *state == FetcherState::Stopped {
                return;
            }
            *state = FetcherState::Loading;
        }

        let mode = self.options.read().mode;
        match mode {
            FetchMode::Sync => {
                let data = self.compute_data(upto);
                self.publish(data);
            }
            FetchMode::Async => {
                let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                let inner = Arc::clone(self);
                tokio::spawn(async move {
                    let computed = tokio::task::spawn_blocking({
                        let inner = Arc::clone(&inner);
                        move || inner.compute_data(upto)
                    })
                    .await;
                    let Ok(data) = computed else {
                        return;
                    };
                    // A newer command superseded this recompute; publish
                    // itself discards results that raced a stop.
                    if inner.generation.load(Ordering::SeqCst) != generation {
                        return;
                    }
                    inner.publish(data);
                });
            }
        }
    }

    fn paginate(self: &Arc<Self>) {
        let page_size = self.options.read().pagination.page_size();
        let upto = match self.data.read().clone() {
            None => page_size,
            Some(data) => {
                if !data.has_more_rooms() {
                    return;
                }
                page_size.map(|size| (data.current_page() + 2) * size)
            }
        };
        self.execute(upto);
    }

    fn reset_pagination(self: &Arc<Self>) {
        let page_size = self.options.read().pagination.page_size();
        self.execute(page_size);
    }

    /// Recompute the currently loaded span. A no-op before the first load.
    fn refresh(self: &Arc<Self>) {
        let Some(data) = self.data.read().clone() else {
            return;
        };
        let upto = self
            .options
            .read()
            .pagination
            .page_size()
            .map(|size| (data.current_page() + 1) * size);
        self.execute(upto);
    }
}

/// Serves one live room-list view over a summary mirror.
pub struct RoomListFetcher {
    inner: Arc<FetcherInner>,
    feed_task: Mutex<Option<JoinHandle<()>>>,
}

impl RoomListFetcher {
    pub fn new(provider: Arc<dyn RoomSummaryProvider>, options: RoomListFetchOptions) -> Self {
        Self {
            inner: Arc::new(FetcherInner {
                provider,
                options: RwLock::new(options),
                state: RwLock::new(FetcherState::Idle),
                data: RwLock::new(None),
                observers: ObserverRegistry::new(),
                generation: AtomicU64::new(0),
            }),
            feed_task: Mutex::new(None),
        }
    }

    /// Like [`new`](Self::new), additionally refreshing whenever the feed
    /// reports a mirror mutation. Requires a tokio runtime. A lagged receiver
    /// refreshes anyway; the loaded span is recomputed from the store either
    /// way.
    pub fn with_feed(
        provider: Arc<dyn RoomSummaryProvider>,
        options: RoomListFetchOptions,
        feed: &SummaryFeed,
    ) -> Self {
        let fetcher = Self::new(provider, options);
        let inner = Arc::clone(&fetcher.inner);
        let mut receiver = feed.subscribe();
        let task = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => inner.refresh(),
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        *fetcher.feed_task.lock() = Some(task);
        fetcher
    }

    pub fn state(&self) -> FetcherState {
        *self.inner.state.read()
    }

    /// The current snapshot, if one has been published.
    pub fn data(&self) -> Option<Arc<RoomListData>> {
        self.inner.data.read().clone()
    }

    pub fn options(&self) -> RoomListFetchOptions {
        self.inner.options.read().clone()
    }

    /// Register for change notifications. Dropping the handle unregisters.
    pub fn add_observer<F>(&self, callback: F) -> ObserverHandle
    where
        F: Fn(&RoomListChange) + Send + Sync + 'static,
    {
        self.inner.observers.register(callback)
    }

    /// Load the first page, or extend the loaded span by one page. A no-op
    /// once everything is loaded.
    pub fn paginate(&self) {
        self.inner.paginate();
    }

    /// Drop back to the first page.
    pub fn reset_pagination(&self) {
        self.inner.reset_pagination();
    }

    /// Recompute the currently loaded span against the mirror.
    pub fn refresh(&self) {
        self.inner.refresh();
    }

    /// Replace the filter and recompute the loaded span.
    pub fn set_filter(&self, filter: RoomListFilter) {
        self.inner.options.write().filter = filter;
        self.inner.refresh();
    }

    /// Replace the sort order and recompute the loaded span.
    pub fn set_sort(&self, sort: RoomListSort) {
        self.inner.options.write().sort = sort;
        self.inner.refresh();
    }

    /// Terminal shutdown: discards the snapshot, drops every observer, and
    /// cancels in-flight and feed-driven recomputes. Nothing is notified.
    pub fn stop(&self) {
        *self.inner.state.write() = FetcherState::Stopped;
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.feed_task.lock().take() {
            task.abort();
        }
        self.inner.observers.remove_all();
        *self.inner.data.write() = None;
    }
}

impl Drop for RoomListFetcher {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::MemoryRoomSummaryStore;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tessera_common::data_types;

    /// Provider whose successive `room_ids` calls stall for the queued
    /// durations, so overlapping recomputes can be made to finish out of
    /// order.
    struct DelayedProvider {
        inner: Arc<MemoryRoomSummaryStore>,
        delays: Mutex<VecDeque<Duration>>,
    }

    impl DelayedProvider {
        fn new(inner: Arc<MemoryRoomSummaryStore>, delays_ms: &[u64]) -> Arc<Self> {
            Arc::new(Self {
                inner,
                delays: Mutex::new(
                    delays_ms.iter().map(|ms| Duration::from_millis(*ms)).collect(),
                ),
            })
        }
    }

    impl RoomSummaryProvider for DelayedProvider {
        fn room_ids(&self) -> Vec<String> {
            let delay = self.delays.lock().pop_front();
            if let Some(delay) = delay {
                std::thread::sleep(delay);
            }
            self.inner.room_ids()
        }

        fn summary(&self, room_id: &str) -> Option<Arc<RoomSummary>> {
            self.inner.summary(room_id)
        }
    }

    fn store_with_rooms(n: usize) -> Arc<MemoryRoomSummaryStore> {
        let store = MemoryRoomSummaryStore::new();
        for i in 0..n {
            store.upsert(RoomSummary::new(format!("!room{i:03}:s")));
        }
        Arc::new(store)
    }

    fn paged_options(page_size: usize) -> RoomListFetchOptions {
        RoomListFetchOptions {
            pagination: PaginationOptions::Custom(page_size),
            ..Default::default()
        }
    }

    #[test]
    fn first_paginate_loads_one_page() {
        let fetcher = RoomListFetcher::new(store_with_rooms(25), paged_options(10));
        assert_eq!(fetcher.state(), FetcherState::Idle);
        assert!(fetcher.data().is_none());

        fetcher.paginate();

        let data = fetcher.data().unwrap();
        assert_eq!(fetcher.state(), FetcherState::Ready);
        assert_eq!(data.rooms.len(), 10);
        assert_eq!(data.current_page(), 0);
        assert_eq!(
            data.counts.total.as_ref().map(|t| t.number_of_rooms),
            Some(25)
        );
        assert!(data.has_more_rooms());
    }

    #[test]
    fn pagination_walks_to_the_end_then_stops() {
        let fetcher = RoomListFetcher::new(store_with_rooms(25), paged_options(10));

        fetcher.paginate();
        fetcher.paginate();
        let data = fetcher.data().unwrap();
        assert_eq!(data.rooms.len(), 20);
        assert_eq!(data.current_page(), 1);
        assert!(data.has_more_rooms());

        fetcher.paginate();
        let data = fetcher.data().unwrap();
        assert_eq!(data.rooms.len(), 25);
        assert!(!data.has_more_rooms());

        // Everything is loaded; further pagination keeps the snapshot.
        fetcher.paginate();
        assert!(Arc::ptr_eq(&data, &fetcher.data().unwrap()));
    }

    #[test]
    fn disabled_pagination_loads_everything_at_once() {
        let fetcher = RoomListFetcher::new(
            store_with_rooms(25),
            RoomListFetchOptions {
                pagination: PaginationOptions::None,
                ..Default::default()
            },
        );
        fetcher.paginate();

        let data = fetcher.data().unwrap();
        assert_eq!(data.rooms.len(), 25);
        assert!(data.counts.total.is_none());
        assert!(!data.has_more_rooms());
    }

    #[test]
    fn refresh_before_first_load_is_a_no_op() {
        let fetcher = RoomListFetcher::new(store_with_rooms(5), paged_options(10));
        fetcher.refresh();
        assert_eq!(fetcher.state(), FetcherState::Idle);
        assert!(fetcher.data().is_none());
    }

    #[test]
    fn refresh_recomputes_the_loaded_span() {
        let store = store_with_rooms(25);
        let fetcher = RoomListFetcher::new(store.clone(), paged_options(10));
        fetcher.paginate();
        fetcher.paginate();
        assert_eq!(fetcher.data().unwrap().rooms.len(), 20);

        store.upsert(RoomSummary::new("!another:s"));
        fetcher.refresh();

        let data = fetcher.data().unwrap();
        assert_eq!(data.rooms.len(), 20);
        assert_eq!(
            data.counts.total.as_ref().map(|t| t.number_of_rooms),
            Some(26)
        );
    }

    #[test]
    fn reset_pagination_drops_back_to_one_page() {
        let fetcher = RoomListFetcher::new(store_with_rooms(25), paged_options(10));
        fetcher.paginate();
        fetcher.paginate();
        fetcher.reset_pagination();

        let data = fetcher.data().unwrap();
        assert_eq!(data.rooms.len(), 10);
        assert_eq!(data.current_page(), 0);
    }

    #[test]
    fn set_filter_recomputes_and_reports_total_change() {
        let store = store_with_rooms(25);
        let fetcher = RoomListFetcher::new(store, paged_options(10));
        fetcher.paginate();

        let total_changes = Arc::new(AtomicUsize::new(0));
        let seen = total_changes.clone();
        let _handle = fetcher.add_observer(move |change: &RoomListChange| {
            if change.total_counts_changed {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });

        fetcher.set_filter(RoomListFilter {
            query: Some("room00".to_string()),
            ..RoomListFilter::all_rooms()
        });

        // Unnamed rooms never match a query.
        let data = fetcher.data().unwrap();
        assert!(data.rooms.is_empty());
        assert_eq!(
            data.counts.total.as_ref().map(|t| t.number_of_rooms),
            Some(0)
        );
        assert_eq!(total_changes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn observer_not_flagged_when_total_is_stable() {
        let fetcher = RoomListFetcher::new(store_with_rooms(25), paged_options(10));
        fetcher.paginate();

        let flagged = Arc::new(AtomicUsize::new(0));
        let notified = Arc::new(AtomicUsize::new(0));
        let flagged_clone = flagged.clone();
        let notified_clone = notified.clone();
        let _handle = fetcher.add_observer(move |change: &RoomListChange| {
            notified_clone.fetch_add(1, Ordering::SeqCst);
            if change.total_counts_changed {
                flagged_clone.fetch_add(1, Ordering::SeqCst);
            }
        });

        fetcher.paginate();

        assert_eq!(notified.load(Ordering::SeqCst), 1);
        assert_eq!(flagged.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn stop_is_terminal_and_silent() {
        let fetcher = RoomListFetcher::new(store_with_rooms(25), paged_options(10));
        fetcher.paginate();

        let notified = Arc::new(AtomicUsize::new(0));
        let notified_clone = notified.clone();
        let _handle = fetcher.add_observer(move |_: &RoomListChange| {
            notified_clone.fetch_add(1, Ordering::SeqCst);
        });

        fetcher.stop();
        assert_eq!(fetcher.state(), FetcherState::Stopped);
        assert!(fetcher.data().is_none());
        assert_eq!(notified.load(Ordering::SeqCst), 0);

        fetcher.paginate();
        fetcher.refresh();
        assert!(fetcher.data().is_none());
        assert_eq!(notified.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn snapshot_completing_after_stop_is_discarded() {
        let fetcher = RoomListFetcher::new(store_with_rooms(5), paged_options(10));
        fetcher.paginate();

        // A recompute that passed its pre-publish checks before stop ran.
        let late = fetcher.inner.compute_data(Some(10));
        fetcher.stop();
        fetcher.inner.publish(late);

        assert_eq!(fetcher.state(), FetcherState::Stopped);
        assert!(fetcher.data().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rapid_filter_changes_publish_only_the_newest() {
        let store = MemoryRoomSummaryStore::new();
        for i in 0..20 {
            store.upsert(RoomSummary::new(format!("!group{i:02}:s")));
        }
        for i in 0..5 {
            let mut dm = RoomSummary::new(format!("!dm{i}:s"));
            dm.data_types = data_types::DIRECT;
            store.upsert(dm);
        }
        // First load is instant; the first filter change computes slowly and
        // the second instantly, so the superseded result finishes last.
        let provider = DelayedProvider::new(Arc::new(store), &[0, 400, 0]);
        let fetcher = RoomListFetcher::new(
            provider,
            RoomListFetchOptions {
                mode: FetchMode::Async,
                ..paged_options(10)
            },
        );

        fetcher.paginate();
        for _ in 0..500 {
            if fetcher.data().is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(fetcher.data().unwrap().rooms.len(), 10);

        fetcher.set_filter(RoomListFilter {
            query: Some("zzz".to_string()),
            ..RoomListFilter::all_rooms()
        });
        // Give the slow recompute time to start under the old filter before
        // superseding it.
        std::thread::sleep(Duration::from_millis(50));
        fetcher.set_filter(RoomListFilter {
            data_types: data_types::DIRECT,
            ..RoomListFilter::all_rooms()
        });

        let direct_total = |data: &Arc<RoomListData>| {
            data.counts.total.as_ref().map(|total| total.number_of_rooms)
        };

        // The newest request lands first.
        let mut landed = false;
        for _ in 0..500 {
            if fetcher.data().as_ref().map(&direct_total) == Some(Some(5)) {
                landed = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        assert!(landed, "newest filter never published");

        // And must still be the published result once the superseded
        // recompute has finished: last write wins by logical request, not
        // by completion order.
        std::thread::sleep(Duration::from_millis(600));
        let data = fetcher.data().unwrap();
        assert_eq!(direct_total(&data), Some(5));
        assert_eq!(data.rooms.len(), 5);
        assert!(data.rooms.iter().all(|room| room.is_direct()));
        assert_eq!(fetcher.state(), FetcherState::Ready);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn async_mode_publishes_off_thread() {
        let fetcher = RoomListFetcher::new(
            store_with_rooms(25),
            RoomListFetchOptions {
                mode: FetchMode::Async,
                ..paged_options(10)
            },
        );
        fetcher.paginate();

        // Bounded wait for the background recompute to land.
        let mut data = None;
        for _ in 0..500 {
            data = fetcher.data();
            if data.is_some() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        let data = data.expect("async paginate never published");
        assert_eq!(data.rooms.len(), 10);
        assert_eq!(fetcher.state(), FetcherState::Ready);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn feed_updates_drive_refresh() {
        let store = store_with_rooms(10);
        let fetcher = RoomListFetcher::with_feed(
            store.clone(),
            RoomListFetchOptions {
                mode: FetchMode::Async,
                ..paged_options(10)
            },
            store.feed(),
        );
        fetcher.paginate();
        for _ in 0..500 {
            if fetcher.data().is_some() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        assert_eq!(fetcher.data().unwrap().rooms.len(), 10);

        // A mirror mutation must reach the snapshot without an explicit
        // refresh.
        store.remove("!room000:s");
        let mut shrunk = false;
        for _ in 0..500 {
            if fetcher.data().map(|d| d.rooms.len()) == Some(9) {
                shrunk = true;
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        assert!(shrunk, "feed-driven refresh never landed");
    }
}
