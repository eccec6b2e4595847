#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Once};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use tessera_client::space::child::{SpaceChildContent, SpaceChildEvent};
use tessera_client::space::{MemberFetchError, SpaceMemberSource};
use tessera_client::{MemoryRoomSummaryStore, SpaceStoreConfig};
use tessera_common::{data_types, DataTypes, RoomSummary};

/// Install a fmt subscriber once per test binary, honoring `RUST_LOG`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::from_default_env())
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}

/// A joined, quiet, untyped room.
pub fn room(room_id: &str) -> RoomSummary {
    RoomSummary::new(room_id)
}

pub fn typed_room(room_id: &str, types: DataTypes) -> RoomSummary {
    let mut summary = RoomSummary::new(room_id);
    summary.data_types = types;
    summary
}

pub fn noisy_room(room_id: &str, notifications: u64, highlights: u64) -> RoomSummary {
    let mut summary = RoomSummary::new(room_id);
    summary.notification_count = notifications;
    summary.highlight_count = highlights;
    summary
}

pub fn space_summary(space_id: &str) -> RoomSummary {
    typed_room(space_id, data_types::SPACE)
}

/// A live child assertion with one candidate server.
pub fn child_event(child_id: &str) -> SpaceChildEvent {
    SpaceChildEvent::asserts(
        child_id,
        SpaceChildContent {
            via: Some(vec!["server.example".to_string()]),
            ..Default::default()
        },
    )
}

pub fn suggested_child_event(child_id: &str) -> SpaceChildEvent {
    SpaceChildEvent::asserts(
        child_id,
        SpaceChildContent {
            via: Some(vec!["server.example".to_string()]),
            suggested: true,
            ..Default::default()
        },
    )
}

/// Member source resolving every space to the same member list.
pub struct StaticMembers(pub Vec<String>);

impl SpaceMemberSource for StaticMembers {
    fn members_of(&self, _space_id: &str) -> Result<Vec<String>, MemberFetchError> {
        Ok(self.0.clone())
    }
}

/// Member source for spaces whose members do not matter to the scenario.
pub struct NoMembers;

impl SpaceMemberSource for NoMembers {
    fn members_of(&self, _space_id: &str) -> Result<Vec<String>, MemberFetchError> {
        Ok(vec![])
    }
}

pub fn store_config(cache_dir: &Path) -> SpaceStoreConfig {
    SpaceStoreConfig {
        cache_dir: cache_dir.to_path_buf(),
        user_id: "@me:server.example".to_string(),
        device_id: "TESTDEVICE".to_string(),
    }
}

/// Mirror pre-populated with the given summaries.
pub fn mirror_with(summaries: impl IntoIterator<Item = RoomSummary>) -> Arc<MemoryRoomSummaryStore> {
    let store = MemoryRoomSummaryStore::new();
    for summary in summaries {
        store.upsert(summary);
    }
    Arc::new(store)
}
