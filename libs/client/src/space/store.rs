//! Durable cache for the space-graph snapshot.
//!
//! Save moves the previous snapshot to a backup file before writing the new
//! primary, so a crash mid-write leaves either the old snapshot (backup) or
//! the new one on disk, never a half-written primary mistaken for valid.
//! Every failure surfaces as `false` / `None`: the caller rebuilds in
//! memory and the subsystem stays usable without the store.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::StoreError;
use crate::space::SpaceGraph;

const STORE_DIR: &str = "spacestore";
const GRAPH_FILE: &str = "graph.json";
const BACKUP_SUFFIX: &str = "backup";

/// Where one account's space cache lives.
///
/// `cache_dir` should be a process-shared cache location when several
/// cooperating processes (an app and its extensions) read the same account.
#[derive(Debug, Clone)]
pub struct SpaceStoreConfig {
    pub cache_dir: PathBuf,
    pub user_id: String,
    pub device_id: String,
}

/// File-backed store for the last computed [`SpaceGraph`].
pub struct SpaceGraphStore {
    store_dir: PathBuf,
    /// Overlapping saves must not interleave their backup/write steps.
    save_lock: Mutex<()>,
}

impl SpaceGraphStore {
    pub fn new(config: SpaceStoreConfig) -> Self {
        let store_dir = config
            .cache_dir
            .join(STORE_DIR)
            .join(&config.user_id)
            .join(&config.device_id);
        Self {
            store_dir,
            save_lock: Mutex::new(()),
        }
    }

    /// Persist a snapshot. Returns `false` on any failure; the previous
    /// snapshot (or its backup) is left recoverable in that case.
    pub fn save(&self, graph: &SpaceGraph) -> bool {
        let _guard = self.save_lock.lock();
        match self.save_inner(graph) {
            Ok(()) => true,
            Err(error) => {
                tracing::error!(path = %self.store_dir.display(), %error, "graph save failed");
                false
            }
        }
    }

    /// The cached snapshot, or `None` when there is none or it fails to
    /// decode. Never an error: the caller rebuilds from current spaces.
    pub fn load(&self) -> Option<SpaceGraph> {
        self.load_file(&self.graph_path())
    }

    /// Like [`load`](Self::load), but falls back to the backup file when the
    /// primary is missing or corrupt.
    pub fn load_or_backup(&self) -> Option<SpaceGraph> {
        self.load().or_else(|| {
            tracing::warn!(
                path = %self.store_dir.display(),
                "primary graph snapshot unusable, trying backup"
            );
            self.load_file(&self.backup_path())
        })
    }

    fn graph_path(&self) -> PathBuf {
        self.store_dir.join(GRAPH_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        let mut path = self.graph_path().into_os_string();
        path.push(".");
        path.push(BACKUP_SUFFIX);
        PathBuf::from(path)
    }

    fn save_inner(&self, graph: &SpaceGraph) -> Result<(), StoreError> {
        fs::create_dir_all(&self.store_dir).map_err(|source| StoreError::CreateDir {
            path: self.store_dir.clone(),
            source,
        })?;

        let graph_path = self.graph_path();
        let backup_path = self.backup_path();

        if graph_path.exists() {
            if backup_path.exists() {
                fs::remove_file(&backup_path).map_err(|source| StoreError::Io {
                    path: backup_path.clone(),
                    source,
                })?;
            }
            fs::rename(&graph_path, &backup_path).map_err(|source| StoreError::Io {
                path: graph_path.clone(),
                source,
            })?;
        }

        let document = serde_json::to_vec(graph)?;
        fs::write(&graph_path, document).map_err(|source| StoreError::Io {
            path: graph_path,
            source,
        })?;
        Ok(())
    }

    fn load_file(&self, path: &Path) -> Option<SpaceGraph> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return None,
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "graph snapshot unreadable");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(graph) => Some(graph),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "graph snapshot failed to decode");
                None
            }
        }
    }
}
