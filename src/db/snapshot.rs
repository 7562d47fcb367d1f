use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableTable};

use super::tables;
use super::{AttemptRepo, SnapshotRepo, Store};
use crate::config::StoreBackend;
use crate::constants::{INITIAL_SNAPSHOT_VERSION, SNAPSHOT_KEY};
use crate::error::Result;
use crate::models::{LoginAttempt, Snapshot, SnapshotGroup, WriteOutcome};
use crate::security::now_ms;

/// Single-document store on redb
///
/// The whole dataset lives under one key. redb serializes write
/// transactions, so the version check and the replacement in
/// [`SnapshotRepo::write_snapshot`] cannot interleave with another writer.
#[derive(Clone)]
pub struct SnapshotStore {
    db: Arc<Database>,
}

fn decode_snapshot(raw: Option<&[u8]>) -> Result<Snapshot> {
    match raw {
        Some(bytes) => Ok(serde_json::from_slice(bytes)?),
        None => Ok(Snapshot {
            version: INITIAL_SNAPSHOT_VERSION,
            data: Vec::new(),
        }),
    }
}

impl SnapshotStore {
    /// Open or create the redb file, creating its tables on first run
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        tokio::task::spawn_blocking(move || Self::open_blocking(path)).await?
    }

    fn open_blocking(path: PathBuf) -> Result<Self> {
        tracing::info!("Opening snapshot database at: {:?}", path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    tracing::error!("Failed to create snapshot directory: {}", e);
                    redb::Error::Io(e)
                })?;
            }
        }

        let db = Database::create(&path)?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(tables::SNAPSHOT)?;
            let _ = write_txn.open_table(tables::LOGIN_ATTEMPTS)?;
        }
        write_txn.commit()?;

        tracing::info!("Snapshot database initialized");
        Ok(Self { db: Arc::new(db) })
    }

    /// Run redb work off the async runtime
    async fn blocking<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || work(&db)).await?
    }
}

#[async_trait]
impl Store for SnapshotStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Snapshot
    }

    async fn health_check(&self) -> Result<()> {
        self.blocking(|db| {
            let read_txn = db.begin_read()?;
            let _ = read_txn.open_table(tables::SNAPSHOT)?;
            Ok(())
        })
        .await
    }

    fn attempts(&self) -> &dyn AttemptRepo {
        self
    }

    fn snapshots(&self) -> Option<&dyn SnapshotRepo> {
        Some(self)
    }
}

#[async_trait]
impl SnapshotRepo for SnapshotStore {
    async fn read_snapshot(&self) -> Result<Snapshot> {
        self.blocking(|db| {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(tables::SNAPSHOT)?;
            let guard = table.get(SNAPSHOT_KEY)?;
            let snapshot = decode_snapshot(guard.as_ref().map(|g| g.value()))?;
            Ok(snapshot)
        })
        .await
    }

    async fn write_snapshot(
        &self,
        data: Vec<SnapshotGroup>,
        expected_version: i64,
    ) -> Result<WriteOutcome> {
        self.blocking(move |db| {
            let write_txn = db.begin_write()?;
            let outcome = {
                let mut table = write_txn.open_table(tables::SNAPSHOT)?;
                let current_version = {
                    let guard = table.get(SNAPSHOT_KEY)?;
                    let current = decode_snapshot(guard.as_ref().map(|g| g.value()))?;
                    current.version
                };

                if current_version != expected_version {
                    WriteOutcome::Conflict {
                        current_version,
                        pending: data,
                    }
                } else {
                    let new_version = now_ms().max(current_version + 1);
                    let bytes = serde_json::to_vec(&Snapshot {
                        version: new_version,
                        data,
                    })?;
                    table.insert(SNAPSHOT_KEY, bytes.as_slice())?;
                    WriteOutcome::Committed { new_version }
                }
            };

            match &outcome {
                WriteOutcome::Committed { new_version } => {
                    write_txn.commit()?;
                    tracing::info!(
                        "Snapshot written: version {} -> {}",
                        expected_version,
                        new_version
                    );
                }
                WriteOutcome::Conflict {
                    current_version, ..
                } => {
                    write_txn.abort()?;
                    tracing::warn!(
                        "Snapshot write rejected: expected version {}, current {}",
                        expected_version,
                        current_version
                    );
                }
            }

            Ok(outcome)
        })
        .await
    }
}

#[async_trait]
impl AttemptRepo for SnapshotStore {
    async fn load_attempt(&self, identity: &str) -> Result<Option<LoginAttempt>> {
        let identity = identity.to_string();
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(tables::LOGIN_ATTEMPTS)?;
            let record = match table.get(identity.as_str())? {
                Some(bytes) => Some(serde_json::from_slice(bytes.value())?),
                None => None,
            };
            Ok(record)
        })
        .await
    }

    async fn save_attempt(&self, attempt: &LoginAttempt) -> Result<()> {
        let attempt = attempt.clone();
        self.blocking(move |db| {
            let bytes = serde_json::to_vec(&attempt)?;
            let write_txn = db.begin_write()?;
            {
                let mut table = write_txn.open_table(tables::LOGIN_ATTEMPTS)?;
                table.insert(attempt.identity.as_str(), bytes.as_slice())?;
            }
            write_txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn delete_attempt(&self, identity: &str) -> Result<()> {
        let identity = identity.to_string();
        self.blocking(move |db| {
            let write_txn = db.begin_write()?;
            {
                let mut table = write_txn.open_table(tables::LOGIN_ATTEMPTS)?;
                table.remove(identity.as_str())?;
            }
            write_txn.commit()?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SnapshotItem;

    fn groups(title: &str) -> Vec<SnapshotGroup> {
        vec![SnapshotGroup {
            category: title.to_string(),
            items: vec![SnapshotItem {
                title: "Docs".to_string(),
                url: "https://docs.rs".to_string(),
            }],
        }]
    }

    async fn store(dir: &tempfile::TempDir) -> SnapshotStore {
        SnapshotStore::open(dir.path().join("nav.redb")).await.unwrap()
    }

    #[tokio::test]
    async fn test_cold_start_reads_initial_version() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = store(&dir).await.read_snapshot().await.unwrap();

        assert_eq!(snapshot.version, INITIAL_SNAPSHOT_VERSION);
        assert!(snapshot.data.is_empty());
    }

    #[tokio::test]
    async fn test_write_with_current_version_commits() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        let outcome = store.write_snapshot(groups("A"), 1).await.unwrap();
        let new_version = match outcome {
            WriteOutcome::Committed { new_version } => new_version,
            other => panic!("expected commit, got {:?}", other),
        };
        assert!(new_version > 1);

        let snapshot = store.read_snapshot().await.unwrap();
        assert_eq!(snapshot.version, new_version);
        assert_eq!(snapshot.data, groups("A"));
    }

    #[tokio::test]
    async fn test_stale_write_returns_pending_and_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        store.write_snapshot(groups("A"), 1).await.unwrap();
        let before = store.read_snapshot().await.unwrap();

        let outcome = store.write_snapshot(groups("B"), 1).await.unwrap();
        assert_eq!(
            outcome,
            WriteOutcome::Conflict {
                current_version: before.version,
                pending: groups("B"),
            }
        );
        assert_eq!(store.read_snapshot().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_versions_strictly_increase() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        let mut version = 1;
        for round in 0..5 {
            match store
                .write_snapshot(groups(&format!("r{}", round)), version)
                .await
                .unwrap()
            {
                WriteOutcome::Committed { new_version } => {
                    assert!(new_version > version);
                    version = new_version;
                }
                other => panic!("expected commit, got {:?}", other),
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_one_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .write_snapshot(groups(&format!("w{}", i)), 1)
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut committed = 0;
        for handle in handles {
            if let WriteOutcome::Committed { .. } = handle.await.unwrap() {
                committed += 1;
            }
        }
        assert_eq!(committed, 1);
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = store(&dir).await;
            store.write_snapshot(groups("Kept"), 1).await.unwrap();
        }

        let reopened = store(&dir).await;
        assert_eq!(reopened.read_snapshot().await.unwrap().data, groups("Kept"));
    }

    #[tokio::test]
    async fn test_attempt_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        let record = LoginAttempt::first("192.0.2.7", 5_000);

        store.save_attempt(&record).await.unwrap();
        assert_eq!(store.load_attempt("192.0.2.7").await.unwrap(), Some(record));

        store.delete_attempt("192.0.2.7").await.unwrap();
        assert_eq!(store.load_attempt("192.0.2.7").await.unwrap(), None);
    }
}
