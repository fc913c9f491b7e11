//! Minimal key-value persistence used by [`crate::FavoritesStore`].

use std::{
    collections::HashMap,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::StorageError;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Subdirectory holding in-flight writes.
const STAGING_DIR: &str = ".tmp";

static STAGED_WRITES: AtomicU64 = AtomicU64::new(0);

/// One `<key>.json` file per key inside a directory.
///
/// Each write goes to its own file under `.tmp/` that is then renamed over the
/// record, so a reader sees either the old value or the new one, and
/// overlapping writers never share a staging file.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }

    fn staging_path(&self, key: &str) -> PathBuf {
        let seq = STAGED_WRITES.fetch_add(1, Ordering::Relaxed);
        self.dir
            .join(STAGING_DIR)
            .join(format!("{key}.{}.{seq}.json", std::process::id()))
    }
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.record_path(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path)(e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.record_path(key)?;
        let tmp = self.staging_path(key);
        let staging = self.dir.join(STAGING_DIR);

        tokio::fs::create_dir_all(&staging)
            .await
            .map_err(io_error(&staging))?;

        if let Err(e) = tokio::fs::write(&tmp, value).await {
            // Best effort; the record itself was never touched.
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_error(&tmp)(e));
        }

        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_error(&path)(e));
        }

        tracing::debug!(path = %path.display(), "Wrote record");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.record_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path)(e)),
        }
    }
}

/// Process-local store, handy for tests and for embedding without disk state.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.records.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.records.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.records.lock().remove(key);
        Ok(())
    }
}

#[async_trait]
impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        (**self).delete(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_key_rejects_path_characters() {
        assert!(validate_key("favorites").is_ok());
        assert!(validate_key("recent_cities-2").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../favorites").is_err());
        assert!(validate_key("a/b").is_err());
        assert!(validate_key("fav.json").is_err());
    }

    #[tokio::test]
    async fn file_store_get_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(store.get("favorites").await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_set_creates_directory_and_replaces_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("data"));

        store.set("favorites", r#"["Paris"]"#).await.unwrap();
        store.set("favorites", r#"["Rome"]"#).await.unwrap();

        assert_eq!(store.get("favorites").await.unwrap().as_deref(), Some(r#"["Rome"]"#));
        assert_eq!(staged_files(&store), 0);
    }

    fn staged_files(store: &FileStore) -> usize {
        std::fs::read_dir(store.dir().join(STAGING_DIR))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[test]
    fn staging_paths_are_unique_per_write() {
        let store = FileStore::new("/data");
        let a = store.staging_path("favorites");
        let b = store.staging_path("favorites");
        assert_ne!(a, b);
        assert!(a.starts_with("/data/.tmp"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn overlapping_writes_never_report_a_landed_value_as_failed() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        for round in 0..50 {
            let mut tasks = tokio::task::JoinSet::new();
            for writer in 0..4 {
                let store = store.clone();
                let value = serde_json::to_string(
                    &(0..2000)
                        .map(|i| format!("city-{round}-{writer}-{i}"))
                        .collect::<Vec<_>>(),
                )
                .unwrap();
                tasks.spawn(async move {
                    let result = store.set("favorites", &value).await;
                    (value, result)
                });
            }

            let outcomes = tasks.join_all().await;
            let record = store.get("favorites").await.unwrap().unwrap();

            assert!(outcomes.iter().any(|(value, _)| *value == record), "torn record");
            for (value, result) in &outcomes {
                if let Err(e) = result {
                    assert_ne!(*value, record, "write failed with {e} but landed");
                }
                assert!(result.is_ok(), "overlapping write failed: {result:?}");
            }
        }

        assert_eq!(staged_files(&store), 0);
    }

    #[tokio::test]
    async fn file_store_failed_write_leaves_record_and_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.set("favorites", r#"["Paris"]"#).await.unwrap();

        // A directory where the record should land makes the rename fail.
        std::fs::create_dir(dir.path().join("recent.json")).unwrap();
        std::fs::write(dir.path().join("recent.json").join("keep"), "").unwrap();
        let err = store.set("recent", r#"["Rome"]"#).await.unwrap_err();

        assert!(matches!(err, StorageError::Io { .. }), "unexpected error: {err:?}");
        assert_eq!(staged_files(&store), 0);
        assert_eq!(store.get("favorites").await.unwrap().as_deref(), Some(r#"["Paris"]"#));
    }

    #[tokio::test]
    async fn file_store_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.set("favorites", "[]").await.unwrap();
        store.delete("favorites").await.unwrap();
        store.delete("favorites").await.unwrap();

        assert_eq!(store.get("favorites").await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_rejects_invalid_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let err = store.set("../escape", "[]").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}
