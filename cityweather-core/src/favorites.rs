use crate::{FavoritesList, StorageError, storage::KeyValueStore};

/// Storage key the favorites list lives under.
pub const FAVORITES_KEY: &str = "favorites";

/// Persisted list of favorite city names.
///
/// Keeps no in-memory copy: every operation reads the record, and every
/// mutation writes the whole list back in one `set`. Callers holding an older
/// list must `load` again to see changes made through another handle.
#[derive(Debug)]
pub struct FavoritesStore<S> {
    storage: S,
    key: String,
}

impl<S: KeyValueStore> FavoritesStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, FAVORITES_KEY)
    }

    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Empty when nothing has been saved yet. A record that is not a JSON
    /// array of strings is reported as [`StorageError::Corrupt`] and left in place.
    pub async fn load(&self) -> Result<FavoritesList, StorageError> {
        let Some(raw) = self.storage.get(&self.key).await? else {
            return Ok(FavoritesList::new());
        };

        serde_json::from_str(&raw).map_err(|source| {
            tracing::warn!(key = %self.key, error = %source, "Favorites record is corrupt");
            StorageError::Corrupt {
                key: self.key.clone(),
                source,
            }
        })
    }

    pub async fn add(&self, city: &str) -> Result<FavoritesList, StorageError> {
        let mut list = self.load().await?;
        if list.insert(city) {
            self.persist(&list).await?;
            tracing::debug!(city, "Added favorite");
        }
        Ok(list)
    }

    pub async fn remove(&self, city: &str) -> Result<FavoritesList, StorageError> {
        let mut list = self.load().await?;
        let removed = list.remove(city);
        self.persist(&list).await?;
        if removed {
            tracing::debug!(city, "Removed favorite");
        }
        Ok(list)
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        self.storage.delete(&self.key).await?;
        tracing::debug!(key = %self.key, "Cleared favorites");
        Ok(())
    }

    async fn persist(&self, list: &FavoritesList) -> Result<(), StorageError> {
        let raw = serde_json::to_string(list).map_err(|source| StorageError::Serialize {
            key: self.key.clone(),
            source,
        })?;
        self.storage.set(&self.key, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn cities(list: FavoritesList) -> Vec<String> {
        list.into_vec()
    }

    #[tokio::test]
    async fn load_empty_when_nothing_saved() {
        let store = FavoritesStore::new(MemoryStore::new());
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_is_idempotent() {
        let store = FavoritesStore::new(MemoryStore::new());

        store.add("Paris").await.unwrap();
        let list = store.add("Paris").await.unwrap();

        assert_eq!(cities(list), vec!["Paris"]);
        assert_eq!(cities(store.load().await.unwrap()), vec!["Paris"]);
    }

    #[tokio::test]
    async fn remove_preserves_order_of_remaining() {
        let store = FavoritesStore::new(MemoryStore::new());

        store.add("Paris").await.unwrap();
        store.add("Rome").await.unwrap();
        store.add("Oslo").await.unwrap();
        let list = store.remove("Paris").await.unwrap();

        assert_eq!(cities(list), vec!["Rome", "Oslo"]);
    }

    #[tokio::test]
    async fn remove_absent_city_succeeds() {
        let store = FavoritesStore::new(MemoryStore::new());
        store.add("Rome").await.unwrap();

        let list = store.remove("Paris").await.unwrap();
        assert_eq!(cities(list), vec!["Rome"]);
    }

    #[tokio::test]
    async fn clear_then_load_is_empty() {
        let store = FavoritesStore::new(MemoryStore::new());
        store.add("Paris").await.unwrap();
        store.add("Rome").await.unwrap();

        store.clear().await.unwrap();

        assert!(store.load().await.unwrap().is_empty());
        assert_eq!(store.storage().get(FAVORITES_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn clear_without_record_succeeds() {
        let store = FavoritesStore::new(MemoryStore::new());
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn persists_as_json_array_under_key() {
        let store = FavoritesStore::new(MemoryStore::new());
        store.add("Paris").await.unwrap();
        store.add("Rome").await.unwrap();

        let raw = store.storage().get(FAVORITES_KEY).await.unwrap();
        assert_eq!(raw.as_deref(), Some(r#"["Paris","Rome"]"#));
    }

    #[tokio::test]
    async fn load_reports_corrupt_record() {
        let storage = MemoryStore::new();
        storage.set(FAVORITES_KEY, r#"{"not":"a list"}"#).await.unwrap();
        let store = FavoritesStore::new(storage);

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { ref key, .. } if key == FAVORITES_KEY));

        // Not auto-healed.
        let raw = store.storage().get(FAVORITES_KEY).await.unwrap();
        assert_eq!(raw.as_deref(), Some(r#"{"not":"a list"}"#));
    }

    #[tokio::test]
    async fn custom_key_is_isolated() {
        let storage = std::sync::Arc::new(MemoryStore::new());
        let favorites = FavoritesStore::new(storage.clone());
        let recent = FavoritesStore::with_key(storage, "recent");

        favorites.add("Paris").await.unwrap();
        recent.add("Rome").await.unwrap();

        assert_eq!(cities(favorites.load().await.unwrap()), vec!["Paris"]);
        assert_eq!(cities(recent.load().await.unwrap()), vec!["Rome"]);
    }
}
