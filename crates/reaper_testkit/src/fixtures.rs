//! Test fixtures and store helpers.

use reaper_core::{CategoryIndex, Config, Feed, FeedStore, ObjectId, Store};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// A store with both indexes attached, cleaned up on drop.
pub struct TestStore {
    /// The store handle.
    pub store: Store,
    /// Category index over `store`.
    pub categories: CategoryIndex,
    /// Feed store over `store`.
    pub feeds: FeedStore,
    path: Option<PathBuf>,
    _temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates an in-memory test store.
    pub fn memory() -> Self {
        let store = Store::open_in_memory().expect("Failed to open in-memory store");
        Self::wrap(store, None, None)
    }

    /// Creates a file-backed test store in a fresh temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("reaper.db");
        let store = Store::open_with_config(&path, test_config()).expect("Failed to open store");
        Self::wrap(store, Some(path), Some(temp_dir))
    }

    fn wrap(store: Store, path: Option<PathBuf>, temp_dir: Option<TempDir>) -> Self {
        Self {
            categories: CategoryIndex::new(store.clone()),
            feeds: FeedStore::new(store.clone()),
            store,
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Closes and reopens a file-backed store, replaying its log.
    ///
    /// # Panics
    ///
    /// Panics for in-memory stores.
    pub fn reopen(self) -> Self {
        let Self {
            store,
            categories,
            feeds,
            path,
            _temp_dir,
        } = self;
        let path = path.expect("Only file stores can be reopened");
        drop((store, categories, feeds));

        let store = Store::open_with_config(&path, test_config()).expect("Failed to reopen store");
        Self::wrap(store, Some(path), _temp_dir)
    }

    /// Path of the store file, if file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Configuration for file stores in tests: no fsync, short lock wait.
pub fn test_config() -> Config {
    Config::new()
        .sync_on_commit(false)
        .lock_timeout(Duration::from_millis(100))
}

/// Runs a test with a temporary in-memory store.
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&TestStore) -> R,
{
    let t = TestStore::memory();
    f(&t)
}

/// Runs a test with a temporary file store.
pub fn with_file_store<F, R>(f: F) -> R
where
    F: FnOnce(&TestStore) -> R,
{
    let t = TestStore::file();
    f(&t)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use reaper_core::Category;

    /// Adds a category and a feed filed under it with the given article URLs.
    pub fn category_with_feed(
        t: &TestStore,
        user: &str,
        name: &str,
        urls: &[&str],
    ) -> (Category, Feed) {
        let category = t
            .categories
            .add_category(user, name)
            .expect("Failed to add category");
        let feed = t
            .feeds
            .add_feed(
                user,
                &ObjectId::new().to_hex(),
                &format!("http://{name}.example/rss"),
                name,
                &category.id.to_hex(),
                urls.iter().copied(),
            )
            .expect("Failed to add feed");
        (category, feed)
    }
}
