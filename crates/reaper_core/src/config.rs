//! Store configuration.

use std::time::Duration;

/// Configuration for opening a store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the store file if it doesn't exist.
    pub create_if_missing: bool,

    /// How long `open` waits for another process to release the store lock.
    pub lock_timeout: Duration,

    /// Whether to fsync the commit log on every commit (safer but slower).
    pub sync_on_commit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            lock_timeout: Duration::from_secs(1),
            sync_on_commit: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the store if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets the lock acquisition timeout.
    #[must_use]
    pub const fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Sets whether to sync the log on every commit.
    #[must_use]
    pub const fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }
}
