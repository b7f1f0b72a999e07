//! CLI command implementations.

pub mod compact;
pub mod inspect;
pub mod list;

use reaper_core::{Config, Store};
use std::path::Path;

/// Result type for commands.
pub type CommandResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Opens an existing store; never creates one.
pub fn open_existing(path: &Path) -> CommandResult<Store> {
    let config = Config::new().create_if_missing(false);
    Ok(Store::open_with_config(path, config)?)
}
