//! Compact command implementation.

use super::{open_existing, CommandResult};
use crate::Format;
use std::io::Write;
use std::path::Path;

/// Runs the compact command.
pub fn run(out: &mut impl Write, path: &Path, dry_run: bool, format: Format) -> CommandResult {
    let store = open_existing(path)?;

    if dry_run {
        let size = store.log_size()?;
        match format {
            Format::Json => writeln!(out, "{}", serde_json::json!({ "log_bytes": size }))?,
            Format::Text => writeln!(out, "Log size: {size} bytes (dry run, nothing written)")?,
        }
        return Ok(());
    }

    let compaction = store.compact()?;
    match format {
        Format::Json => writeln!(out, "{}", serde_json::to_string_pretty(&compaction)?)?,
        Format::Text => {
            let saved = compaction.bytes_before.saturating_sub(compaction.bytes_after);
            let pct = if compaction.bytes_before > 0 {
                saved as f64 / compaction.bytes_before as f64 * 100.0
            } else {
                0.0
            };
            writeln!(out, "Size before: {} bytes", compaction.bytes_before)?;
            writeln!(out, "Size after:  {} bytes", compaction.bytes_after)?;
            writeln!(out, "Space saved: {saved} bytes ({pct:.1}%)")?;
        }
    }
    Ok(())
}
