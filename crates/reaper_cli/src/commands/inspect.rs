//! Inspect command implementation.

use super::{open_existing, CommandResult};
use crate::Format;
use reaper_core::{Partition, StoreStats};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Store path.
    pub path: String,
    /// Statistics of the committed state.
    #[serde(flatten)]
    pub stats: StoreStats,
}

/// Runs the inspect command.
pub fn run(out: &mut impl Write, path: &Path, format: Format) -> CommandResult {
    let store = open_existing(path)?;
    let result = InspectResult {
        path: path.display().to_string(),
        stats: store.stats()?,
    };

    match format {
        Format::Json => writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?,
        Format::Text => print_text(out, &result)?,
    }
    Ok(())
}

fn print_text(out: &mut impl Write, result: &InspectResult) -> CommandResult {
    let stats = &result.stats;
    writeln!(out, "Store: {}", result.path)?;
    writeln!(out, "  Committed:  {}", stats.committed_seq)?;
    writeln!(out, "  Log size:   {} bytes", stats.log_bytes)?;
    for partition in Partition::ALL {
        let namespaces = stats
            .namespaces
            .iter()
            .filter(|ns| ns.partition == partition)
            .count();
        writeln!(
            out,
            "  {:<11} {} records in {} namespaces",
            format!("{partition}:"),
            stats.records_in(partition),
            namespaces
        )?;
    }

    if !stats.namespaces.is_empty() {
        writeln!(out)?;
        writeln!(out, "  {:<12} {:<24} {:>8} {:>8}", "PARTITION", "USER", "RECORDS", "INDEXED")?;
        for ns in &stats.namespaces {
            writeln!(
                out,
                "  {:<12} {:<24} {:>8} {:>8}",
                ns.partition.name(),
                ns.user,
                ns.records,
                ns.index_entries
            )?;
        }
    }
    Ok(())
}
