//! Listing commands: categories, feeds and saved articles.
//!
//! None of these write. Categories and feeds are read from the committed
//! snapshot, since `CategoryIndex` provisions a namespace on first read.
//! Saved articles come from `FeedStore`, whose lookups never write.

use super::{open_existing, CommandResult};
use crate::Format;
use reaper_core::{Category, Feed, FeedStore, ObjectId, Partition, Store};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

fn documents<T: reaper_core::Document>(
    store: &Store,
    partition: Partition,
    user: &str,
) -> CommandResult<Vec<T>> {
    let snapshot = store.begin_read();
    match snapshot.namespace(partition, user) {
        Some(ns) => Ok(ns.documents()?),
        None => Ok(Vec::new()),
    }
}

fn print_json(out: &mut impl Write, value: &impl Serialize) -> CommandResult {
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Lists a user's categories.
pub fn categories(out: &mut impl Write, path: &Path, user: &str, format: Format) -> CommandResult {
    let store = open_existing(path)?;
    let categories: Vec<Category> = documents(&store, Partition::Categories, user)?;

    match format {
        Format::Json => print_json(out, &categories)?,
        Format::Text => {
            for category in &categories {
                writeln!(out, "{}  {}", category.id, category.name)?;
            }
        }
    }
    Ok(())
}

/// Lists a user's feeds, optionally only those filed under `category`.
pub fn feeds(
    out: &mut impl Write,
    path: &Path,
    user: &str,
    category: Option<&str>,
    format: Format,
) -> CommandResult {
    let category = category.map(ObjectId::parse_hex).transpose()?;
    let store = open_existing(path)?;
    let mut feeds: Vec<Feed> = documents(&store, Partition::Feeds, user)?;
    if let Some(category) = category {
        feeds.retain(|feed| feed.categories.contains(&category));
    }

    match format {
        Format::Json => print_json(out, &feeds)?,
        Format::Text => {
            for feed in &feeds {
                let saved = feed.articles.iter().filter(|a| a.later).count();
                writeln!(
                    out,
                    "{}  {}  <{}>  {} articles, {} saved",
                    feed.id,
                    feed.title,
                    feed.url,
                    feed.articles.len(),
                    saved
                )?;
            }
        }
    }
    Ok(())
}

/// Lists a user's saved articles, newest first.
pub fn later(out: &mut impl Write, path: &Path, user: &str, format: Format) -> CommandResult {
    let store = open_existing(path)?;
    let saved = match FeedStore::new(store).get_later_articles(user) {
        Err(err) if err.is_not_found() => Vec::new(),
        result => result?,
    };

    match format {
        Format::Json => print_json(out, &saved)?,
        Format::Text => {
            for article in &saved {
                let title = article.content.as_ref().map_or("", |c| c.title.as_str());
                writeln!(out, "{}  {}", article.url, title)?;
            }
        }
    }
    Ok(())
}
