//! Articles embedded in feeds.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Content snapshot of an article, as supplied by the crawler.
///
/// Stored and handed back unchanged; only `published` is interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicArticle {
    /// Article URL.
    pub url: String,
    /// Title.
    pub title: String,
    /// Short summary.
    pub summary: String,
    /// Full content.
    pub content: String,
    /// Publication time, seconds since the Unix epoch.
    pub published: i64,
    /// Last update time, seconds since the Unix epoch.
    pub updated: i64,
    /// Source-side category labels.
    pub categories: Vec<String>,
}

/// One entry in a feed's article list.
///
/// `later` marks the article as saved for reading later; a saved article
/// carries the content snapshot taken when it was saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Article URL, unique within its feed.
    pub url: String,
    /// Whether the user has read it.
    pub read: bool,
    /// Whether the user saved it for later.
    pub later: bool,
    /// Saved content snapshot.
    pub content: Option<PublicArticle>,
}

impl Article {
    /// Creates an unread, unsaved article.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    fn published(&self) -> Option<i64> {
        self.content.as_ref().map(|c| c.published)
    }
}

/// Carries saved content from `current` onto matching entries of `incoming`.
///
/// Every incoming article marked `later` whose URL appears in `current`
/// takes the current entry's content, replacing whatever it brought.
pub(crate) fn carry_saved_content(current: &[Article], incoming: &mut [Article]) {
    for article in incoming.iter_mut().filter(|a| a.later) {
        if let Some(old) = current.iter().find(|old| old.url == article.url) {
            article.content = old.content.clone();
        }
    }
}

/// Sorts newest first by `content.published`; articles without content last.
pub(crate) fn sort_latest_first(articles: &mut [Article]) {
    articles.sort_by(|a, b| match (a.published(), b.published()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
