//! Feeds, their articles and the public id index.

mod article;

pub use article::{Article, PublicArticle};

use crate::error::{CoreError, CoreResult};
use crate::store::Store;
use crate::transaction::{NamespaceWriter, TransactionManager};
use crate::types::Partition;
use article::{carry_saved_content, sort_latest_first};
use reaper_codec::{Document, ObjectId};
use serde::{Deserialize, Serialize};

/// Name of the index mapping public feed ids to feed ids.
pub const PUBLIC_ID_INDEX: &str = "public_id";

/// A user's subscription to a feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feed {
    /// Subscription id.
    pub id: ObjectId,
    /// Id of the shared source feed, unique per user and never changed.
    pub public_id: ObjectId,
    /// Source URL.
    pub url: String,
    /// Display title.
    pub title: String,
    /// Categories the feed is filed under. Not checked against existing
    /// categories.
    pub categories: Vec<ObjectId>,
    /// Known articles, in the order last supplied.
    pub articles: Vec<Article>,
}

impl Document for Feed {}

/// How [`FeedStore::edit_feed`] treats the category list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryUpdate {
    /// Keep the current list.
    #[default]
    Unchanged,
    /// Replace the list. An empty list removes the feed from all categories.
    Replace(Vec<ObjectId>),
}

impl CategoryUpdate {
    /// Builds a replacement list from hex ids.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Serialization`] if any id is not valid hex.
    pub fn replace_hex<I, S>(ids: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids = ids
            .into_iter()
            .map(|id| ObjectId::parse_hex(id.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::Replace(ids))
    }
}

/// Feed storage with a unique public id index.
///
/// Lookups never create a user's namespace: reading feeds of an unknown
/// user fails with [`CoreError::NotFound`].
#[derive(Debug, Clone)]
pub struct FeedStore {
    txm: TransactionManager,
}

impl FeedStore {
    /// Creates the store over a store handle.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            txm: TransactionManager::new(store, Partition::Feeds),
        }
    }

    /// Subscribes a user to a feed.
    ///
    /// Articles start unread and unsaved, in the given order.
    ///
    /// # Errors
    ///
    /// - [`CoreError::DuplicatePublicId`] if the user already follows `public_id`
    /// - [`CoreError::Serialization`] if an id is not valid hex
    pub fn add_feed<I>(
        &self,
        user: &str,
        public_id: &str,
        url: &str,
        title: &str,
        category_id: &str,
        article_urls: I,
    ) -> CoreResult<Feed>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let public_id = ObjectId::parse_hex(public_id)?;
        let category_id = ObjectId::parse_hex(category_id)?;
        let articles: Vec<Article> = article_urls.into_iter().map(Article::new).collect();
        let index_key = public_id.to_hex();

        self.txm.update(user, |writer| {
            if writer
                .index_lookup(PUBLIC_ID_INDEX, index_key.as_bytes())
                .is_some()
            {
                return Err(CoreError::DuplicatePublicId {
                    public_id: index_key.clone(),
                });
            }

            let feed = Feed {
                id: ObjectId::new(),
                public_id,
                url: url.to_owned(),
                title: title.to_owned(),
                categories: vec![category_id],
                articles,
            };
            let key = feed.id.to_hex();
            writer.put_document(&key, &feed)?;
            writer.put_index_entry(PUBLIC_ID_INDEX, index_key.as_bytes(), &key)?;
            Ok(feed)
        })
    }

    /// Replaces a feed's article list.
    ///
    /// An incoming article marked `later` whose URL is already in the feed
    /// takes over the stored content of that entry.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if there is no such feed.
    pub fn update_articles(
        &self,
        user: &str,
        feed_id: &str,
        mut articles: Vec<Article>,
    ) -> CoreResult<()> {
        let key = ObjectId::parse_hex(feed_id)?.to_hex();
        self.txm.update(user, |writer| {
            let mut feed = load_feed(writer, &key)?;
            carry_saved_content(&feed.articles, &mut articles);
            feed.articles = articles;
            writer.put_document(&key, &feed)
        })
    }

    /// Sets the read and saved flags of one article.
    ///
    /// Saving stores `content` on the article; unsaving drops it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the feed or the article is missing.
    pub fn edit_article(
        &self,
        user: &str,
        feed_id: &str,
        url: &str,
        read: bool,
        later: bool,
        content: PublicArticle,
    ) -> CoreResult<()> {
        let key = ObjectId::parse_hex(feed_id)?.to_hex();
        self.txm.update(user, |writer| {
            let mut feed = load_feed(writer, &key)?;
            let article = feed
                .articles
                .iter_mut()
                .find(|a| a.url == url)
                .ok_or_else(|| CoreError::not_found("article", url))?;

            article.read = read;
            article.later = later;
            article.content = later.then_some(content);
            writer.put_document(&key, &feed)
        })
    }

    /// Returns one article of a feed.
    ///
    /// An URL the feed does not list yields a default article (empty URL,
    /// unread, unsaved).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if there is no such feed.
    pub fn get_article_by_url(&self, user: &str, feed_id: &str, url: &str) -> CoreResult<Article> {
        let feed = self.get_feed_by_id(user, feed_id)?;
        Ok(feed
            .articles
            .into_iter()
            .find(|a| a.url == url)
            .unwrap_or_default())
    }

    /// Returns every saved article of a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the user has never stored a feed.
    pub fn get_later_articles(&self, user: &str) -> CoreResult<Vec<Article>> {
        self.txm.view_existing(user, |ns| {
            let mut saved = Vec::new();
            for feed in ns.documents::<Feed>()? {
                saved.extend(feed.articles.into_iter().filter(|a| a.later));
            }
            sort_latest_first(&mut saved);
            Ok(saved)
        })
    }

    /// Returns a feed by id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if there is no such feed.
    pub fn get_feed_by_id(&self, user: &str, feed_id: &str) -> CoreResult<Feed> {
        let key = ObjectId::parse_hex(feed_id)?.to_hex();
        self.txm.view_existing(user, |ns| {
            ns.get_document(&key)?
                .ok_or_else(|| CoreError::not_found("feed", key.as_str()))
        })
    }

    /// Returns a feed by its public id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the user does not follow it.
    pub fn get_feed_by_public_id(&self, user: &str, public_id: &str) -> CoreResult<Feed> {
        let index_key = ObjectId::parse_hex(public_id)?.to_hex();
        self.txm.view_existing(user, |ns| {
            let feed = match ns.index_lookup(PUBLIC_ID_INDEX, index_key.as_bytes()) {
                Some(id) => ns.get_document(id)?,
                None => None,
            };
            feed.ok_or_else(|| CoreError::not_found("feed", index_key.as_str()))
        })
    }

    /// Returns the feeds filed under a category, in id order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the user has never stored a feed.
    pub fn get_feeds_by_category_id(&self, user: &str, category_id: &str) -> CoreResult<Vec<Feed>> {
        let category_id = ObjectId::parse_hex(category_id)?;
        self.txm.view_existing(user, |ns| {
            let feeds = ns.documents::<Feed>()?;
            Ok(feeds
                .into_iter()
                .filter(|feed| feed.categories.contains(&category_id))
                .collect())
        })
    }

    /// Returns the category ids of a feed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if there is no such feed.
    pub fn get_categories_by_feed_id(&self, user: &str, feed_id: &str) -> CoreResult<Vec<ObjectId>> {
        Ok(self.get_feed_by_id(user, feed_id)?.categories)
    }

    /// Changes a feed's title and, optionally, its categories.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidId`] if there is no such feed.
    pub fn edit_feed(
        &self,
        user: &str,
        feed_id: &str,
        title: &str,
        categories: CategoryUpdate,
    ) -> CoreResult<Feed> {
        let key = ObjectId::parse_hex(feed_id)?.to_hex();
        self.txm.update(user, |writer| {
            let mut feed: Feed = writer
                .get_document(&key)?
                .ok_or_else(|| CoreError::invalid_id(key.as_str()))?;

            let index_key = feed.public_id.to_hex();
            writer.delete_index_entry(PUBLIC_ID_INDEX, index_key.as_bytes())?;

            feed.title = title.to_owned();
            if let CategoryUpdate::Replace(ids) = categories {
                feed.categories = ids;
            }

            writer.put_document(&key, &feed)?;
            writer.put_index_entry(PUBLIC_ID_INDEX, index_key.as_bytes(), &key)?;
            Ok(feed)
        })
    }

    /// Unsubscribes a user from a feed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if there is no such feed.
    pub fn remove_feed(&self, user: &str, feed_id: &str) -> CoreResult<()> {
        let key = ObjectId::parse_hex(feed_id)?.to_hex();
        self.txm.update(user, |writer| {
            let feed = load_feed(writer, &key)?;
            writer.delete_index_entry(PUBLIC_ID_INDEX, feed.public_id.to_hex().as_bytes())?;
            writer.delete(&key)
        })
    }
}

fn load_feed(writer: &NamespaceWriter<'_, '_>, key: &str) -> CoreResult<Feed> {
    writer
        .get_document(key)?
        .ok_or_else(|| CoreError::not_found("feed", key))
}
