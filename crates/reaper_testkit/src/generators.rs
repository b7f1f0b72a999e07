//! Property-based test generators using proptest.

use proptest::prelude::*;
use reaper_core::{Article, Category, Feed, ObjectId, PublicArticle};

/// Strategy for object ids.
pub fn object_id_strategy() -> impl Strategy<Value = ObjectId> {
    prop::array::uniform12(any::<u8>()).prop_map(ObjectId::from)
}

/// Strategy for user identifiers.
pub fn user_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for category names, including non-ASCII text.
pub fn category_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9 \u{4e00}-\u{4e0f}]{1,12}").expect("Invalid regex")
}

/// Strategy for article URLs drawn from a small pool, so lists overlap.
pub fn article_url_strategy() -> impl Strategy<Value = String> {
    (0u8..8).prop_map(|n| format!("http://example.com/post/{n}"))
}

/// Strategy for crawler content snapshots.
pub fn public_article_strategy() -> impl Strategy<Value = PublicArticle> {
    (
        article_url_strategy(),
        ".{0,20}",
        ".{0,40}",
        any::<i64>(),
        any::<i64>(),
        prop::collection::vec("[a-z]{1,8}", 0..3),
    )
        .prop_map(|(url, title, summary, published, updated, categories)| PublicArticle {
            content: format!("<p>{summary}</p>"),
            url,
            title,
            summary,
            published,
            updated,
            categories,
        })
}

/// Strategy for articles. Saved articles carry content, others do not.
pub fn article_strategy() -> impl Strategy<Value = Article> {
    (
        article_url_strategy(),
        any::<bool>(),
        prop::option::of(public_article_strategy()),
    )
        .prop_map(|(url, read, content)| Article {
            url,
            read,
            later: content.is_some(),
            content,
        })
}

/// Strategy for article lists with unique URLs.
pub fn article_list_strategy() -> impl Strategy<Value = Vec<Article>> {
    prop::collection::vec(article_strategy(), 0..8).prop_map(|mut articles| {
        let mut seen = std::collections::HashSet::new();
        articles.retain(|a| seen.insert(a.url.clone()));
        articles
    })
}

/// Strategy for categories.
pub fn category_strategy() -> impl Strategy<Value = Category> {
    (object_id_strategy(), category_name_strategy()).prop_map(|(id, name)| Category { id, name })
}

/// Strategy for feeds.
pub fn feed_strategy() -> impl Strategy<Value = Feed> {
    (
        object_id_strategy(),
        object_id_strategy(),
        "[a-z]{1,10}",
        ".{0,20}",
        prop::collection::vec(object_id_strategy(), 0..4),
        article_list_strategy(),
    )
        .prop_map(|(id, public_id, host, title, categories, articles)| Feed {
            id,
            public_id,
            url: format!("https://{host}.example/feed.xml"),
            title,
            categories,
            articles,
        })
}

/// One step of a random category workload.
#[derive(Debug, Clone)]
pub enum CategoryOp {
    /// Add a category with this name.
    Add(String),
    /// Rename the n-th live category (modulo count).
    Rename(usize, String),
    /// Remove the n-th live category (modulo count).
    Remove(usize),
}

/// Strategy for category workloads over a small name pool, so names collide.
pub fn category_ops_strategy(max_ops: usize) -> impl Strategy<Value = Vec<CategoryOp>> {
    let name = (0u8..5).prop_map(|n| format!("name-{n}"));
    let op = prop_oneof![
        name.clone().prop_map(CategoryOp::Add),
        (any::<usize>(), name).prop_map(|(i, n)| CategoryOp::Rename(i, n)),
        any::<usize>().prop_map(CategoryOp::Remove),
    ];
    prop::collection::vec(op, 0..max_ops)
}
