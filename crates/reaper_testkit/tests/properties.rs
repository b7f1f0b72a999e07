//! Property tests: index consistency, merge rule, ordering, codec round-trips.

use proptest::prelude::*;
use reaper_core::{
    Article, Category, CoreError, Document, Feed, Partition, PublicArticle, NAME_INDEX,
    PUBLIC_ID_INDEX,
};
use reaper_testkit::prelude::*;
use std::collections::BTreeMap;

/// Every index entry targets an existing record whose key field matches,
/// and every record has exactly one entry.
fn assert_indexes_consistent(t: &TestStore, user: &str) {
    let snapshot = t.begin_read();

    if let Some(ns) = snapshot.namespace(Partition::Categories, user) {
        let categories: Vec<Category> = ns.documents().unwrap();
        let index_len = ns.index(NAME_INDEX).map_or(0, |i| i.len());
        assert_eq!(index_len, categories.len());
        for category in &categories {
            assert_eq!(
                ns.index_lookup(NAME_INDEX, category.name.as_bytes()),
                Some(category.id.to_hex().as_str())
            );
        }
    }

    if let Some(ns) = snapshot.namespace(Partition::Feeds, user) {
        let feeds: Vec<Feed> = ns.documents().unwrap();
        let index_len = ns.index(PUBLIC_ID_INDEX).map_or(0, |i| i.len());
        assert_eq!(index_len, feeds.len());
        for feed in &feeds {
            assert_eq!(
                ns.index_lookup(PUBLIC_ID_INDEX, feed.public_id.to_hex().as_bytes()),
                Some(feed.id.to_hex().as_str())
            );
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn category_workload_matches_model(ops in category_ops_strategy(24)) {
        let t = TestStore::memory();
        // id hex -> name
        let mut model: BTreeMap<String, String> = BTreeMap::new();

        for op in ops {
            match op {
                CategoryOp::Add(name) => {
                    let taken = model.values().any(|n| *n == name);
                    match t.categories.add_category("u", &name) {
                        Ok(c) => {
                            prop_assert!(!taken);
                            model.insert(c.id.to_hex(), name);
                        }
                        Err(CoreError::DuplicateName { .. }) => prop_assert!(taken),
                        Err(e) => return Err(TestCaseError::fail(e.to_string())),
                    }
                }
                CategoryOp::Rename(i, name) => {
                    if model.is_empty() {
                        continue;
                    }
                    let id = model.keys().nth(i % model.len()).cloned().unwrap();
                    let clash = model.iter().any(|(k, n)| *n == name && *k != id);
                    match t.categories.edit_category("u", &id, &name) {
                        Ok(true) => {
                            prop_assert!(!clash);
                            model.insert(id, name);
                        }
                        Err(CoreError::DuplicateName { .. }) => prop_assert!(clash),
                        other => return Err(TestCaseError::fail(format!("{other:?}"))),
                    }
                }
                CategoryOp::Remove(i) => {
                    if model.is_empty() {
                        continue;
                    }
                    let id = model.keys().nth(i % model.len()).cloned().unwrap();
                    prop_assert!(t.categories.remove_category("u", &id).unwrap());
                    model.remove(&id);
                }
            }
        }

        let mut listed: Vec<_> = t
            .categories
            .get_categories("u")
            .unwrap()
            .into_iter()
            .map(|c| (c.id.to_hex(), c.name))
            .collect();
        listed.sort();
        let expected: Vec<_> = model.into_iter().collect();
        prop_assert_eq!(listed, expected);
        assert_indexes_consistent(&t, "u");
    }

    #[test]
    fn added_name_resolves_to_returned_id(user in user_strategy(), name in category_name_strategy()) {
        let t = TestStore::memory();
        let category = t.categories.add_category(&user, &name).unwrap();
        let resolved = t.categories.get_category_by_name(&user, &name).unwrap();
        prop_assert_eq!(resolved.map(|c| c.id), Some(category.id));
    }

    #[test]
    fn refresh_keeps_saved_content(saved in public_article_strategy(), incoming in article_list_strategy()) {
        let t = TestStore::memory();
        let (_, feed) = scenarios::category_with_feed(&t, "u", "tech", &[saved.url.as_str()]);
        let fid = feed.id.to_hex();
        t.feeds.edit_article("u", &fid, &saved.url, false, true, saved.clone()).unwrap();

        t.feeds.update_articles("u", &fid, incoming.clone()).unwrap();
        let stored = t.feeds.get_feed_by_id("u", &fid).unwrap().articles;

        prop_assert_eq!(stored.len(), incoming.len());
        for (got, given) in stored.iter().zip(&incoming) {
            prop_assert_eq!(&got.url, &given.url);
            prop_assert_eq!(got.read, given.read);
            prop_assert_eq!(got.later, given.later);
            if given.later && given.url == saved.url {
                prop_assert_eq!(got.content.as_ref(), Some(&saved));
            } else {
                prop_assert_eq!(&got.content, &given.content);
            }
        }
    }

    #[test]
    fn unsaving_always_drops_content(content in public_article_strategy(), read in any::<bool>()) {
        let t = TestStore::memory();
        let (_, feed) = scenarios::category_with_feed(&t, "u", "tech", &["a"]);
        let fid = feed.id.to_hex();
        t.feeds.edit_article("u", &fid, "a", read, false, content).unwrap();
        let article = t.feeds.get_article_by_url("u", &fid, "a").unwrap();
        prop_assert_eq!(article.content, None);
        prop_assert!(!article.later);
    }

    #[test]
    fn later_listing_is_exact_and_ordered(lists in prop::collection::vec(article_list_strategy(), 1..4)) {
        let t = TestStore::memory();
        let category = t.categories.add_category("u", "c").unwrap().id.to_hex();
        let mut expected = Vec::new();
        for articles in &lists {
            let feed = t
                .feeds
                .add_feed("u", &reaper_core::ObjectId::new().to_hex(), "http://f", "F", &category, Vec::<String>::new())
                .unwrap();
            // No prior entries, so nothing is carried over.
            t.feeds.update_articles("u", &feed.id.to_hex(), articles.clone()).unwrap();
            expected.extend(articles.iter().filter(|a| a.later).cloned());
        }

        let later = t.feeds.get_later_articles("u").unwrap();
        prop_assert_eq!(later.len(), expected.len());
        for article in &expected {
            prop_assert!(later.contains(article));
        }
        for pair in later.windows(2) {
            let published = |a: &Article| a.content.as_ref().map(|c| c.published);
            prop_assert!(published(&pair[0]) >= published(&pair[1]));
        }
        assert_indexes_consistent(&t, "u");
    }

    #[test]
    fn category_roundtrip(category in category_strategy()) {
        prop_assert_eq!(Category::decode(&category.encode().unwrap()).unwrap(), category);
    }

    #[test]
    fn feed_roundtrip(feed in feed_strategy()) {
        prop_assert_eq!(Feed::decode(&feed.encode().unwrap()).unwrap(), feed);
    }

    #[test]
    fn article_roundtrip(article in article_strategy()) {
        let bytes = reaper_codec::to_document(&article).unwrap();
        prop_assert_eq!(reaper_codec::from_document::<Article>(&bytes).unwrap(), article);
    }
}

#[test]
fn public_article_survives_storage_unchanged() {
    let t = TestStore::memory();
    let (_, feed) = scenarios::category_with_feed(&t, "u", "tech", &["a"]);
    let content = PublicArticle {
        url: "a".into(),
        title: "标题".into(),
        summary: "s".into(),
        content: "<p>body</p>".into(),
        published: -5,
        updated: i64::MAX,
        categories: vec!["x".into(), "y".into()],
    };
    t.feeds
        .edit_article("u", &feed.id.to_hex(), "a", true, true, content.clone())
        .unwrap();
    let stored = t
        .feeds
        .get_article_by_url("u", &feed.id.to_hex(), "a")
        .unwrap();
    assert_eq!(stored.content, Some(content));
}
