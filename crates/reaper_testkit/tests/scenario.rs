//! End-to-end scenarios across categories, feeds and articles.

use reaper_core::{Article, CategoryUpdate, CoreError, ObjectId, PublicArticle};
use reaper_testkit::{scenarios, TestStore};

fn published(at: i64) -> PublicArticle {
    PublicArticle {
        published: at,
        ..PublicArticle::default()
    }
}

#[test]
fn tech_feed_later_and_refresh() {
    let t = TestStore::memory();
    let u = "reader";

    let c1 = t.categories.add_category(u, "Tech").unwrap();
    let p1 = ObjectId::new().to_hex();
    let f1 = t
        .feeds
        .add_feed(
            u,
            &p1,
            "http://x",
            "X",
            &c1.id.to_hex(),
            ["http://x/a", "http://x/b"],
        )
        .unwrap();
    assert_eq!(f1.articles.len(), 2);
    assert!(f1
        .articles
        .iter()
        .all(|a| !a.read && !a.later && a.content.is_none()));

    let fid = f1.id.to_hex();
    t.feeds
        .edit_article(u, &fid, "http://x/a", true, true, published(100))
        .unwrap();
    let a = t.feeds.get_article_by_url(u, &fid, "http://x/a").unwrap();
    assert!(a.later);
    assert_eq!(a.content, Some(published(100)));

    t.feeds
        .update_articles(
            u,
            &fid,
            vec![
                Article {
                    later: true,
                    ..Article::new("http://x/a")
                },
                Article::new("http://x/c"),
            ],
        )
        .unwrap();

    let refreshed = t.feeds.get_feed_by_id(u, &fid).unwrap();
    assert_eq!(refreshed.articles.len(), 2);
    assert_eq!(refreshed.articles[0].content, Some(published(100)));
    assert_eq!(refreshed.articles[1], Article::new("http://x/c"));

    let later = t.feeds.get_later_articles(u).unwrap();
    assert_eq!(later.len(), 1);
    assert_eq!(later[0].url, "http://x/a");
    assert_eq!(later[0].content, Some(published(100)));
}

#[test]
fn category_lifecycle_keeps_name_index_consistent() {
    let t = TestStore::memory();
    let a = t.categories.add_category("u", "A").unwrap();
    let id = a.id.to_hex();

    let resolved = t.categories.get_category_by_name("u", "A").unwrap().unwrap();
    assert_eq!(resolved.id, a.id);

    t.categories.edit_category("u", &id, "B").unwrap();
    assert_eq!(t.categories.get_category_by_name("u", "A").unwrap(), None);
    assert_eq!(
        t.categories.get_category_by_name("u", "B").unwrap().unwrap().id,
        a.id
    );

    t.categories.remove_category("u", &id).unwrap();
    assert!(t.categories.get_category_by_id("u", &id).unwrap_err().is_not_found());
    assert_eq!(t.categories.get_category_by_name("u", "B").unwrap(), None);
}

#[test]
fn removed_category_stays_referenced_by_feeds() {
    let t = TestStore::memory();
    let (category, feed) = scenarios::category_with_feed(&t, "u", "news", &["a"]);
    let cid = category.id.to_hex();

    t.categories.remove_category("u", &cid).unwrap();

    let feeds = t.feeds.get_feeds_by_category_id("u", &cid).unwrap();
    assert_eq!(feeds, vec![feed.clone()]);
    assert_eq!(
        t.feeds
            .get_categories_by_feed_id("u", &feed.id.to_hex())
            .unwrap(),
        vec![category.id]
    );
}

#[test]
fn feed_moves_between_categories() {
    let t = TestStore::memory();
    let (tech, feed) = scenarios::category_with_feed(&t, "u", "tech", &[]);
    let art = t.categories.add_category("u", "art").unwrap();
    let fid = feed.id.to_hex();

    let update = CategoryUpdate::replace_hex([art.id.to_hex(), tech.id.to_hex()]).unwrap();
    t.feeds.edit_feed("u", &fid, "Renamed", update).unwrap();

    for category in [&tech, &art] {
        let listed = t
            .feeds
            .get_feeds_by_category_id("u", &category.id.to_hex())
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Renamed");
    }

    t.feeds
        .edit_feed("u", &fid, "Renamed", CategoryUpdate::Replace(vec![art.id]))
        .unwrap();
    assert!(t
        .feeds
        .get_feeds_by_category_id("u", &tech.id.to_hex())
        .unwrap()
        .is_empty());
}

#[test]
fn users_are_isolated() {
    let t = TestStore::memory();
    let (_, feed) = scenarios::category_with_feed(&t, "alice", "tech", &["a"]);
    let fid = feed.id.to_hex();

    assert!(t.feeds.get_feed_by_id("bob", &fid).unwrap_err().is_not_found());
    assert!(t.categories.get_categories("bob").unwrap().is_empty());
    assert!(matches!(
        t.feeds.edit_feed("bob", &fid, "x", CategoryUpdate::Unchanged),
        Err(CoreError::InvalidId { .. })
    ));
    assert_eq!(t.feeds.get_feed_by_id("alice", &fid).unwrap(), feed);
}

#[test]
fn failed_operations_leave_no_trace() {
    let t = TestStore::memory();
    let (_, feed) = scenarios::category_with_feed(&t, "u", "tech", &["a"]);
    let seq = t.committed_seq();

    let dup = t.feeds.add_feed(
        "u",
        &feed.public_id.to_hex(),
        "http://other",
        "Other",
        &ObjectId::new().to_hex(),
        ["b"],
    );
    assert!(matches!(dup, Err(CoreError::DuplicatePublicId { .. })));
    assert!(t.categories.add_category("u", "tech").is_err());
    assert!(t
        .feeds
        .edit_article("u", &feed.id.to_hex(), "missing", true, true, published(1))
        .is_err());

    assert_eq!(t.committed_seq(), seq);
    assert_eq!(t.feeds.get_feed_by_id("u", &feed.id.to_hex()).unwrap(), feed);
}

#[test]
fn concurrent_users_do_not_interfere() {
    let t = TestStore::memory();
    std::thread::scope(|scope| {
        for n in 0..4 {
            let t = &t;
            scope.spawn(move || {
                let user = format!("user-{n}");
                for i in 0..10 {
                    t.categories.add_category(&user, &format!("c{i}")).unwrap();
                }
            });
        }
    });

    for n in 0..4 {
        let user = format!("user-{n}");
        assert_eq!(t.categories.get_categories(&user).unwrap().len(), 10);
    }
    assert_eq!(t.committed_seq().as_u64(), 40);
}
