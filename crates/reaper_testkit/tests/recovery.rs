//! Durability: reopen, torn tails, corruption, compaction and locking.

use reaper_core::{Config, CoreError, ObjectId, PublicArticle, Store};
use reaper_testkit::{scenarios, test_config, CrashHarness, CrashPoint, TestStore};
use std::time::Duration;

#[test]
fn file_store_survives_reopen() {
    let t = TestStore::file();
    let (category, feed) = scenarios::category_with_feed(&t, "u", "tech", &["a", "b"]);
    let fid = feed.id.to_hex();
    let saved = PublicArticle {
        published: 42,
        ..PublicArticle::default()
    };
    t.feeds
        .edit_article("u", &fid, "a", false, true, saved.clone())
        .unwrap();

    let t = t.reopen();
    assert_eq!(
        t.categories.get_category_by_name("u", "tech").unwrap(),
        Some(category)
    );
    let later = t.feeds.get_later_articles("u").unwrap();
    assert_eq!(later.len(), 1);
    assert_eq!(later[0].content, Some(saved));
    assert_eq!(
        t.feeds
            .get_feed_by_public_id("u", &feed.public_id.to_hex())
            .unwrap()
            .id,
        feed.id
    );
}

#[test]
fn crash_inside_last_commit_loses_only_that_commit() {
    for point in [
        CrashPoint::DuringHeader,
        CrashPoint::DuringPayload,
        CrashPoint::BeforeChecksum,
    ] {
        let harness = CrashHarness::new();
        let store = harness.open().unwrap();
        let categories = reaper_core::CategoryIndex::new(store.clone());
        let kept = categories.add_category("u", "kept").unwrap();

        let before = harness.log_len();
        categories.add_category("u", "lost").unwrap();
        let record_len = harness.log_len() - before;
        drop((store, categories));

        harness.crash_at(point, record_len);

        let store = harness.open().unwrap();
        assert_eq!(harness.log_len(), before, "{point:?}");
        let categories = reaper_core::CategoryIndex::new(store);
        assert_eq!(categories.get_categories("u").unwrap(), vec![kept.clone()]);
        assert_eq!(categories.get_category_by_name("u", "lost").unwrap(), None);

        // The name is free and new commits land cleanly.
        categories.add_category("u", "lost").unwrap();
    }
}

#[test]
fn completed_commit_survives() {
    let harness = CrashHarness::new();
    let store = harness.open().unwrap();
    let before = harness.log_len();
    reaper_core::CategoryIndex::new(store.clone())
        .add_category("u", "tech")
        .unwrap();
    let record_len = harness.log_len() - before;
    drop(store);

    harness.crash_at(CrashPoint::AfterCommit, record_len);
    let store = harness.open().unwrap();
    assert_eq!(store.committed_seq().as_u64(), 1);
}

#[test]
fn corrupted_commit_refuses_to_open() {
    let harness = CrashHarness::new();
    let store = harness.open().unwrap();
    reaper_core::CategoryIndex::new(store.clone())
        .add_category("u", "tech")
        .unwrap();
    drop(store);

    harness.corrupt(20);
    assert!(matches!(
        harness.open(),
        Err(CoreError::ChecksumMismatch { .. })
    ));
}

#[test]
fn garbage_after_log_refuses_to_open() {
    let harness = CrashHarness::new();
    drop(harness.open().unwrap());
    harness.append_garbage(b"this is not a commit record");
    assert!(matches!(harness.open(), Err(CoreError::WalCorruption { .. })));
}

#[test]
fn compaction_then_reopen() {
    let t = TestStore::file();
    let (_, feed) = scenarios::category_with_feed(&t, "u", "tech", &["a"]);
    let fid = feed.id.to_hex();
    for round in 0..10 {
        t.feeds
            .update_articles(
                "u",
                &fid,
                vec![reaper_core::Article::new(format!("post-{round}"))],
            )
            .unwrap();
    }
    let seq = t.committed_seq();

    let compaction = t.compact().unwrap();
    assert!(compaction.bytes_after < compaction.bytes_before);

    let t = t.reopen();
    assert_eq!(t.committed_seq(), seq);
    let feed = t.feeds.get_feed_by_id("u", &fid).unwrap();
    assert_eq!(feed.articles[0].url, "post-9");
}

#[test]
fn second_open_fails_with_store_unavailable() {
    let t = TestStore::file();
    let path = t.path().unwrap().to_path_buf();

    let started = std::time::Instant::now();
    let config = Config::new().lock_timeout(Duration::from_millis(80));
    assert!(matches!(
        Store::open_with_config(&path, config),
        Err(CoreError::StoreUnavailable { .. })
    ));
    assert!(started.elapsed() >= Duration::from_millis(50));

    drop(t);
}

#[test]
fn lock_is_released_when_store_closes() {
    let t = TestStore::file();
    t.categories.add_category("u", "x").unwrap();
    let t = t.reopen();
    assert_eq!(t.categories.get_categories("u").unwrap().len(), 1);

    let path = t.path().unwrap().to_path_buf();
    let _keep_dir = t.reopen();
    assert!(Store::open_with_config(&path, test_config()).is_err());
}

#[test]
fn malformed_ids_surface_as_serialization_errors() {
    let t = TestStore::memory();
    assert!(matches!(
        t.feeds.get_feed_by_id("u", "zz"),
        Err(CoreError::Serialization(_))
    ));
    assert!(matches!(
        t.categories.remove_category("u", &ObjectId::new().to_hex()[..23]),
        Err(CoreError::Serialization(_))
    ));
}
