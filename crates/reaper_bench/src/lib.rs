//! Benchmark utilities.

use rand::Rng;
use reaper_core::{Article, Feed, ObjectId, PublicArticle};

/// Generates a random lowercase string of `len` characters.
pub fn random_text(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}

/// Generates a content snapshot with a body of roughly `body_len` bytes.
pub fn random_public_article(url: &str, body_len: usize) -> PublicArticle {
    let mut rng = rand::thread_rng();
    PublicArticle {
        url: url.to_owned(),
        title: random_text(40),
        summary: random_text(160),
        content: random_text(body_len),
        published: rng.gen_range(1_500_000_000..1_800_000_000),
        updated: rng.gen_range(1_500_000_000..1_800_000_000),
        categories: vec![random_text(6), random_text(6)],
    }
}

/// Generates `count` article URLs for one feed.
pub fn article_urls(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("https://example.com/{}/{i}", random_text(8)))
        .collect()
}

/// Builds a feed whose every `saved_every`-th article is saved with content.
pub fn sample_feed(articles: usize, saved_every: usize) -> Feed {
    let articles = article_urls(articles)
        .into_iter()
        .enumerate()
        .map(|(i, url)| {
            if saved_every > 0 && i % saved_every == 0 {
                Article {
                    content: Some(random_public_article(&url, 2048)),
                    url,
                    read: true,
                    later: true,
                }
            } else {
                Article::new(url)
            }
        })
        .collect();

    Feed {
        id: ObjectId::new(),
        public_id: ObjectId::new(),
        url: "https://example.com/feed.xml".into(),
        title: random_text(24),
        categories: vec![ObjectId::new()],
        articles,
    }
}
