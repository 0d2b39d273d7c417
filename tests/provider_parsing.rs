use slop_score::provider::{parse_timeline, FixtureProvider, PostProvider};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

const TIMELINE: &str = r#"{
    "status": "success",
    "data": {
        "tweets": [
            {
                "id": "101",
                "text": "Wrote up how we cut build times in half https://t.co/abc",
                "likeCount": 42,
                "replyCount": 5,
                "retweetCount": 3,
                "quoteCount": 1,
                "bookmarkCount": 7,
                "viewCount": 1200,
                "author": {
                    "userName": "builder",
                    "name": "The Builder",
                    "followers": 850,
                    "profilePicture": "https://img.example.com/builder.png"
                },
                "entities": {
                    "hashtags": [{"text": "rust"}],
                    "urls": [{"expanded_url": "https://blog.example.com/builds"}]
                },
                "quoted_tweet": {},
                "retweeted_tweet": null
            },
            {
                "id": "102",
                "text": "RT @friend: big news",
                "likeCount": 0,
                "replyCount": 0,
                "retweetCount": 0,
                "quoteCount": 0,
                "bookmarkCount": 0,
                "viewCount": 10,
                "author": {"userName": "builder", "followers": 850},
                "retweeted_tweet": {
                    "id": "99",
                    "text": "big news",
                    "author": {"userName": "friend"}
                }
            }
        ]
    }
}"#;

#[test]
fn parses_provider_timeline() {
    let timeline = parse_timeline(TIMELINE).expect("timeline");

    assert_eq!(timeline.display_name.as_deref(), Some("The Builder"));
    assert_eq!(
        timeline.profile_picture.as_deref(),
        Some("https://img.example.com/builder.png")
    );
    assert_eq!(timeline.posts.len(), 2);

    let first = &timeline.posts[0];
    assert_eq!(first.id, "101");
    assert_eq!(first.metrics.likes, 42);
    assert_eq!(first.metrics.bookmarks, 7);
    assert_eq!(first.metrics.views, 1200);
    assert_eq!(first.author_followers, 850);
    assert_eq!(first.entities.hashtags, vec!["rust".to_string()]);
    assert_eq!(
        first.entities.urls[0].expanded_url,
        "https://blog.example.com/builds"
    );
    assert!(first.quoted_post.is_none(), "empty object is not a quote");
    assert!(first.retweeted_post.is_none());

    let second = &timeline.posts[1];
    let retweeted = second.retweeted_post.as_ref().expect("retweeted post");
    assert_eq!(retweeted.id.as_deref(), Some("99"));
    assert_eq!(retweeted.author.as_deref(), Some("friend"));
    assert!(second.entities.urls.is_empty());
}

#[test]
fn rejects_tweets_with_missing_counters() {
    let payload = r#"{
        "status": "success",
        "data": {"tweets": [{
            "id": "7",
            "text": "hello there",
            "replyCount": 0,
            "retweetCount": 0,
            "quoteCount": 0,
            "bookmarkCount": 0,
            "viewCount": 0,
            "author": {"followers": 10}
        }]}
    }"#;
    let err = parse_timeline(payload).expect_err("missing likeCount");
    assert!(err.contains("likeCount"), "{}", err);
    assert!(err.contains('7'), "{}", err);
}

#[test]
fn rejects_tweets_without_follower_count() {
    let payload = r#"{
        "status": "success",
        "data": {"tweets": [{
            "id": "8",
            "likeCount": 1,
            "replyCount": 0,
            "retweetCount": 0,
            "quoteCount": 0,
            "bookmarkCount": 0,
            "viewCount": 0,
            "author": {"userName": "nobody"}
        }]}
    }"#;
    let err = parse_timeline(payload).expect_err("missing followers");
    assert!(err.contains("author.followers"), "{}", err);
}

#[test]
fn surfaces_provider_error_status() {
    let err = parse_timeline(r#"{"status": "error", "msg": "user not found"}"#)
        .expect_err("error status");
    assert_eq!(err, "user not found");

    let err = parse_timeline(r#"{"status": "success"}"#).expect_err("missing tweets");
    assert!(err.contains("invalid response format"), "{}", err);

    assert!(parse_timeline("not json").is_err());
}

#[test]
fn empty_timeline_is_valid() {
    let timeline =
        parse_timeline(r#"{"status": "success", "data": {"tweets": []}}"#).expect("timeline");
    assert!(timeline.posts.is_empty());
    assert!(timeline.display_name.is_none());
}

fn temp_dir(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    std::env::temp_dir().join(format!("slop-score-{}-{}", label, nanos))
}

#[tokio::test]
async fn fixture_provider_reads_lowercase_files() {
    let dir = temp_dir("fixtures");
    std::fs::create_dir_all(&dir).expect("create dir");
    std::fs::write(dir.join("builder.json"), TIMELINE).expect("write fixture");

    let provider = FixtureProvider::new(dir.clone());
    let timeline = provider.fetch_timeline("Builder").await.expect("timeline");
    assert_eq!(timeline.posts.len(), 2);

    let err = provider
        .fetch_timeline("missing")
        .await
        .expect_err("no fixture");
    assert!(err.contains("missing.json"), "{}", err);

    let _ = std::fs::remove_dir_all(&dir);
}
