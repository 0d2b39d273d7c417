use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::env;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::{EmbeddedPost, Post, PostEntities, PostMetrics, UrlEntity};

/// Posts fetched for one account, plus the display metadata the store keeps.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    pub posts: Vec<Post>,
    pub display_name: Option<String>,
    pub profile_picture: Option<String>,
}

#[async_trait]
pub trait PostProvider: Send + Sync {
    async fn fetch_timeline(&self, username: &str) -> Result<Timeline, String>;
}

#[derive(Clone)]
pub struct TwitterApiClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    count: Option<u32>,
}

impl TwitterApiClient {
    pub fn from_env(config: &ProviderConfig) -> Result<Option<Self>, String> {
        let Ok(api_key) = env::var("TWITTER_API_KEY") else {
            return Ok(None);
        };
        if api_key.trim().is_empty() {
            return Ok(None);
        }
        Self::new(config, decode_api_key(api_key)).map(Some)
    }

    pub fn new(config: &ProviderConfig, api_key: String) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|err| format!("failed to build provider client: {}", err))?;
        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            api_key,
            count: config.count,
        })
    }
}

#[async_trait]
impl PostProvider for TwitterApiClient {
    async fn fetch_timeline(&self, username: &str) -> Result<Timeline, String> {
        let mut request = self
            .client
            .get(format!(
                "{}/twitter/user/last_tweets",
                self.api_base.trim_end_matches('/')
            ))
            .query(&[("userName", username)])
            .header("X-API-Key", &self.api_key);
        if let Some(count) = self.count {
            request = request.query(&[("count", count)]);
        }

        let response = request
            .send()
            .await
            .map_err(|err| format!("tweet provider request failed: {}", err))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_else(|_| String::new());
            let detail = error_body.trim();
            warn!(%status, username, "tweet provider returned an error status");
            if detail.is_empty() {
                return Err(format!("failed to fetch tweets: {}", status));
            }
            return Err(format!("failed to fetch tweets: {} {}", status, detail));
        }

        let body: TimelineResponse = response
            .json()
            .await
            .map_err(|err| format!("tweet provider response parse failed: {}", err))?;

        let timeline = body.into_timeline()?;
        debug!(username, posts = timeline.posts.len(), "fetched timeline");
        Ok(timeline)
    }
}

/// Serves timelines from `{dir}/{username}.json` files in the provider's
/// response format.
#[derive(Debug, Clone)]
pub struct FixtureProvider {
    dir: PathBuf,
}

impl FixtureProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl PostProvider for FixtureProvider {
    async fn fetch_timeline(&self, username: &str) -> Result<Timeline, String> {
        let path = self.dir.join(format!("{}.json", username.to_lowercase()));
        let data = tokio::fs::read_to_string(&path)
            .await
            .map_err(|err| format!("failed to read fixture {}: {}", path.display(), err))?;
        parse_timeline(&data)
    }
}

pub fn parse_timeline(payload: &str) -> Result<Timeline, String> {
    let body: TimelineResponse = serde_json::from_str(payload)
        .map_err(|err| format!("tweet provider response parse failed: {}", err))?;
    body.into_timeline()
}

fn decode_api_key(value: String) -> String {
    if value.contains('%') {
        match urlencoding::decode(&value) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => value,
        }
    } else {
        value
    }
}

#[derive(Deserialize)]
struct TimelineResponse {
    status: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    data: Option<TimelineData>,
}

#[derive(Deserialize)]
struct TimelineData {
    tweets: Option<Vec<ApiTweet>>,
}

impl TimelineResponse {
    fn into_timeline(self) -> Result<Timeline, String> {
        if self.status.as_deref() != Some("success") {
            return Err(self
                .msg
                .or(self.message)
                .unwrap_or_else(|| "failed to fetch tweets".to_string()));
        }

        let tweets = self
            .data
            .and_then(|data| data.tweets)
            .ok_or_else(|| "invalid response format from tweet provider".to_string())?;

        let (display_name, profile_picture) = tweets
            .first()
            .and_then(|tweet| tweet.author.as_ref())
            .map(|author| (author.name.clone(), author.profile_picture.clone()))
            .unwrap_or((None, None));

        let posts = tweets
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Timeline {
            posts,
            display_name,
            profile_picture,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTweet {
    id: String,
    #[serde(default)]
    text: String,
    like_count: Option<u64>,
    reply_count: Option<u64>,
    retweet_count: Option<u64>,
    quote_count: Option<u64>,
    bookmark_count: Option<u64>,
    view_count: Option<u64>,
    author: Option<ApiAuthor>,
    #[serde(default)]
    entities: Option<ApiEntities>,
    #[serde(default, rename = "quoted_tweet")]
    quoted_tweet: Option<Value>,
    #[serde(default, rename = "retweeted_tweet")]
    retweeted_tweet: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiAuthor {
    followers: Option<u64>,
    name: Option<String>,
    profile_picture: Option<String>,
}

#[derive(Deserialize)]
struct ApiEntities {
    #[serde(default)]
    hashtags: Option<Vec<ApiHashtag>>,
    #[serde(default)]
    urls: Option<Vec<ApiUrl>>,
}

#[derive(Deserialize)]
struct ApiHashtag {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ApiUrl {
    expanded_url: Option<String>,
}

impl TryFrom<ApiTweet> for Post {
    type Error = String;

    fn try_from(tweet: ApiTweet) -> Result<Self, Self::Error> {
        let id = tweet.id;
        let required = |value: Option<u64>, field: &str| {
            value.ok_or_else(|| format!("tweet {} is missing {}", id, field))
        };

        let metrics = PostMetrics {
            likes: required(tweet.like_count, "likeCount")?,
            replies: required(tweet.reply_count, "replyCount")?,
            retweets: required(tweet.retweet_count, "retweetCount")?,
            quotes: required(tweet.quote_count, "quoteCount")?,
            bookmarks: required(tweet.bookmark_count, "bookmarkCount")?,
            views: required(tweet.view_count, "viewCount")?,
        };
        let author_followers =
            required(tweet.author.and_then(|author| author.followers), "author.followers")?;

        let entities = tweet
            .entities
            .map(|entities| PostEntities {
                hashtags: entities
                    .hashtags
                    .unwrap_or_default()
                    .into_iter()
                    .map(|hashtag| hashtag.text)
                    .collect(),
                urls: entities
                    .urls
                    .unwrap_or_default()
                    .into_iter()
                    .map(|url| UrlEntity {
                        expanded_url: url.expanded_url.unwrap_or_default(),
                    })
                    .collect(),
            })
            .unwrap_or_default();

        Ok(Post {
            id,
            text: tweet.text,
            metrics,
            author_followers,
            entities,
            quoted_post: embedded_post(tweet.quoted_tweet),
            retweeted_post: embedded_post(tweet.retweeted_tweet),
        })
    }
}

/// Only a non-empty JSON object counts as an embedded post.
fn embedded_post(value: Option<Value>) -> Option<EmbeddedPost> {
    let Some(Value::Object(map)) = value else {
        return None;
    };
    if map.is_empty() {
        return None;
    }

    let field = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
    let author = map
        .get("author")
        .and_then(|author| author.get("userName"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(EmbeddedPost {
        id: field("id"),
        text: field("text"),
        author,
    })
}
