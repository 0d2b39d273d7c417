pub mod analysis;
pub mod config;
pub mod leaderboard;
pub mod percentage;
pub mod provider;
pub mod refresh;
pub mod scoring;
pub mod store;

use serde::{Deserialize, Serialize};

use crate::scoring::{AccountScore, ScoringPipeline};

pub use percentage::{calculate_percentage_score, SlopBand};

/// Raw engagement counters attached to a post.
///
/// Every field is required on deserialization: a batch with a missing counter is
/// rejected instead of being scored as if the counter were zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMetrics {
    pub likes: u64,
    pub replies: u64,
    pub retweets: u64,
    pub quotes: u64,
    pub bookmarks: u64,
    pub views: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlEntity {
    #[serde(default)]
    pub expanded_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostEntities {
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub urls: Vec<UrlEntity>,
}

/// A quoted or retweeted post embedded inside another post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedPost {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub text: String,
    pub metrics: PostMetrics,
    pub author_followers: u64,
    #[serde(default)]
    pub entities: PostEntities,
    #[serde(default)]
    pub quoted_post: Option<EmbeddedPost>,
    #[serde(default)]
    pub retweeted_post: Option<EmbeddedPost>,
}

impl Post {
    pub fn new(id: impl Into<String>, text: impl Into<String>, author_followers: u64) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metrics: PostMetrics::default(),
            author_followers,
            entities: PostEntities::default(),
            quoted_post: None,
            retweeted_post: None,
        }
    }

    pub fn with_metrics(mut self, metrics: PostMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_hashtags<I, S>(mut self, hashtags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entities.hashtags = hashtags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entities.urls = urls
            .into_iter()
            .map(|url| UrlEntity {
                expanded_url: url.into(),
            })
            .collect();
        self
    }

    pub fn quoting(mut self, embedded: EmbeddedPost) -> Self {
        self.quoted_post = Some(embedded);
        self
    }

    pub fn retweeting(mut self, embedded: EmbeddedPost) -> Self {
        self.retweeted_post = Some(embedded);
        self
    }
}

/// Scores a batch of posts and returns the account's normalized score in `[0, 100]`.
///
/// An empty batch scores `0`.
pub fn calculate_signal_to_noise(posts: &[Post]) -> f64 {
    score_account(posts).normalized_score
}

/// Same as [`calculate_signal_to_noise`] but keeps the per-post breakdown.
pub fn score_account(posts: &[Post]) -> AccountScore {
    ScoringPipeline::default().score(posts)
}

pub fn format_float(value: f64, digits: usize) -> String {
    format!("{:.1$}", value, digits)
}

pub fn format_signed(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else if value > 0.0 {
        format!("+{:.0}", value)
    } else {
        format!("{:.0}", value)
    }
}
