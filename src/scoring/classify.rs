use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::Post;

const RETWEET_PREFIX: &str = "RT @";
const MEDIA_SHORTLINKS: [&str; 2] = ["pic.twitter.com", "https://t.co/"];
const PLATFORM_DOMAINS: [&str; 3] = ["twitter.com", "x.com", "t.co"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFlags {
    pub is_retweet: bool,
    pub is_quote: bool,
    pub has_media: bool,
    pub has_text: bool,
    pub has_external_link: bool,
}

impl ContentFlags {
    pub fn classify(post: &Post) -> Self {
        Self {
            is_retweet: is_retweet(post),
            is_quote: is_quote(post),
            has_media: has_media(post),
            has_text: has_text(post),
            has_external_link: has_external_link(post),
        }
    }
}

pub fn is_retweet(post: &Post) -> bool {
    post.retweeted_post.is_some() || post.text.trim().starts_with(RETWEET_PREFIX)
}

pub fn is_quote(post: &Post) -> bool {
    post.quoted_post.is_some()
}

pub fn has_media(post: &Post) -> bool {
    !post.entities.urls.is_empty()
        || MEDIA_SHORTLINKS
            .iter()
            .any(|needle| post.text.contains(needle))
}

pub fn has_text(post: &Post) -> bool {
    !post.text.trim().is_empty()
}

pub fn has_external_link(post: &Post) -> bool {
    post.entities
        .urls
        .iter()
        .any(|url| !is_platform_url(&url.expanded_url))
}

/// Unparseable or empty URLs are treated as external.
pub fn is_platform_url(expanded_url: &str) -> bool {
    let Ok(url) = Url::parse(expanded_url.trim()) else {
        return false;
    };
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    PLATFORM_DOMAINS.iter().any(|domain| {
        host == *domain
            || host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}
