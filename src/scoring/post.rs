use serde::{Deserialize, Serialize};

use crate::scoring::{ContentFlags, EngagementModel, Penalties, PenaltyCalculator};
use crate::Post;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostWeights {
    pub like: f64,
    pub reply: f64,
    pub retweet: f64,
    pub media_with_text: f64,
    pub quote: f64,
    pub quote_with_media: f64,
}

impl Default for PostWeights {
    fn default() -> Self {
        Self {
            like: 200.0,
            reply: 100.0,
            retweet: -100.0,
            media_with_text: 50.0,
            quote: -50.0,
            quote_with_media: 75.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostBreakdown {
    pub post_id: String,
    pub flags: ContentFlags,
    pub like_score: f64,
    pub reply_score: f64,
    pub bookmark_points: f64,
    pub engagement: f64,
    pub content_adjustment: f64,
    pub penalties: Penalties,
    pub raw_score: f64,
}

#[derive(Debug, Clone, Default)]
pub struct PostScorer {
    weights: PostWeights,
    engagement: EngagementModel,
    penalties: PenaltyCalculator,
}

impl PostScorer {
    pub fn new(
        weights: PostWeights,
        engagement: EngagementModel,
        penalties: PenaltyCalculator,
    ) -> Self {
        Self {
            weights,
            engagement,
            penalties,
        }
    }

    pub fn raw_score(&self, post: &Post) -> f64 {
        self.score(post).raw_score
    }

    pub fn score(&self, post: &Post) -> PostBreakdown {
        let flags = ContentFlags::classify(post);
        let followers = post.author_followers;

        // Retweet engagement belongs to the original author.
        let (like_score, reply_score, bookmark_points) = if flags.is_retweet {
            (0.0, 0.0, 0.0)
        } else {
            (
                self.engagement.like_score(post.metrics.likes, followers),
                self.engagement.reply_score(post.metrics.replies, followers),
                self.engagement
                    .bookmark_points(post.metrics.bookmarks, followers),
            )
        };

        let engagement = if flags.is_retweet {
            self.weights.retweet
        } else {
            like_score * self.weights.like + reply_score * self.weights.reply + bookmark_points
        };

        let content_adjustment = self.content_adjustment(&flags);
        let penalties = self.penalties.penalties(post, &flags);
        let raw_score = engagement + content_adjustment - penalties.total();

        PostBreakdown {
            post_id: post.id.clone(),
            flags,
            like_score,
            reply_score,
            bookmark_points,
            engagement,
            content_adjustment,
            penalties,
            raw_score,
        }
    }

    /// Media, text and quote adjustments stack independently; retweets get none.
    fn content_adjustment(&self, flags: &ContentFlags) -> f64 {
        if flags.is_retweet {
            return 0.0;
        }

        let illustrated = flags.has_media && flags.has_text;
        let mut adjustment = 0.0;
        if illustrated && !flags.is_quote {
            adjustment += self.weights.media_with_text;
        }
        if flags.is_quote {
            adjustment += self.weights.quote;
        }
        if illustrated && flags.is_quote {
            adjustment += self.weights.quote_with_media;
        }
        adjustment
    }
}
