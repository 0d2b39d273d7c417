use serde::{Deserialize, Serialize};

use crate::scoring::normalize::{average, normalize};
use crate::scoring::{PostBreakdown, PostScorer};
use crate::Post;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountScore {
    pub normalized_score: f64,
    pub average_raw: f64,
    pub post_count: usize,
    pub posts: Vec<PostBreakdown>,
}

impl AccountScore {
    pub fn empty() -> Self {
        Self {
            normalized_score: 0.0,
            average_raw: 0.0,
            post_count: 0,
            posts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScoringPipeline {
    post_scorer: PostScorer,
}

impl ScoringPipeline {
    pub fn new(post_scorer: PostScorer) -> Self {
        Self { post_scorer }
    }

    pub fn score(&self, posts: &[Post]) -> AccountScore {
        let breakdowns: Vec<PostBreakdown> = posts
            .iter()
            .map(|post| self.post_scorer.score(post))
            .collect();
        let raw_scores: Vec<f64> = breakdowns.iter().map(|post| post.raw_score).collect();

        let Some(average_raw) = average(&raw_scores) else {
            return AccountScore::empty();
        };

        AccountScore {
            normalized_score: normalize(average_raw),
            average_raw,
            post_count: breakdowns.len(),
            posts: breakdowns,
        }
    }
}
