use serde::{Deserialize, Serialize};
use slop_score::analysis::AnalysisError;
use slop_score::scoring::{AccountScore, PostBreakdown};
use slop_score::{calculate_percentage_score, Post, SlopBand};

#[derive(Debug, Deserialize)]
pub struct ApiScoreRequest {
    pub posts: Vec<Post>,
    pub top_score: Option<f64>,
    pub details: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ApiScoreResponse {
    pub normalized_score: f64,
    pub average_raw: f64,
    pub post_count: usize,
    pub top_score: f64,
    pub percentage: i64,
    pub band: SlopBand,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posts: Option<Vec<PostBreakdown>>,
}

impl ApiScoreResponse {
    /// `population_top` is raised to the account's own score so the account is
    /// always part of the population it is compared against.
    pub fn from_score(score: AccountScore, population_top: f64, details: bool) -> Self {
        let top_score = population_top.max(score.normalized_score);
        let percentage = calculate_percentage_score(score.normalized_score, top_score);
        let band = SlopBand::from_percentage(percentage);
        Self {
            normalized_score: score.normalized_score,
            average_raw: score.average_raw,
            post_count: score.post_count,
            top_score,
            percentage,
            band,
            label: band.label().to_string(),
            posts: details.then_some(score.posts),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiAccountQuery {
    pub refresh: Option<bool>,
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_minutes: Option<u64>,
}

impl ApiError {
    pub fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            remaining_minutes: None,
        }
    }
}

impl From<&AnalysisError> for ApiError {
    fn from(err: &AnalysisError) -> Self {
        match err {
            AnalysisError::RefreshCooldown { remaining_minutes } => Self {
                error: "refresh_cooldown".to_string(),
                remaining_minutes: Some(*remaining_minutes),
            },
            other => Self::message(other.to_string()),
        }
    }
}
