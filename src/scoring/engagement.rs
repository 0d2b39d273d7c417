use serde::{Deserialize, Serialize};

/// Follower-scaled expectation for one engagement signal.
///
/// The expected rate decays as a power law of the follower count
/// (`baseline_rate * followers^-decay_exponent`), and the log ratio between the
/// actual and expected count is squashed through a logistic curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementCurve {
    pub baseline_rate: f64,
    pub decay_exponent: f64,
    pub expected_floor: f64,
    pub steepness: f64,
}

impl EngagementCurve {
    pub fn expected_count(&self, followers: f64) -> f64 {
        let expected_rate = self.baseline_rate * followers.powf(-self.decay_exponent);
        (expected_rate * followers).max(self.expected_floor)
    }

    /// Relative performance in `(0, 1)`; `0.5` means the post did exactly as expected.
    pub fn performance(&self, actual: f64, followers: f64) -> f64 {
        let log_ratio = actual.log10() - self.expected_count(followers).log10();
        sigmoid(log_ratio * self.steepness)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateScoreConfig {
    pub curve: EngagementCurve,
    /// Minimum acceptable count/followers rate before the dilution penalty kicks in.
    pub dilution_threshold: f64,
    /// Returned for zero engagement and used as the lower clamp.
    pub score_floor: f64,
}

impl RateScoreConfig {
    pub fn likes() -> Self {
        Self {
            curve: EngagementCurve {
                baseline_rate: 0.05,
                decay_exponent: 0.2,
                expected_floor: 1.0,
                steepness: 2.0,
            },
            dilution_threshold: 0.001,
            score_floor: 0.1,
        }
    }

    pub fn replies() -> Self {
        Self {
            curve: EngagementCurve {
                baseline_rate: 0.008,
                decay_exponent: 0.25,
                expected_floor: 1.0,
                steepness: 2.5,
            },
            dilution_threshold: 0.0005,
            score_floor: 0.2,
        }
    }

    pub fn score(&self, count: u64, followers: u64) -> f64 {
        if count == 0 {
            return self.score_floor;
        }

        let followers = effective_followers(followers);
        let actual = count as f64;
        let performance = self.curve.performance(actual, followers);

        let actual_rate = actual / followers;
        let dilution = (actual_rate / self.dilution_threshold).clamp(self.score_floor, 1.0);

        (performance * dilution).clamp(self.score_floor, 1.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkConfig {
    pub curve: EngagementCurve,
    pub rate_bonus_scale: f64,
    pub max_rate_multiplier: f64,
    pub max_points: f64,
}

impl Default for BookmarkConfig {
    fn default() -> Self {
        Self {
            curve: EngagementCurve {
                baseline_rate: 0.002,
                decay_exponent: 0.3,
                expected_floor: 0.1,
                steepness: 1.8,
            },
            rate_bonus_scale: 1000.0,
            max_rate_multiplier: 2.0,
            max_points: 150.0,
        }
    }
}

impl BookmarkConfig {
    /// Bookmark points in `[0, max_points]`, rounded to a whole number.
    /// No bookmarks is not a penalty, just zero points.
    pub fn points(&self, count: u64, followers: u64) -> f64 {
        if count == 0 {
            return 0.0;
        }

        let followers = effective_followers(followers);
        let actual = count as f64;
        let raw_score = self.curve.performance(actual, followers);

        let actual_rate = actual / followers;
        let rate_multiplier = (1.0 + actual_rate * self.rate_bonus_scale).min(self.max_rate_multiplier);

        (raw_score * rate_multiplier * self.max_points)
            .clamp(0.0, self.max_points)
            .round()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementModel {
    pub likes: RateScoreConfig,
    pub replies: RateScoreConfig,
    pub bookmarks: BookmarkConfig,
}

impl Default for EngagementModel {
    fn default() -> Self {
        Self {
            likes: RateScoreConfig::likes(),
            replies: RateScoreConfig::replies(),
            bookmarks: BookmarkConfig::default(),
        }
    }
}

impl EngagementModel {
    pub fn like_score(&self, likes: u64, followers: u64) -> f64 {
        self.likes.score(likes, followers)
    }

    pub fn reply_score(&self, replies: u64, followers: u64) -> f64 {
        self.replies.score(replies, followers)
    }

    pub fn bookmark_points(&self, bookmarks: u64, followers: u64) -> f64 {
        self.bookmarks.points(bookmarks, followers)
    }
}

/// Accounts with no followers are modelled as having one, which keeps the power
/// law and the rate divisions finite.
pub fn effective_followers(followers: u64) -> f64 {
    followers.max(1) as f64
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
