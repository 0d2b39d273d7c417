use serde::{Deserialize, Serialize};

/// Inverted, population-relative "slop" percentage. Lower is better: the
/// account holding `top_score` gets `0`.
///
/// A zero (or NaN) user score, or a non-positive top score, yields `100`. The
/// result is not clamped.
pub fn calculate_percentage_score(user_score: f64, top_score: f64) -> i64 {
    if user_score == 0.0 || user_score.is_nan() || top_score.is_nan() || top_score <= 0.0 {
        return 100;
    }
    round_half_up(100.0 - (user_score / top_score) * 100.0) as i64
}

fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlopBand {
    Low,
    Moderate,
    High,
}

impl SlopBand {
    pub fn from_percentage(pct: i64) -> Self {
        if pct <= 20 {
            SlopBand::Low
        } else if pct <= 50 {
            SlopBand::Moderate
        } else {
            SlopBand::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SlopBand::Low => "Low Slop",
            SlopBand::Moderate => "Moderate Slop",
            SlopBand::High => "High Slop",
        }
    }
}
