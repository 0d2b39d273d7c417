/// Mean of the raw per-post scores, `None` for an empty batch.
pub fn average(raw_scores: &[f64]) -> Option<f64> {
    if raw_scores.is_empty() {
        return None;
    }
    Some(raw_scores.iter().sum::<f64>() / raw_scores.len() as f64)
}

/// Maps an average raw score onto `[0, 100]`, rounded to two decimals.
///
/// | average        | score                          |
/// |----------------|--------------------------------|
/// | <= -200        | 10 + (avg + 200) / 50, min 0   |
/// | (-200, 0]      | 20 + avg / 10, min 0           |
/// | (0, 200]       | 20 .. 50                       |
/// | (200, 500]     | 50 .. 80                       |
/// | > 500          | 80 + (avg - 500) / 100, max 100|
pub fn normalize(average: f64) -> f64 {
    let score = if average <= -200.0 {
        (10.0 + (average + 200.0) / 50.0).max(0.0)
    } else if average <= 0.0 {
        (20.0 + average / 10.0).max(0.0)
    } else if average <= 200.0 {
        20.0 + (average / 200.0) * 30.0
    } else if average <= 500.0 {
        50.0 + ((average - 200.0) / 300.0) * 30.0
    } else {
        80.0 + ((average - 500.0) / 100.0).min(20.0)
    };

    round2(score.clamp(0.0, 100.0))
}

pub fn normalize_batch(raw_scores: &[f64]) -> f64 {
    average(raw_scores).map(normalize).unwrap_or(0.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
