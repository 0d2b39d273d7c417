use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config::RefreshConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshDecision {
    Allowed,
    Cooldown { remaining_minutes: u64 },
}

/// Gates forced re-analysis of an account that already has a stored score.
#[derive(Debug, Clone, Copy)]
pub struct RefreshPolicy {
    cooldown: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self::from_config(&RefreshConfig::default())
    }
}

impl RefreshPolicy {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown }
    }

    pub fn from_config(config: &RefreshConfig) -> Self {
        Self::new(Duration::from_secs(config.cooldown_minutes * 60))
    }

    /// `last_updated` and `now` are unix seconds.
    pub fn check(&self, last_updated: i64, now: i64) -> RefreshDecision {
        let elapsed = now.saturating_sub(last_updated).max(0) as u64;
        let cooldown = self.cooldown.as_secs();
        if elapsed >= cooldown {
            return RefreshDecision::Allowed;
        }
        let remaining = cooldown - elapsed;
        RefreshDecision::Cooldown {
            remaining_minutes: remaining.div_ceil(60),
        }
    }
}

pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs() as i64)
        .unwrap_or(0)
}
