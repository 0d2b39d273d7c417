use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::percentage::{calculate_percentage_score, SlopBand};
use crate::provider::PostProvider;
use crate::refresh::{now_secs, RefreshDecision, RefreshPolicy};
use crate::scoring::ScoringPipeline;
use crate::store::{AccountRecord, ScoreStore, UpsertOutcome};
use crate::Post;

const MAX_HANDLE_LEN: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    InvalidUsername(String),
    RefreshCooldown { remaining_minutes: u64 },
    Provider(String),
    Store(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InvalidUsername(username) => write!(f, "invalid username: {:?}", username),
            AnalysisError::RefreshCooldown { remaining_minutes } => write!(
                f,
                "refresh cooldown: try again in {} more minutes",
                remaining_minutes
            ),
            AnalysisError::Provider(err) => write!(f, "tweet provider error: {}", err),
            AnalysisError::Store(err) => write!(f, "score store error: {}", err),
        }
    }
}

impl std::error::Error for AnalysisError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStage {
    CacheHit,
    Fetching,
    Fetched { posts: usize },
    Scoring,
    Saved,
}

impl AnalysisStage {
    pub fn event(self) -> &'static str {
        match self {
            AnalysisStage::CacheHit => "cache_hit",
            AnalysisStage::Fetching => "fetching",
            AnalysisStage::Fetched { .. } => "fetched",
            AnalysisStage::Scoring => "scoring",
            AnalysisStage::Saved => "saved",
        }
    }

    pub fn message(self) -> String {
        match self {
            AnalysisStage::CacheHit => "Using stored analysis".to_string(),
            AnalysisStage::Fetching => "Fetching recent posts".to_string(),
            AnalysisStage::Fetched { posts } => format!("Fetched {} posts", posts),
            AnalysisStage::Scoring => "Scoring posts".to_string(),
            AnalysisStage::Saved => "Saved analysis".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub username: String,
    pub display_name: Option<String>,
    pub profile_picture: Option<String>,
    pub normalized_score: f64,
    pub top_score: f64,
    pub percentage: i64,
    pub band: SlopBand,
    pub rank: Option<usize>,
    pub total_users: usize,
    pub post_count: usize,
    pub from_cache: bool,
    /// False when the fetched post ids match the previous analysis.
    pub timeline_changed: bool,
    pub analyzed_at: i64,
}

pub struct AnalysisService {
    provider: Arc<dyn PostProvider>,
    store: Arc<ScoreStore>,
    refresh: RefreshPolicy,
    pipeline: ScoringPipeline,
}

impl AnalysisService {
    pub fn new(provider: Arc<dyn PostProvider>, store: Arc<ScoreStore>, refresh: RefreshPolicy) -> Self {
        Self {
            provider,
            store,
            refresh,
            pipeline: ScoringPipeline::default(),
        }
    }

    pub fn store(&self) -> &Arc<ScoreStore> {
        &self.store
    }

    pub async fn analyze(&self, username: &str, force_refresh: bool) -> Result<AnalysisReport, AnalysisError> {
        self.analyze_with_progress(username, force_refresh, &|_: AnalysisStage| {}).await
    }

    pub async fn analyze_with_progress(
        &self,
        username: &str,
        force_refresh: bool,
        progress: &(dyn Fn(AnalysisStage) + Send + Sync),
    ) -> Result<AnalysisReport, AnalysisError> {
        self.analyze_at(username, force_refresh, now_secs(), progress).await
    }

    /// Runs the workflow with an explicit clock (unix seconds).
    pub async fn analyze_at(
        &self,
        username: &str,
        force_refresh: bool,
        now: i64,
        progress: &(dyn Fn(AnalysisStage) + Send + Sync),
    ) -> Result<AnalysisReport, AnalysisError> {
        let username = normalize_username(username)?;
        let existing = self.store.get(&username).await;

        if let Some(record) = existing.as_ref() {
            if !force_refresh {
                debug!(%username, "serving stored analysis");
                progress(AnalysisStage::CacheHit);
                return Ok(self.report(record.clone(), true, false).await);
            }
            if let RefreshDecision::Cooldown { remaining_minutes } =
                self.refresh.check(record.updated_at, now)
            {
                info!(%username, remaining_minutes, "refresh rejected by cooldown");
                return Err(AnalysisError::RefreshCooldown { remaining_minutes });
            }
        }

        progress(AnalysisStage::Fetching);
        let timeline = self.provider.fetch_timeline(&username).await.map_err(|err| {
            warn!(%username, error = %err, "failed to fetch timeline");
            AnalysisError::Provider(err)
        })?;
        progress(AnalysisStage::Fetched {
            posts: timeline.posts.len(),
        });

        progress(AnalysisStage::Scoring);
        let score = self.pipeline.score(&timeline.posts);
        let posts_digest = posts_digest(&timeline.posts);
        let timeline_changed = existing
            .as_ref()
            .map_or(true, |record| record.posts_digest != posts_digest);

        let record = AccountRecord {
            username: username.clone(),
            display_name: timeline.display_name,
            profile_picture: timeline.profile_picture,
            normalized_score: score.normalized_score,
            post_count: score.post_count,
            posts_digest,
            created_at: now,
            updated_at: now,
        };
        let seen_updated_at = existing.as_ref().map(|record| record.updated_at);
        let record = match self
            .store
            .upsert_if_current(record.clone(), seen_updated_at)
            .await
            .map_err(AnalysisError::Store)?
        {
            UpsertOutcome::Saved(record) => record,
            UpsertOutcome::Conflict(current) => {
                if !force_refresh {
                    debug!(%username, "another analysis finished first");
                    progress(AnalysisStage::CacheHit);
                    return Ok(self.report(current, true, false).await);
                }
                if let RefreshDecision::Cooldown { remaining_minutes } =
                    self.refresh.check(current.updated_at, now)
                {
                    info!(%username, remaining_minutes, "concurrent refresh rejected by cooldown");
                    return Err(AnalysisError::RefreshCooldown { remaining_minutes });
                }
                self.store.upsert(record).await.map_err(AnalysisError::Store)?
            }
        };
        progress(AnalysisStage::Saved);

        info!(
            %username,
            posts = score.post_count,
            normalized_score = score.normalized_score,
            timeline_changed,
            "analysis complete"
        );
        Ok(self.report(record, false, timeline_changed).await)
    }

    async fn report(
        &self,
        record: AccountRecord,
        from_cache: bool,
        timeline_changed: bool,
    ) -> AnalysisReport {
        let top_score = self.store.top_score().await.max(record.normalized_score);
        let rank = self.store.rank_of(&record.username).await;
        let total_users = match rank {
            Some((_, total)) => total,
            None => self.store.len().await,
        };
        let percentage = calculate_percentage_score(record.normalized_score, top_score);

        AnalysisReport {
            username: record.username,
            display_name: record.display_name,
            profile_picture: record.profile_picture,
            normalized_score: record.normalized_score,
            top_score,
            percentage,
            band: SlopBand::from_percentage(percentage),
            rank: rank.map(|(rank, _)| rank),
            total_users,
            post_count: record.post_count,
            from_cache,
            timeline_changed,
            analyzed_at: record.updated_at,
        }
    }
}

/// Trims, drops a leading `@` and lowercases an account handle.
pub fn normalize_username(raw: &str) -> Result<String, AnalysisError> {
    let username = raw.trim().trim_start_matches('@').to_lowercase();
    let valid = !username.is_empty()
        && username.len() <= MAX_HANDLE_LEN
        && username
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if !valid {
        return Err(AnalysisError::InvalidUsername(raw.to_string()));
    }
    Ok(username)
}

pub fn posts_digest(posts: &[Post]) -> String {
    let mut hasher = Sha256::new();
    for post in posts {
        hasher.update(post.id.as_bytes());
        hasher.update([0u8]);
    }
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect()
}
