use serde::{Deserialize, Serialize};

use crate::config::LeaderboardConfig;
use crate::percentage::{calculate_percentage_score, SlopBand};
use crate::store::{AccountRecord, ScoreStore};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub search: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub username: String,
    pub display_name: Option<String>,
    pub profile_picture: Option<String>,
    pub normalized_score: f64,
    pub percentage: i64,
    pub band: SlopBand,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardPage {
    pub entries: Vec<LeaderboardEntry>,
    pub pagination: Pagination,
    pub top_score: f64,
}

pub async fn query_leaderboard(
    store: &ScoreStore,
    query: &LeaderboardQuery,
    config: &LeaderboardConfig,
) -> LeaderboardPage {
    build_page(store.list_ranked().await, query, config)
}

/// Builds one page from records already sorted best-first.
///
/// Ranks are positions in the full list, so a filtered entry keeps its overall rank.
pub fn build_page(
    ranked: Vec<AccountRecord>,
    query: &LeaderboardQuery,
    config: &LeaderboardConfig,
) -> LeaderboardPage {
    let top_score = ranked
        .first()
        .map(|record| record.normalized_score)
        .unwrap_or(0.0);
    let needle = query
        .search
        .as_deref()
        .map(|search| search.trim().trim_start_matches('@').to_lowercase())
        .filter(|search| !search.is_empty());

    let matching: Vec<(usize, AccountRecord)> = ranked
        .into_iter()
        .enumerate()
        .filter(|(_, record)| match needle.as_deref() {
            Some(needle) => matches_search(record, needle),
            None => true,
        })
        .map(|(index, record)| (index + 1, record))
        .collect();

    let limit = query
        .limit
        .unwrap_or(config.default_limit)
        .clamp(1, config.max_limit.max(1));
    let page = query.page.unwrap_or(1).max(1);
    let total = matching.len();
    let total_pages = total.div_ceil(limit);

    let entries = matching
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .map(|(rank, record)| {
            let percentage = calculate_percentage_score(record.normalized_score, top_score);
            LeaderboardEntry {
                rank,
                username: record.username,
                display_name: record.display_name,
                profile_picture: record.profile_picture,
                normalized_score: record.normalized_score,
                percentage,
                band: SlopBand::from_percentage(percentage),
                updated_at: record.updated_at,
            }
        })
        .collect();

    LeaderboardPage {
        entries,
        pagination: Pagination {
            page,
            limit,
            total,
            total_pages,
        },
        top_score,
    }
}

fn matches_search(record: &AccountRecord, needle: &str) -> bool {
    record.username.to_lowercase().contains(needle)
        || record
            .display_name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(needle))
}
