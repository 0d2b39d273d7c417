use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub username: String,
    pub display_name: Option<String>,
    pub profile_picture: Option<String>,
    pub normalized_score: f64,
    pub post_count: usize,
    pub posts_digest: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    Saved(AccountRecord),
    /// Another writer updated the record first.
    Conflict(AccountRecord),
}

/// Last computed score per account handle. Keys are lowercase handles.
pub struct ScoreStore {
    path: Option<PathBuf>,
    records: RwLock<HashMap<String, AccountRecord>>,
}

impl ScoreStore {
    pub async fn load(path: PathBuf) -> Result<Self, String> {
        let records = if path.exists() {
            let data = tokio::fs::read_to_string(&path)
                .await
                .map_err(|err| format!("failed to read score store: {}", err))?;
            if data.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&data)
                    .map_err(|err| format!("failed to parse score store: {}", err))?
            }
        } else {
            HashMap::new()
        };

        Ok(Self {
            path: Some(path),
            records: RwLock::new(records),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            records: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, username: &str) -> Option<AccountRecord> {
        let guard = self.records.read().await;
        guard.get(&username.to_lowercase()).cloned()
    }

    /// Inserts or replaces the record, keeping the original `created_at`.
    ///
    /// The in-memory map only changes once the new state has been persisted.
    pub async fn upsert(&self, record: AccountRecord) -> Result<AccountRecord, String> {
        let mut guard = self.records.write().await;
        self.commit(&mut guard, record).await
    }

    /// Writes `record` only if the stored record for the handle still has
    /// `expected_updated_at` (`None` meaning no record). Otherwise nothing is
    /// written and the current record is returned.
    pub async fn upsert_if_current(
        &self,
        record: AccountRecord,
        expected_updated_at: Option<i64>,
    ) -> Result<UpsertOutcome, String> {
        let mut guard = self.records.write().await;
        if let Some(current) = guard.get(&record.username.to_lowercase()) {
            if Some(current.updated_at) != expected_updated_at {
                return Ok(UpsertOutcome::Conflict(current.clone()));
            }
        }
        self.commit(&mut guard, record).await.map(UpsertOutcome::Saved)
    }

    async fn commit(
        &self,
        records: &mut HashMap<String, AccountRecord>,
        mut record: AccountRecord,
    ) -> Result<AccountRecord, String> {
        record.username = record.username.to_lowercase();
        if let Some(existing) = records.get(&record.username) {
            record.created_at = existing.created_at;
        }
        let mut next = records.clone();
        next.insert(record.username.clone(), record.clone());
        self.persist(&next).await?;
        *records = next;
        Ok(record)
    }

    /// All records, best score first; ties are ordered by handle.
    pub async fn list_ranked(&self) -> Vec<AccountRecord> {
        let guard = self.records.read().await;
        let mut records: Vec<AccountRecord> = guard.values().cloned().collect();
        records.sort_by(compare_ranked);
        records
    }

    pub async fn top_score(&self) -> f64 {
        let guard = self.records.read().await;
        guard
            .values()
            .map(|record| record.normalized_score)
            .fold(0.0, f64::max)
    }

    /// 1-based rank and the population size.
    pub async fn rank_of(&self, username: &str) -> Option<(usize, usize)> {
        let ranked = self.list_ranked().await;
        let username = username.to_lowercase();
        ranked
            .iter()
            .position(|record| record.username == username)
            .map(|index| (index + 1, ranked.len()))
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    async fn persist(&self, records: &HashMap<String, AccountRecord>) -> Result<(), String> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            ensure_dir(parent).await?;
        }
        let payload = serde_json::to_string_pretty(records)
            .map_err(|err| format!("failed to serialize score store: {}", err))?;
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, payload)
            .await
            .map_err(|err| format!("failed to write score store: {}", err))?;
        tokio::fs::rename(&tmp_path, path)
            .await
            .map_err(|err| format!("failed to finalize score store: {}", err))?;
        Ok(())
    }
}

fn compare_ranked(a: &AccountRecord, b: &AccountRecord) -> Ordering {
    b.normalized_score
        .partial_cmp(&a.normalized_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.username.cmp(&b.username))
}

async fn ensure_dir(path: &Path) -> Result<(), String> {
    if path.as_os_str().is_empty() || path.exists() {
        return Ok(());
    }
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|err| format!("failed to create score store dir: {}", err))
}
