//! Persistent reflection cache (C8): one JSON file per issue under
//! `<base_dir>/<owner>/<repo>/issue_<n>.json`, grounded on
//! `original_source/repository/reflection_cache.py`.

use crate::agent::reflection::{ReflectionRecord, ReflectionTrigger};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SHARED_KEYWORDS: &[&str] = &[
    "test", "validation", "import", "syntax", "type", "error", "file", "missing", "not found", "failed", "exception",
];
const SHARED_TOOL_NAMES: &[&str] =
    &["modify_file", "commit_changes", "run_validation", "create_branch", "create_pull_request", "read_file"];

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    iteration: u32,
    trigger: ReflectionTrigger,
    context: Value,
    insight: String,
    timestamp: DateTime<Utc>,
    applied: bool,
}

impl From<&ReflectionRecord> for CacheEntry {
    fn from(record: &ReflectionRecord) -> Self {
        CacheEntry {
            iteration: record.iteration,
            trigger: record.trigger,
            context: record.context.clone(),
            insight: record.insight.clone(),
            timestamp: record.timestamp,
            applied: record.applied,
        }
    }
}

impl From<CacheEntry> for ReflectionRecord {
    fn from(entry: CacheEntry) -> Self {
        ReflectionRecord {
            iteration: entry.iteration,
            trigger: entry.trigger,
            context: entry.context,
            insight: entry.insight,
            timestamp: entry.timestamp,
            applied: entry.applied,
        }
    }
}

pub struct ReflectionCache {
    base_dir: PathBuf,
}

impl ReflectionCache {
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(ReflectionCache { base_dir })
    }

    fn issue_path(&self, owner: &str, repo: &str, issue_number: &str) -> PathBuf {
        self.base_dir.join(owner).join(repo).join(format!("issue_{}.json", issue_number))
    }

    fn repo_dir(&self, owner: &str, repo: &str) -> PathBuf {
        self.base_dir.join(owner).join(repo)
    }

    pub fn save_reflections(&self, owner: &str, repo: &str, issue_number: &str, records: &[ReflectionRecord]) -> Result<()> {
        let path = self.issue_path(owner, repo, issue_number);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let entries: Vec<CacheEntry> = records.iter().map(CacheEntry::from).collect();
        let json = serde_json::to_string_pretty(&entries)?;
        std::fs::write(&path, json)?;
        debug!("Saved {} reflection(s) to {}", entries.len(), path.display());
        Ok(())
    }

    /// Load every reflection file under `<owner>/<repo>/`, newest-first,
    /// dropping entries older than `max_age_days`.
    pub fn load_reflections(&self, owner: &str, repo: &str, max_age_days: i64) -> Result<Vec<ReflectionRecord>> {
        let dir = self.repo_dir(owner, repo);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let cutoff = Utc::now() - chrono::Duration::days(max_age_days);
        let mut records = Vec::new();

        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read_entry_file(&path) {
                Ok(entries) => {
                    records.extend(entries.into_iter().filter(|e: &CacheEntry| e.timestamp >= cutoff).map(ReflectionRecord::from));
                }
                Err(e) => warn!("Skipping unreadable reflection cache file {}: {}", path.display(), e),
            }
        }
        Ok(records)
    }

    fn read_entry_file(&self, path: &Path) -> Result<Vec<CacheEntry>> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Remove every reflection file under the cache older than `max_age_days`.
    pub fn cleanup_old_reflections(&self, max_age_days: i64) -> Result<usize> {
        if !self.base_dir.exists() {
            return Ok(0);
        }
        let cutoff = Utc::now() - chrono::Duration::days(max_age_days);
        let mut removed = 0;

        for owner_entry in std::fs::read_dir(&self.base_dir)? {
            let owner_dir = owner_entry?.path();
            if !owner_dir.is_dir() {
                continue;
            }
            for repo_entry in std::fs::read_dir(&owner_dir)? {
                let repo_dir = repo_entry?.path();
                if !repo_dir.is_dir() {
                    continue;
                }
                for file_entry in std::fs::read_dir(&repo_dir)? {
                    let path = file_entry?.path();
                    if path.extension().and_then(|e| e.to_str()) != Some("json") {
                        continue;
                    }
                    let stale = match self.read_entry_file(&path) {
                        Ok(entries) => entries.iter().all(|e| e.timestamp < cutoff),
                        Err(_) => true,
                    };
                    if stale {
                        std::fs::remove_file(&path)?;
                        removed += 1;
                    }
                }
            }
        }
        Ok(removed)
    }

    /// Score every loaded record against `current_context`/`current_trigger`
    /// and return those with a positive score, highest first.
    pub fn get_similar_reflections(
        &self,
        owner: &str,
        repo: &str,
        current_trigger: ReflectionTrigger,
        current_context: &Value,
        max_age_days: i64,
        limit: usize,
    ) -> Result<Vec<ReflectionRecord>> {
        let records = self.load_reflections(owner, repo, max_age_days)?;
        let mut scored: Vec<(f64, ReflectionRecord)> = records
            .into_iter()
            .map(|r| {
                let score = Self::compute_similarity(&r, current_trigger, current_context);
                (score, r)
            })
            .filter(|(score, _)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored.into_iter().take(limit).map(|(_, r)| r).collect())
    }

    fn compute_similarity(record: &ReflectionRecord, trigger: ReflectionTrigger, context: &Value) -> f64 {
        let mut score = 0.0;
        if record.trigger == trigger {
            score += 1.0;
        }

        let record_text = format!("{} {}", record.insight, record.context).to_lowercase();
        let context_text = context.to_string().to_lowercase();
        for keyword in SHARED_KEYWORDS {
            if record_text.contains(keyword) && context_text.contains(keyword) {
                score += 0.5;
            }
        }
        for tool in SHARED_TOOL_NAMES {
            if record_text.contains(tool) && context_text.contains(tool) {
                score += 0.3;
            }
        }

        if let (Some(record_files), Some(context_files)) = (
            record.context.get("files_modified").and_then(Value::as_array),
            context.get("files_modified").and_then(Value::as_array),
        ) {
            let record_paths: std::collections::HashSet<&str> = record_files.iter().filter_map(Value::as_str).collect();
            let overlap = context_files.iter().filter_map(Value::as_str).filter(|p| record_paths.contains(p)).count();
            score += overlap as f64 * 0.2;
        }

        score
    }

    pub fn get_cache_stats(&self, owner: &str, repo: &str) -> Result<CacheStats> {
        let records = self.load_reflections(owner, repo, i64::MAX / (24 * 3600))?;
        let mut by_trigger = std::collections::HashMap::new();
        for record in &records {
            *by_trigger.entry(record.trigger.as_str().to_string()).or_insert(0usize) += 1;
        }
        Ok(CacheStats {
            total_records: records.len(),
            by_trigger,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_records: usize,
    pub by_trigger: std::collections::HashMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn make_record(trigger: ReflectionTrigger, insight: &str, context: Value) -> ReflectionRecord {
        ReflectionRecord::new(1, trigger, context, insight.to_string())
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let cache = ReflectionCache::new(dir.path()).unwrap();
        let records = vec![make_record(ReflectionTrigger::ToolError, "retry with smaller input", json!({}))];

        cache.save_reflections("acme", "widgets", "42", &records).unwrap();
        let loaded = cache.load_reflections("acme", "widgets", 30).unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].insight, "retry with smaller input");
    }

    #[test]
    fn load_reflections_skips_entries_past_max_age() {
        let dir = tempdir().unwrap();
        let cache = ReflectionCache::new(dir.path()).unwrap();
        let mut record = make_record(ReflectionTrigger::Periodic, "stale", json!({}));
        record.timestamp = Utc::now() - chrono::Duration::days(90);

        cache.save_reflections("acme", "widgets", "1", std::slice::from_ref(&record)).unwrap();
        let loaded = cache.load_reflections("acme", "widgets", 30).unwrap();

        assert!(loaded.is_empty());
    }

    #[test]
    fn similarity_prefers_matching_trigger_and_keywords() {
        let dir = tempdir().unwrap();
        let cache = ReflectionCache::new(dir.path()).unwrap();
        let records = vec![
            make_record(ReflectionTrigger::ToolError, "timeout while calling read_file", json!({})),
            make_record(ReflectionTrigger::Periodic, "unrelated progress note", json!({})),
        ];
        cache.save_reflections("acme", "widgets", "7", &records).unwrap();

        let similar = cache
            .get_similar_reflections(
                "acme",
                "widgets",
                ReflectionTrigger::ToolError,
                &json!({"error": "timeout calling read_file again"}),
                30,
                5,
            )
            .unwrap();

        assert_eq!(similar.len(), 1);
        assert!(similar[0].insight.contains("timeout"));
    }

    #[test]
    fn cleanup_removes_stale_files() {
        let dir = tempdir().unwrap();
        let cache = ReflectionCache::new(dir.path()).unwrap();
        let mut record = make_record(ReflectionTrigger::Periodic, "old", json!({}));
        record.timestamp = Utc::now() - chrono::Duration::days(120);
        cache.save_reflections("acme", "widgets", "1", std::slice::from_ref(&record)).unwrap();

        let removed = cache.cleanup_old_reflections(90).unwrap();
        assert_eq!(removed, 1);
    }
}
