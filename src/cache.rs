use crate::analysis::simulation::SimulationSummary;
use crate::error::DraftError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Summaries kept on disk, newest first.
pub const MAX_CACHED_RUNS: usize = 20;

#[derive(Debug, Serialize, Deserialize)]
pub struct SimulationCache {
    pub last_updated: DateTime<Utc>,
    pub runs: Vec<SimulationSummary>,
}

impl Default for SimulationCache {
    fn default() -> Self {
        SimulationCache::new()
    }
}

impl SimulationCache {
    pub fn new() -> Self {
        SimulationCache {
            last_updated: Utc::now(),
            runs: Vec::new(),
        }
    }

    pub fn get_cache_path(dir: &Path) -> PathBuf {
        dir.join("simulations.json")
    }

    pub fn load(dir: &Path) -> Result<Self, DraftError> {
        let path = Self::get_cache_path(dir);

        match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                DraftError::JsonError(format!("Failed to parse cache: {}", e))
            }),
            // Nothing simulated yet
            Err(_) => Ok(SimulationCache::new()),
        }
    }

    pub fn save(&self, dir: &Path) -> Result<(), DraftError> {
        fs::create_dir_all(dir).map_err(|e| {
            DraftError::IoError(format!("Failed to create {}: {}", dir.display(), e))
        })?;
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            DraftError::JsonError(format!("Failed to serialize cache: {}", e))
        })?;

        fs::write(Self::get_cache_path(dir), json).map_err(|e| {
            DraftError::IoError(format!("Failed to write cache: {}", e))
        })?;

        Ok(())
    }

    /// A rerun with the same seed and game count replaces the older entry.
    pub fn add_run(&mut self, summary: SimulationSummary) {
        self.runs
            .retain(|run| !(run.seed == summary.seed && run.games == summary.games));
        self.runs.push(summary);
        self.runs.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
        self.runs.truncate(MAX_CACHED_RUNS);
        self.last_updated = Utc::now();
    }

    pub fn latest(&self) -> Option<&SimulationSummary> {
        self.runs.first()
    }

    pub fn is_stale(&self, max_age_mins: u64) -> bool {
        let age = Utc::now().signed_duration_since(self.last_updated);
        age.num_minutes() > max_age_mins as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::BTreeMap;

    fn summary(seed: u64, games: usize, at: DateTime<Utc>) -> SimulationSummary {
        SimulationSummary {
            games,
            seed,
            blue_wins: games / 2,
            average_blue_probability: 0.5,
            average_confidence: 0.55,
            compositions: BTreeMap::new(),
            matchups: BTreeMap::new(),
            generated_at: at,
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SimulationCache::load(dir.path()).unwrap();
        assert!(cache.latest().is_none());
    }

    #[test]
    fn save_then_load_keeps_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc::now();
        let mut cache = SimulationCache::new();
        cache.add_run(summary(1, 100, now - Duration::minutes(5)));
        cache.add_run(summary(2, 100, now));
        cache.save(dir.path()).unwrap();

        let loaded = SimulationCache::load(dir.path()).unwrap();
        assert_eq!(loaded.runs.len(), 2);
        assert_eq!(loaded.latest().map(|r| r.seed), Some(2));
        assert!(!loaded.is_stale(60));
    }

    #[test]
    fn rerun_replaces_matching_entry() {
        let mut cache = SimulationCache::new();
        cache.add_run(summary(7, 50, Utc::now()));
        cache.add_run(summary(7, 50, Utc::now()));
        cache.add_run(summary(7, 60, Utc::now()));
        assert_eq!(cache.runs.len(), 2);
    }

    #[test]
    fn corrupt_file_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(SimulationCache::get_cache_path(dir.path()), "{not json").unwrap();
        assert!(matches!(
            SimulationCache::load(dir.path()),
            Err(DraftError::JsonError(_))
        ));
    }
}
