//! The loaded, immutable bundle every request reads from.

use crate::analysis::classifier::ArchetypeClassifier;
use crate::analysis::ensemble::EnsemblePredictor;
use crate::analysis::matrix::{MatrixOverrides, SynergyCounterMatrix};
use crate::analysis::recommender::{BanAdvisor, RecommendationEngine, RecommendationWeights};
use crate::analysis::store::AttributeStore;
use crate::config::Config;
use crate::error::DraftError;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{info, warn};

pub const CHAMPIONS_FILE: &str = "champions.json";
pub const MODELS_FILE: &str = "models.json";
pub const MATRIX_FILE: &str = "matrix.json";

#[derive(Debug)]
pub enum PredictorState {
    Ready(EnsemblePredictor),
    /// Reason the models could not be used.
    Unavailable(String),
}

pub struct DraftEngine {
    pub classifier: ArchetypeClassifier,
    pub store: AttributeStore,
    pub matrix: SynergyCounterMatrix,
    pub predictor: PredictorState,
    pub diversity_cap: usize,
    pub weights: RecommendationWeights,
    pub default_limit: usize,
    pub simulation_max_age_mins: u64,
    pub data_dir: PathBuf,
    pub matrix_overrides: usize,
    /// Set when `matrix.json` was unreadable or had rejected cells.
    pub matrix_issue: Option<String>,
    pub loaded_at: DateTime<Utc>,
}

impl DraftEngine {
    /// Champion data is required. Missing or corrupted models leave the
    /// predictor unavailable; an unreadable matrix file falls back to the
    /// authored defaults.
    pub fn load(config: &Config) -> Result<Self, DraftError> {
        let dir = &config.data_dir;
        let classifier = ArchetypeClassifier::standard(config.secondary_threshold);
        let store = AttributeStore::load(&dir.join(CHAMPIONS_FILE), &classifier)?;

        let mut matrix = SynergyCounterMatrix::authored();
        let mut matrix_overrides = 0;
        let mut matrix_issue = None;
        let matrix_path = dir.join(MATRIX_FILE);
        if matrix_path.exists() {
            match MatrixOverrides::load(&matrix_path) {
                Ok(overrides) => {
                    let report = matrix.apply_overrides(&overrides);
                    matrix_overrides = report.applied;
                    if !report.skipped.is_empty() {
                        matrix_issue = Some(format!(
                            "{} matrix override cell(s) skipped: {}",
                            report.skipped.len(),
                            report.skipped.join(", ")
                        ));
                    }
                }
                Err(e) => {
                    warn!(error = %e, "matrix overrides ignored; using authored defaults");
                    matrix_issue =
                        Some(format!("matrix overrides unusable, authored defaults in use: {}", e));
                }
            }
        }

        let models_path = dir.join(MODELS_FILE);
        let predictor = if !models_path.exists() {
            let reason = format!("model artifacts not found at {}", models_path.display());
            warn!("{}", reason);
            PredictorState::Unavailable(reason)
        } else {
            match EnsemblePredictor::load(&models_path) {
                Ok(predictor) => PredictorState::Ready(predictor),
                Err(e) => {
                    let reason = format!("model artifacts unusable: {}", e);
                    warn!("{}", reason);
                    PredictorState::Unavailable(reason)
                }
            }
        };

        let engine = DraftEngine {
            classifier,
            store,
            matrix,
            predictor,
            diversity_cap: config.diversity_cap,
            weights: config.weights,
            default_limit: config.default_limit,
            simulation_max_age_mins: config.simulation_max_age_mins,
            data_dir: dir.clone(),
            matrix_overrides,
            matrix_issue,
            loaded_at: Utc::now(),
        };
        info!(
            champions = engine.store.len(),
            predictor_ready = engine.predictor_ready(),
            "draft engine loaded"
        );
        Ok(engine)
    }

    /// Assembles an engine from already-built parts.
    pub fn from_parts(
        classifier: ArchetypeClassifier,
        store: AttributeStore,
        matrix: SynergyCounterMatrix,
        predictor: PredictorState,
    ) -> Self {
        DraftEngine {
            classifier,
            store,
            matrix,
            predictor,
            diversity_cap: crate::config::DEFAULT_DIVERSITY_CAP,
            weights: RecommendationWeights::default(),
            default_limit: crate::config::DEFAULT_LIMIT,
            simulation_max_age_mins: crate::config::DEFAULT_SIMULATION_MAX_AGE_MINS,
            data_dir: PathBuf::new(),
            matrix_overrides: 0,
            matrix_issue: None,
            loaded_at: Utc::now(),
        }
    }

    pub fn predictor(&self) -> Result<&EnsemblePredictor, DraftError> {
        match &self.predictor {
            PredictorState::Ready(predictor) => Ok(predictor),
            PredictorState::Unavailable(reason) => {
                Err(DraftError::PredictorUnavailable(reason.clone()))
            }
        }
    }

    pub fn predictor_ready(&self) -> bool {
        matches!(self.predictor, PredictorState::Ready(_))
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.predictor {
            PredictorState::Ready(_) => None,
            PredictorState::Unavailable(reason) => Some(reason),
        }
    }

    /// Degradation notes every scoring response carries.
    pub fn data_notes(&self) -> Vec<String> {
        self.matrix_issue.iter().cloned().collect()
    }

    pub fn recommender(&self) -> RecommendationEngine<'_> {
        RecommendationEngine::new(&self.store, &self.matrix, self.predictor().ok())
            .with_weights(self.weights)
            .with_diversity_cap(self.diversity_cap)
    }

    pub fn ban_advisor(&self) -> BanAdvisor<'_> {
        BanAdvisor::new(&self.store, &self.matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{DraftState, Role, SlotRequest, Team};
    use std::fs;

    const CHAMPIONS: &str = r#"{"champions": [
        {"name": "Ahri", "positions": {"primary": "MIDDLE", "viable": ["MIDDLE"]},
         "class_tags": ["Burst"], "attributes": null}
    ]}"#;

    fn config(dir: &std::path::Path) -> Config {
        Config {
            data_dir: dir.to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn missing_models_degrade_instead_of_failing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CHAMPIONS_FILE), CHAMPIONS).unwrap();

        let engine = DraftEngine::load(&config(dir.path())).unwrap();
        assert!(!engine.predictor_ready());
        assert!(matches!(engine.predictor(), Err(DraftError::PredictorUnavailable(_))));
        assert_eq!(engine.store.len(), 1);
    }

    #[test]
    fn corrupted_models_degrade_instead_of_failing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CHAMPIONS_FILE), CHAMPIONS).unwrap();
        fs::write(dir.path().join(MODELS_FILE), "{\"feature_names\": [").unwrap();

        let engine = DraftEngine::load(&config(dir.path())).unwrap();
        assert!(engine.unavailable_reason().unwrap().contains("unusable"));
    }

    #[test]
    fn missing_champion_data_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(DraftEngine::load(&config(dir.path())).is_err());
    }

    #[test]
    fn corrupt_matrix_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CHAMPIONS_FILE), CHAMPIONS).unwrap();
        fs::write(dir.path().join(MATRIX_FILE), "not json").unwrap();

        let engine = DraftEngine::load(&config(dir.path())).unwrap();
        assert_eq!(engine.matrix, SynergyCounterMatrix::authored());
        assert_eq!(engine.matrix_overrides, 0);
        assert!(engine.matrix_issue.as_deref().unwrap().contains("authored defaults"));
        assert_eq!(engine.data_notes().len(), 1);
    }

    #[test]
    fn configured_weights_reach_the_recommender() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CHAMPIONS_FILE), CHAMPIONS).unwrap();
        let weights = RecommendationWeights {
            synergy: 0.0,
            counter: 0.0,
            role_fit: 2.0,
            projection: 0.0,
        };
        let engine = DraftEngine::load(&Config {
            weights,
            ..config(dir.path())
        })
        .unwrap();
        assert_eq!(engine.weights, weights);

        let slot = SlotRequest::new(Team::Blue, Some(Role::Middle));
        let pool: Vec<_> = engine.store.iter().collect();
        let recs = engine
            .recommender()
            .recommend(&DraftState::new(), &slot, &pool, 5)
            .unwrap();
        assert_eq!(recs[0].score, 2.0);
    }

    #[test]
    fn absent_matrix_is_not_an_issue() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CHAMPIONS_FILE), CHAMPIONS).unwrap();

        let engine = DraftEngine::load(&config(dir.path())).unwrap();
        assert!(engine.matrix_issue.is_none());
        assert!(engine.data_notes().is_empty());
    }

    #[test]
    fn rejected_override_cells_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CHAMPIONS_FILE), CHAMPIONS).unwrap();
        fs::write(
            dir.path().join(MATRIX_FILE),
            r#"{"synergy": [{"a": "marksman", "b": "enchanter", "score": 0.9},
                            {"a": "wizard", "b": "enchanter", "score": 0.2}]}"#,
        )
        .unwrap();

        let engine = DraftEngine::load(&config(dir.path())).unwrap();
        assert_eq!(engine.matrix_overrides, 1);
        let issue = engine.matrix_issue.unwrap();
        assert!(issue.contains("1 matrix override cell(s) skipped"));
        assert!(issue.contains("wizard/enchanter"));
    }
}
