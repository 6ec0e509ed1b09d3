//! Confidence-weighted blend of three trained win classifiers.
//!
//! Each model is loaded from `models.json` and sees the match through the
//! feature list it was trained on. The blend weights every output by the
//! model's historical accuracy times how far it sits from a coin flip.

use super::features::{FeatureIndex, MatchFeatures, RosterEntry};
use super::matrix::SynergyCounterMatrix;
use super::store::DataQuality;
use crate::draft::Team;
use crate::error::DraftError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// P(blue wins) for one extracted match.
pub trait WinClassifier: Send + Sync {
    fn name(&self) -> &str;

    fn historical_accuracy(&self) -> f64;

    fn predict_blue(&self, features: &[f64]) -> f64;

    /// Rejects parameters that cannot be evaluated against `n_features` inputs.
    fn validate(&self, n_features: usize) -> Result<(), DraftError>;
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn logit(p: f64) -> f64 {
    let p = p.clamp(1e-9, 1.0 - 1e-9);
    (p / (1.0 - p)).ln()
}

fn check_accuracy(name: &str, accuracy: f64) -> Result<(), DraftError> {
    if !(0.0..=1.0).contains(&accuracy) {
        return Err(DraftError::DataError(format!(
            "{}: historical accuracy {} outside [0, 1]",
            name, accuracy
        )));
    }
    Ok(())
}

pub struct LogisticModel {
    pub name: String,
    pub historical_accuracy: f64,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl WinClassifier for LogisticModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn historical_accuracy(&self) -> f64 {
        self.historical_accuracy
    }

    fn predict_blue(&self, features: &[f64]) -> f64 {
        let z: f64 = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;
        sigmoid(z)
    }

    fn validate(&self, n_features: usize) -> Result<(), DraftError> {
        check_accuracy(&self.name, self.historical_accuracy)?;
        if self.coefficients.len() != n_features {
            return Err(DraftError::DataError(format!(
                "{}: {} coefficients for {} features",
                self.name,
                self.coefficients.len(),
                n_features
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Flat binary tree rooted at node 0. `x[feature] <= threshold` goes left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        let mut current = 0;
        // Validated trees only point forward, so this terminates within
        // nodes.len() steps.
        for _ in 0..self.nodes.len() {
            match self.nodes.get(current) {
                Some(TreeNode::Leaf { value }) => return *value,
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = features.get(*feature).copied().unwrap_or(0.0);
                    current = if x <= *threshold { *left } else { *right };
                }
                None => break,
            }
        }
        0.0
    }

    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("empty tree".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                threshold,
            } = node
            {
                if *feature >= n_features {
                    return Err(format!("node {} reads feature {} of {}", i, feature, n_features));
                }
                if !threshold.is_finite() {
                    return Err(format!("node {} has a non-finite threshold", i));
                }
                for child in [*left, *right] {
                    if child <= i || child >= self.nodes.len() {
                        return Err(format!("node {} has invalid child {}", i, child));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Leaves hold P(blue wins); the forest averages its trees.
pub struct RandomForestModel {
    pub name: String,
    pub historical_accuracy: f64,
    pub trees: Vec<DecisionTree>,
}

impl WinClassifier for RandomForestModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn historical_accuracy(&self) -> f64 {
        self.historical_accuracy
    }

    fn predict_blue(&self, features: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let total: f64 = self.trees.iter().map(|t| t.evaluate(features)).sum();
        (total / self.trees.len() as f64).clamp(0.0, 1.0)
    }

    fn validate(&self, n_features: usize) -> Result<(), DraftError> {
        check_accuracy(&self.name, self.historical_accuracy)?;
        if self.trees.is_empty() {
            return Err(DraftError::DataError(format!("{}: no trees", self.name)));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(n_features)
                .map_err(|e| DraftError::DataError(format!("{} tree {}: {}", self.name, i, e)))?;
        }
        Ok(())
    }
}

/// Leaves hold additive log-odds; output is `sigmoid(init + lr * sum)`.
pub struct GradientBoostingModel {
    pub name: String,
    pub historical_accuracy: f64,
    pub init: f64,
    pub learning_rate: f64,
    pub trees: Vec<DecisionTree>,
}

impl WinClassifier for GradientBoostingModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn historical_accuracy(&self) -> f64 {
        self.historical_accuracy
    }

    fn predict_blue(&self, features: &[f64]) -> f64 {
        let raw: f64 = self.trees.iter().map(|t| t.evaluate(features)).sum();
        sigmoid(self.init + self.learning_rate * raw)
    }

    fn validate(&self, n_features: usize) -> Result<(), DraftError> {
        check_accuracy(&self.name, self.historical_accuracy)?;
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(n_features)
                .map_err(|e| DraftError::DataError(format!("{} tree {}: {}", self.name, i, e)))?;
        }
        Ok(())
    }
}

/// One entry of `models.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    Logistic {
        name: String,
        historical_accuracy: f64,
        coefficients: Vec<f64>,
        #[serde(default)]
        intercept: f64,
    },
    RandomForest {
        name: String,
        historical_accuracy: f64,
        trees: Vec<DecisionTree>,
    },
    GradientBoosting {
        name: String,
        historical_accuracy: f64,
        #[serde(default)]
        init: f64,
        learning_rate: f64,
        trees: Vec<DecisionTree>,
    },
}

impl ModelSpec {
    pub fn build(self) -> Box<dyn WinClassifier> {
        match self {
            ModelSpec::Logistic {
                name,
                historical_accuracy,
                coefficients,
                intercept,
            } => Box::new(LogisticModel {
                name,
                historical_accuracy,
                coefficients,
                intercept,
            }),
            ModelSpec::RandomForest {
                name,
                historical_accuracy,
                trees,
            } => Box::new(RandomForestModel {
                name,
                historical_accuracy,
                trees,
            }),
            ModelSpec::GradientBoosting {
                name,
                historical_accuracy,
                init,
                learning_rate,
                trees,
            } => Box::new(GradientBoostingModel {
                name,
                historical_accuracy,
                init,
                learning_rate,
                trees,
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Calibration {
    #[serde(default)]
    pub logit_shift: f64,
}

/// Shape of `models.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    pub feature_names: Vec<String>,
    pub models: Vec<ModelSpec>,
    #[serde(default)]
    pub calibration: Calibration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Agreement {
    Unanimous,
    Majority,
    Split,
}

impl Agreement {
    pub fn note(self) -> &'static str {
        match self {
            Agreement::Unanimous => "All models agree on outcome (strong consensus)",
            Agreement::Majority => "Model majority agrees (moderate consensus)",
            Agreement::Split => "Models are split (low confidence, close matchup)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelOutput {
    pub model: String,
    pub blue_probability: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinProjection {
    pub blue: f64,
    pub red: f64,
    pub favored: Team,
    pub confidence: f64,
    pub agreement: Agreement,
    pub model_breakdown: Vec<ModelOutput>,
    pub notes: Vec<String>,
    /// Set when any rostered champion lacks complete attribute data.
    pub degraded: bool,
}

impl WinProjection {
    pub fn team_probability(&self, team: Team) -> f64 {
        match team {
            Team::Blue => self.blue,
            Team::Red => self.red,
        }
    }
}

/// `Σ(p_i · w_i) / Σ w_i` with `w_i = accuracy_i · |p_i − 0.5| · 2`.
/// Returns 0.5 when every weight is zero.
pub fn blend(outputs: &[(f64, f64)]) -> f64 {
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (probability, accuracy) in outputs {
        let weight = accuracy * (probability - 0.5).abs() * 2.0;
        numerator += probability * weight;
        denominator += weight;
    }
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.5
    }
}

pub struct EnsemblePredictor {
    index: FeatureIndex,
    models: Vec<Box<dyn WinClassifier>>,
    logit_shift: f64,
}

impl std::fmt::Debug for EnsemblePredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnsemblePredictor")
            .field("features", &self.index.len())
            .field("models", &self.model_names())
            .field("logit_shift", &self.logit_shift)
            .finish()
    }
}

impl EnsemblePredictor {
    pub fn new(
        index: FeatureIndex,
        models: Vec<Box<dyn WinClassifier>>,
        logit_shift: f64,
    ) -> Result<Self, DraftError> {
        if models.is_empty() {
            return Err(DraftError::DataError("model bundle has no models".to_string()));
        }
        for model in &models {
            model.validate(index.len())?;
        }
        if !logit_shift.is_finite() {
            return Err(DraftError::DataError("non-finite calibration shift".to_string()));
        }
        Ok(EnsemblePredictor {
            index,
            models,
            logit_shift,
        })
    }

    pub fn from_bundle(bundle: ModelBundle) -> Result<Self, DraftError> {
        let index = FeatureIndex::resolve(&bundle.feature_names)?;
        let models = bundle.models.into_iter().map(ModelSpec::build).collect();
        Self::new(index, models, bundle.calibration.logit_shift)
    }

    pub fn load(path: &Path) -> Result<Self, DraftError> {
        let content = fs::read_to_string(path).map_err(|e| {
            DraftError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let bundle: ModelBundle = serde_json::from_str(&content).map_err(|e| {
            DraftError::JsonError(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        let predictor = Self::from_bundle(bundle)?;
        info!(
            models = ?predictor.model_names(),
            features = predictor.index.len(),
            "win models loaded"
        );
        Ok(predictor)
    }

    pub fn model_names(&self) -> Vec<String> {
        self.models.iter().map(|m| m.name().to_string()).collect()
    }

    pub fn feature_count(&self) -> usize {
        self.index.len()
    }

    /// Rosters may hold 0..=5 entries each; empty slots are neutral.
    pub fn predict(
        &self,
        blue: &[RosterEntry<'_>],
        red: &[RosterEntry<'_>],
        matrix: &SynergyCounterMatrix,
    ) -> WinProjection {
        let features = MatchFeatures::extract(blue, red, matrix);
        let vector = self.index.vectorize(&features);

        let mut raw = Vec::with_capacity(self.models.len());
        let mut model_breakdown = Vec::with_capacity(self.models.len());
        for model in &self.models {
            let p = model.predict_blue(&vector);
            let p = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.5 };
            let weight = model.historical_accuracy() * (p - 0.5).abs() * 2.0;
            raw.push((p, model.historical_accuracy()));
            model_breakdown.push(ModelOutput {
                model: model.name().to_string(),
                blue_probability: p,
                weight,
            });
        }

        let mut blue_probability = blend(&raw);
        if self.logit_shift != 0.0 {
            blue_probability = sigmoid(logit(blue_probability) + self.logit_shift);
        }
        let red_probability = 1.0 - blue_probability;
        let favored = if blue_probability >= 0.5 { Team::Blue } else { Team::Red };

        let agreement = agreement(&raw, favored);

        let mut notes = vec![agreement.note().to_string()];
        let mut degraded = false;
        for (team, roster) in [(Team::Blue, blue), (Team::Red, red)] {
            for entry in roster {
                match entry.champion.quality {
                    DataQuality::Missing => {
                        degraded = true;
                        notes.push(format!(
                            "{} ({}) has no attribute data; neutral contribution used",
                            entry.champion.name, team
                        ));
                    }
                    DataQuality::Partial => {
                        degraded = true;
                        notes.push(format!(
                            "{} ({}) has incomplete attribute data; reduced confidence",
                            entry.champion.name, team
                        ));
                    }
                    DataQuality::Complete => {}
                }
            }
        }

        debug!(blue = blue_probability, ?agreement, degraded, "match projected");

        WinProjection {
            blue: blue_probability,
            red: red_probability,
            favored,
            confidence: blue_probability.max(red_probability),
            agreement,
            model_breakdown,
            notes,
            degraded,
        }
    }
}

/// Models sitting exactly on 0.5 abstain. Only decisive votes count, and a
/// favored side that no decisive model backs is a split.
fn agreement(raw: &[(f64, f64)], favored: Team) -> Agreement {
    let decisive: Vec<bool> = raw
        .iter()
        .filter(|(p, _)| *p != 0.5)
        .map(|(p, _)| *p > 0.5)
        .collect();
    let backing = decisive
        .iter()
        .filter(|blue| **blue == (favored == Team::Blue))
        .count();

    if backing == 0 {
        Agreement::Split
    } else if backing == decisive.len() {
        Agreement::Unanimous
    } else if backing * 2 > decisive.len() {
        Agreement::Majority
    } else {
        Agreement::Split
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::features::team_feature_names;

    struct Fixed(&'static str, f64, f64);

    impl WinClassifier for Fixed {
        fn name(&self) -> &str {
            self.0
        }
        fn historical_accuracy(&self) -> f64 {
            self.1
        }
        fn predict_blue(&self, _features: &[f64]) -> f64 {
            self.2
        }
        fn validate(&self, _n_features: usize) -> Result<(), DraftError> {
            Ok(())
        }
    }

    fn index() -> FeatureIndex {
        FeatureIndex::resolve(&["diff.agg_filled".to_string()]).unwrap()
    }

    fn fixed(outputs: &[f64]) -> EnsemblePredictor {
        let names = ["logistic", "random_forest", "gradient_boosting"];
        let models: Vec<Box<dyn WinClassifier>> = outputs
            .iter()
            .zip(names)
            .map(|(p, n)| Box::new(Fixed(n, 0.5, *p)) as Box<dyn WinClassifier>)
            .collect();
        EnsemblePredictor::new(index(), models, 0.0).unwrap()
    }

    #[test]
    fn blend_weights_decisive_models() {
        // 0.9 carries weight 0.8 * acc, 0.5 carries none.
        let p = blend(&[(0.9, 0.5), (0.5, 0.5)]);
        assert!((p - 0.9).abs() < 1e-12);

        let p = blend(&[(0.8, 0.5), (0.3, 0.5)]);
        let w1 = 0.5 * 0.6;
        let w2 = 0.5 * 0.4;
        assert!((p - (0.8 * w1 + 0.3 * w2) / (w1 + w2)).abs() < 1e-12);
    }

    #[test]
    fn blend_of_coin_flips_is_even() {
        assert_eq!(blend(&[(0.5, 0.6), (0.5, 0.5)]), 0.5);
        assert_eq!(blend(&[]), 0.5);
    }

    #[test]
    fn probabilities_sum_to_one_and_tie_favors_blue() {
        let matrix = SynergyCounterMatrix::authored();
        let projection = fixed(&[0.5, 0.5, 0.5]).predict(&[], &[], &matrix);
        assert_eq!(projection.blue, 0.5);
        assert_eq!(projection.favored, Team::Blue);
        assert!((projection.blue + projection.red - 1.0).abs() < 1e-12);
        assert!(!projection.degraded);
    }

    #[test]
    fn consensus_notes() {
        let matrix = SynergyCounterMatrix::authored();
        let unanimous = fixed(&[0.7, 0.6, 0.8]).predict(&[], &[], &matrix);
        assert_eq!(unanimous.agreement, Agreement::Unanimous);
        assert_eq!(unanimous.notes[0], "All models agree on outcome (strong consensus)");

        let majority = fixed(&[0.7, 0.6, 0.4]).predict(&[], &[], &matrix);
        assert_eq!(majority.agreement, Agreement::Majority);
        assert_eq!(majority.favored, Team::Blue);
        assert_eq!(majority.confidence, majority.blue);
    }

    #[test]
    fn even_model_abstains_from_the_vote() {
        let matrix = SynergyCounterMatrix::authored();
        let projection = fixed(&[0.7, 0.6, 0.5]).predict(&[], &[], &matrix);
        assert_eq!(projection.favored, Team::Blue);
        assert_eq!(projection.agreement, Agreement::Unanimous);

        let projection = fixed(&[0.3, 0.5, 0.5]).predict(&[], &[], &matrix);
        assert_eq!(projection.favored, Team::Red);
        assert_eq!(projection.agreement, Agreement::Unanimous);

        let projection = fixed(&[0.5, 0.5, 0.5]).predict(&[], &[], &matrix);
        assert_eq!(projection.agreement, Agreement::Split);
    }

    #[test]
    fn calibration_against_every_model_is_a_split() {
        let matrix = SynergyCounterMatrix::authored();
        let models: Vec<Box<dyn WinClassifier>> = vec![
            Box::new(Fixed("logistic", 0.5, 0.55)),
            Box::new(Fixed("random_forest", 0.5, 0.6)),
        ];
        let shifted = EnsemblePredictor::new(index(), models, -2.0).unwrap();
        let projection = shifted.predict(&[], &[], &matrix);

        assert_eq!(projection.favored, Team::Red);
        assert_eq!(projection.agreement, Agreement::Split);
        assert_eq!(projection.notes[0], Agreement::Split.note());
    }

    #[test]
    fn calibration_shift_moves_probability() {
        let matrix = SynergyCounterMatrix::authored();
        let models: Vec<Box<dyn WinClassifier>> = vec![Box::new(Fixed("m", 0.5, 0.6))];
        let shifted = EnsemblePredictor::new(index(), models, -1.0).unwrap();
        let projection = shifted.predict(&[], &[], &matrix);
        assert!(projection.blue < 0.6);
        assert!((projection.blue + projection.red - 1.0).abs() < 1e-12);
    }

    #[test]
    fn tree_follows_thresholds() {
        let tree = DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold: 0.0,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: 0.3 },
                TreeNode::Leaf { value: 0.7 },
            ],
        };
        assert_eq!(tree.evaluate(&[-0.2]), 0.3);
        assert_eq!(tree.evaluate(&[0.2]), 0.7);
        assert!(tree.validate(1).is_ok());
        assert!(tree.validate(0).is_err());
    }

    #[test]
    fn backward_pointing_tree_is_rejected() {
        let tree = DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold: 0.0,
                    left: 0,
                    right: 1,
                },
                TreeNode::Leaf { value: 0.5 },
            ],
        };
        assert!(tree.validate(1).is_err());
    }

    #[test]
    fn bundle_with_unknown_feature_is_rejected() {
        let json = r#"{
            "feature_names": ["diff.not_a_feature"],
            "models": [{"kind": "logistic", "name": "lr", "historical_accuracy": 0.54,
                        "coefficients": [1.0]}]
        }"#;
        let bundle: ModelBundle = serde_json::from_str(json).unwrap();
        assert!(EnsemblePredictor::from_bundle(bundle).is_err());
    }

    #[test]
    fn bundle_parses_all_three_kinds() {
        let feature = format!("diff.{}", team_feature_names()[0]);
        let json = format!(
            r#"{{
            "feature_names": ["{f}"],
            "models": [
              {{"kind": "logistic", "name": "lr", "historical_accuracy": 0.543,
                "coefficients": [2.0], "intercept": 0.0}},
              {{"kind": "random_forest", "name": "rf", "historical_accuracy": 0.505,
                "trees": [{{"nodes": [{{"value": 0.5}}]}}]}},
              {{"kind": "gradient_boosting", "name": "gb", "historical_accuracy": 0.5,
                "learning_rate": 0.1, "trees": [{{"nodes": [{{"value": 0.0}}]}}]}}
            ],
            "calibration": {{"logit_shift": 0.0}}
        }}"#,
            f = feature
        );
        let bundle: ModelBundle = serde_json::from_str(&json).unwrap();
        let predictor = EnsemblePredictor::from_bundle(bundle).unwrap();
        assert_eq!(predictor.model_names(), vec!["lr", "rf", "gb"]);
        assert_eq!(predictor.feature_count(), 1);
    }
}
