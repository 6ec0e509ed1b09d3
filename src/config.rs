use crate::analysis::recommender::RecommendationWeights;
use crate::error::DraftError;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_LIMIT: usize = 5;
pub const MAX_LIMIT: usize = 20;
pub const DEFAULT_SECONDARY_THRESHOLD: f64 = 0.7;
pub const DEFAULT_DIVERSITY_CAP: usize = 2;
/// A cached simulation older than this is flagged stale in `status`.
pub const DEFAULT_SIMULATION_MAX_AGE_MINS: u64 = 24 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub default_limit: usize,
    pub secondary_threshold: f64,
    pub diversity_cap: usize,
    pub weights: RecommendationWeights,
    pub simulation_max_age_mins: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: default_data_dir(),
            default_limit: DEFAULT_LIMIT,
            secondary_threshold: DEFAULT_SECONDARY_THRESHOLD,
            diversity_cap: DEFAULT_DIVERSITY_CAP,
            weights: RecommendationWeights::default(),
            simulation_max_age_mins: DEFAULT_SIMULATION_MAX_AGE_MINS,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, DraftError> {
        dotenvy::dotenv().ok();

        let data_dir = env::var("DRAFT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_data_dir());

        let default_limit = parse_var("DRAFT_DEFAULT_LIMIT", DEFAULT_LIMIT)?.clamp(1, MAX_LIMIT);

        let secondary_threshold =
            parse_var("DRAFT_SECONDARY_THRESHOLD", DEFAULT_SECONDARY_THRESHOLD)?;
        if !(0.0..=1.0).contains(&secondary_threshold) {
            return Err(DraftError::ConfigError(format!(
                "DRAFT_SECONDARY_THRESHOLD must be within [0, 1], got {}",
                secondary_threshold
            )));
        }

        let diversity_cap = parse_var("DRAFT_DIVERSITY_CAP", DEFAULT_DIVERSITY_CAP)?;

        let defaults = RecommendationWeights::default();
        let weights = RecommendationWeights {
            synergy: parse_var("DRAFT_WEIGHT_SYNERGY", defaults.synergy)?,
            counter: parse_var("DRAFT_WEIGHT_COUNTER", defaults.counter)?,
            role_fit: parse_var("DRAFT_WEIGHT_ROLE_FIT", defaults.role_fit)?,
            projection: parse_var("DRAFT_WEIGHT_PROJECTION", defaults.projection)?,
        };
        if [weights.synergy, weights.counter, weights.role_fit, weights.projection]
            .iter()
            .any(|w| !w.is_finite() || *w < 0.0)
        {
            return Err(DraftError::ConfigError(
                "DRAFT_WEIGHT_* values must be finite and non-negative".to_string(),
            ));
        }

        let simulation_max_age_mins =
            parse_var("DRAFT_SIMULATION_MAX_AGE_MINS", DEFAULT_SIMULATION_MAX_AGE_MINS)?;

        Ok(Config {
            data_dir,
            default_limit,
            secondary_threshold,
            diversity_cap,
            weights,
            simulation_max_age_mins,
        })
    }

    /// Directory for persisted simulation summaries.
    pub fn state_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".draft_engine")
    }
}

fn default_data_dir() -> PathBuf {
    let local = PathBuf::from("data");
    if local.join("champions.json").exists() {
        return local;
    }
    Config::state_dir().join("data")
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> Result<T, DraftError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| {
            DraftError::ConfigError(format!("{} has an invalid value: {}", key, raw))
        }),
        Err(_) => Ok(default),
    }
}
