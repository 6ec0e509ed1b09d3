use crate::analysis::archetype::{Archetype, ArchetypeFamily};
use crate::analysis::classifier::{ArchetypeSource, Trapezoid};
use crate::analysis::composition::{CompositionType, DraftNeeds};
use crate::analysis::ensemble::{Agreement, ModelOutput, WinProjection};
use crate::analysis::recommender::{BanContext, BanMode, BanRecommendation, Recommendation};
use crate::analysis::store::{AttributeDimension, ChampionAttributes, DataQuality};
use crate::draft::{DraftState, Pick, Role, SlotRequest, Team};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Recommend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub draft: DraftState,
    /// Empty means one flex slot for the side on turn.
    #[serde(default)]
    pub slots: Vec<SlotRequest>,
    #[serde(default)]
    pub limit: Option<usize>,
    /// Restricts candidates to these names; absent means the full roster.
    #[serde(default)]
    pub candidate_pool: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotRecommendations {
    pub slot_id: String,
    pub team: Team,
    pub role: Option<Role>,
    pub recommendations: Vec<Recommendation>,
}

/// Blended projection for the draft as it stands.
#[derive(Debug, Clone, Serialize)]
pub struct WinProjectionSummary {
    pub blue: f64,
    pub red: f64,
    pub favored: Team,
    pub confidence: f64,
    pub notes: Vec<String>,
    pub degraded: bool,
}

impl From<&WinProjection> for WinProjectionSummary {
    fn from(projection: &WinProjection) -> Self {
        WinProjectionSummary {
            blue: projection.blue,
            red: projection.red,
            favored: projection.favored,
            confidence: projection.confidence,
            notes: projection.notes.clone(),
            degraded: projection.degraded,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DraftAnalysis {
    pub team: Team,
    pub our_picks: usize,
    pub enemy_picks: usize,
    pub our_archetypes: Vec<Archetype>,
    pub enemy_archetypes: Vec<Archetype>,
    #[serde(flatten)]
    pub needs: DraftNeeds,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendResponse {
    pub slots: Vec<SlotRecommendations>,
    /// Absent when the predictor is unavailable.
    pub win_projection: Option<WinProjectionSummary>,
    pub draft_analysis: DraftAnalysis,
    pub notes: Vec<String>,
}

// Analyze
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub blue: Vec<Pick>,
    pub red: Vec<Pick>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub winner: Team,
    pub confidence: f64,
    pub blue_win_probability: f64,
    pub red_win_probability: f64,
    pub agreement: Agreement,
    pub model_breakdown: Vec<ModelOutput>,
    pub degraded: bool,
}

impl From<&WinProjection> for Prediction {
    fn from(projection: &WinProjection) -> Self {
        Prediction {
            winner: projection.favored,
            confidence: projection.confidence,
            blue_win_probability: projection.blue,
            red_win_probability: projection.red,
            agreement: projection.agreement,
            model_breakdown: projection.model_breakdown.clone(),
            degraded: projection.degraded,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamAnalysis {
    pub champions: Vec<Pick>,
    pub archetypes: Vec<Archetype>,
    pub archetype_distribution: BTreeMap<String, usize>,
    pub composition_type: CompositionType,
    pub synergy_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    pub prediction: Prediction,
    pub blue: TeamAnalysis,
    pub red: TeamAnalysis,
    pub insights: Vec<String>,
    pub notes: Vec<String>,
}

// Bans
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BansRequest {
    #[serde(default)]
    pub draft: DraftState,
    pub team: Team,
    #[serde(default)]
    pub mode: BanMode,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BansResponse {
    pub team: Team,
    #[serde(flatten)]
    pub context: BanContext,
    pub bans: Vec<BanRecommendation>,
}

// Lookup
#[derive(Debug, Clone, Serialize)]
pub struct ChampionResponse {
    pub name: String,
    pub primary_archetype: Archetype,
    pub secondary_archetypes: Vec<Archetype>,
    pub archetype_source: ArchetypeSource,
    pub membership: BTreeMap<String, f64>,
    pub data_quality: DataQuality,
    pub reduced_confidence: bool,
    pub primary_role: Option<Role>,
    pub viable_roles: Vec<Role>,
    pub class_tags: Vec<String>,
    pub attributes: ChampionAttributes,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CriterionInfo {
    pub dimension: AttributeDimension,
    #[serde(flatten)]
    pub shape: Trapezoid,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchetypeInfo {
    pub archetype: Archetype,
    pub label: String,
    pub family: ArchetypeFamily,
    pub priority: usize,
    pub description: String,
    pub criteria: Vec<CriterionInfo>,
    /// Champions whose primary archetype this is.
    pub champions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchetypeCatalog {
    pub secondary_threshold: f64,
    pub archetypes: Vec<ArchetypeInfo>,
}

// Status
#[derive(Debug, Clone, Serialize)]
pub struct SimulationDigest {
    pub games: usize,
    pub seed: u64,
    pub blue_win_rate: f64,
    pub generated_at: DateTime<Utc>,
    /// Older than the configured maximum age.
    pub stale: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub champions: usize,
    pub complete: usize,
    pub partial: usize,
    pub missing: usize,
    pub predictor_ready: bool,
    pub predictor_reason: Option<String>,
    pub models: Vec<String>,
    pub feature_count: usize,
    pub matrix_overrides: usize,
    /// Present when `matrix.json` was unusable or had rejected cells.
    pub matrix_issue: Option<String>,
    pub data_dir: String,
    pub loaded_at: DateTime<Utc>,
    pub last_simulation: Option<SimulationDigest>,
}
