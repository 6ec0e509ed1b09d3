//! Request handling over a swappable engine snapshot.
//!
//! Every request clones the current `Arc<DraftEngine>` and works on that
//! snapshot only. A reload builds a whole new engine and swaps the pointer,
//! so readers never observe a half-loaded state.

use super::models::*;
use crate::analysis::composition::{match_insights, DraftNeeds, TeamComposition};
use crate::analysis::recommender::resolve_draft;
use crate::analysis::simulation::{self, SimulationSummary};
use crate::analysis::store::{Champion, DataQuality};
use crate::cache::SimulationCache;
use crate::config::{Config, MAX_LIMIT};
use crate::draft::{DraftState, Pick, SlotRequest, Team, MAX_PICKS};
use crate::engine::DraftEngine;
use crate::error::DraftError;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

pub struct EngineHandle {
    current: RwLock<Arc<DraftEngine>>,
}

impl EngineHandle {
    pub fn new(engine: DraftEngine) -> Self {
        EngineHandle {
            current: RwLock::new(Arc::new(engine)),
        }
    }

    pub fn snapshot(&self) -> Arc<DraftEngine> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Replaces the whole engine. In-flight requests keep their snapshot.
    pub fn swap(&self, engine: DraftEngine) {
        let engine = Arc::new(engine);
        match self.current.write() {
            Ok(mut guard) => *guard = engine,
            Err(poisoned) => *poisoned.into_inner() = engine,
        }
    }
}

pub struct DraftService {
    handle: EngineHandle,
    state_dir: PathBuf,
}

fn clamp_limit(requested: Option<usize>, default: usize) -> usize {
    requested.unwrap_or(default).clamp(1, MAX_LIMIT)
}

impl DraftService {
    pub fn new(engine: DraftEngine, state_dir: PathBuf) -> Self {
        DraftService {
            handle: EngineHandle::new(engine),
            state_dir,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, DraftError> {
        Ok(Self::new(DraftEngine::load(config)?, Config::state_dir()))
    }

    pub fn engine(&self) -> Arc<DraftEngine> {
        self.handle.snapshot()
    }

    /// Loads fresh data and swaps it in. On failure the current engine stays.
    pub fn reload(&self, config: &Config) -> Result<(), DraftError> {
        let engine = DraftEngine::load(config)?;
        self.handle.swap(engine);
        info!("engine reloaded");
        Ok(())
    }

    pub fn recommend(&self, request: &RecommendRequest) -> Result<RecommendResponse, DraftError> {
        let engine = self.engine();
        let resolved = resolve_draft(&engine.store, &request.draft)?;
        let limit = clamp_limit(request.limit, engine.default_limit);

        let pool: Vec<&Champion> = match &request.candidate_pool {
            Some(names) => names
                .iter()
                .map(|name| engine.store.resolve(name))
                .collect::<Result<_, _>>()?,
            None => engine.store.iter().collect(),
        };

        let slots = if request.slots.is_empty() {
            vec![SlotRequest::new(request.draft.next_pick, None)]
        } else {
            request.slots.clone()
        };

        let recommender = engine.recommender();
        let mut results = Vec::with_capacity(slots.len());
        for slot in &slots {
            let recommendations = recommender.recommend(&request.draft, slot, &pool, limit)?;
            results.push(SlotRecommendations {
                slot_id: slot.slot_id.clone(),
                team: slot.team,
                role: slot.role,
                recommendations,
            });
        }

        let mut notes = engine.data_notes();
        let win_projection = match engine.predictor() {
            Ok(predictor) => {
                let projection = predictor.predict(&resolved.blue, &resolved.red, &engine.matrix);
                let mut summary = WinProjectionSummary::from(&projection);
                summary.degraded |= engine.matrix_issue.is_some();
                Some(summary)
            }
            Err(e) => {
                warn!(error = %e, "recommend served without win projection");
                notes.push(e.to_string());
                None
            }
        };

        let team = slots.first().map(|s| s.team).unwrap_or(request.draft.next_pick);
        let ours = resolved.archetypes(team);
        let theirs = resolved.archetypes(team.opponent());
        let draft_analysis = DraftAnalysis {
            team,
            our_picks: ours.len(),
            enemy_picks: theirs.len(),
            needs: DraftNeeds::assess(&ours, &theirs),
            our_archetypes: ours,
            enemy_archetypes: theirs,
        };

        Ok(RecommendResponse {
            slots: results,
            win_projection,
            draft_analysis,
            notes,
        })
    }

    /// Both rosters must be complete: five picks, one per role.
    pub fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalyzeResponse, DraftError> {
        let engine = self.engine();

        for (team, picks) in [(Team::Blue, &request.blue), (Team::Red, &request.red)] {
            if picks.len() != MAX_PICKS {
                return Err(DraftError::InvalidDraft(format!(
                    "{} roster has {} champions; analysis needs {}",
                    team,
                    picks.len(),
                    MAX_PICKS
                )));
            }
        }
        let mut draft = DraftState::new();
        draft.blue.picks = request.blue.clone();
        draft.red.picks = request.red.clone();
        let resolved = resolve_draft(&engine.store, &draft)?;

        let predictor = engine.predictor()?;
        let projection = predictor.predict(&resolved.blue, &resolved.red, &engine.matrix);

        let blue_champs: Vec<&Champion> = resolved.blue.iter().map(|e| e.champion).collect();
        let red_champs: Vec<&Champion> = resolved.red.iter().map(|e| e.champion).collect();
        let blue_comp = TeamComposition::analyze(&blue_champs, &engine.matrix);
        let red_comp = TeamComposition::analyze(&red_champs, &engine.matrix);

        let insights = match_insights(
            (blue_champs.as_slice(), &blue_comp),
            (red_champs.as_slice(), &red_comp),
            &projection,
        );

        let team_analysis = |picks: &[Pick], comp: TeamComposition| TeamAnalysis {
            champions: picks.to_vec(),
            archetypes: comp.archetypes,
            archetype_distribution: comp.archetype_distribution,
            composition_type: comp.composition_type,
            synergy_score: comp.synergy_score,
        };

        let mut prediction = Prediction::from(&projection);
        prediction.degraded |= engine.matrix_issue.is_some();
        let mut notes = projection.notes.clone();
        notes.extend(engine.data_notes());

        Ok(AnalyzeResponse {
            prediction,
            blue: team_analysis(&request.blue, blue_comp),
            red: team_analysis(&request.red, red_comp),
            insights,
            notes,
        })
    }

    pub fn bans(&self, request: &BansRequest) -> Result<BansResponse, DraftError> {
        let engine = self.engine();
        let limit = clamp_limit(request.limit, engine.default_limit);
        let plan = engine
            .ban_advisor()
            .recommend(&request.draft, request.team, request.mode, limit)?;
        Ok(BansResponse {
            team: request.team,
            context: plan.context,
            bans: plan.bans,
        })
    }

    pub fn champion(&self, name: &str) -> Result<ChampionResponse, DraftError> {
        let engine = self.engine();
        let champion = engine.store.resolve(name)?;

        Ok(ChampionResponse {
            name: champion.name.clone(),
            primary_archetype: champion.primary_archetype,
            secondary_archetypes: champion.secondary_archetypes.clone(),
            archetype_source: champion.archetype_source,
            membership: champion
                .membership
                .iter()
                .map(|(archetype, score)| (archetype.key().to_string(), *score))
                .collect(),
            data_quality: champion.quality,
            reduced_confidence: champion.reduced_confidence,
            primary_role: champion.primary_role,
            viable_roles: champion.viable_roles.clone(),
            class_tags: champion.class_tags.clone(),
            attributes: champion.attributes.clone(),
            tags: champion.tags.iter().map(|t| t.key().to_string()).collect(),
        })
    }

    pub fn archetypes(&self) -> ArchetypeCatalog {
        let engine = self.engine();
        let archetypes = crate::analysis::archetype::Archetype::PRIORITY
            .iter()
            .map(|archetype| {
                let criteria = engine
                    .classifier
                    .definition(*archetype)
                    .map(|definition| {
                        definition
                            .criteria
                            .iter()
                            .map(|c| CriterionInfo {
                                dimension: c.dimension,
                                shape: c.shape,
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                ArchetypeInfo {
                    archetype: *archetype,
                    label: archetype.label(),
                    family: archetype.family(),
                    priority: archetype.priority(),
                    description: archetype.description().to_string(),
                    criteria,
                    champions: engine
                        .store
                        .iter()
                        .filter(|c| c.primary_archetype == *archetype)
                        .map(|c| c.name.clone())
                        .collect(),
                }
            })
            .collect();

        ArchetypeCatalog {
            secondary_threshold: engine.classifier.secondary_threshold(),
            archetypes,
        }
    }

    /// Runs a seeded simulation and records the summary in the cache.
    pub fn simulate(
        &self,
        games: usize,
        seed: u64,
        on_game: impl FnMut(usize),
    ) -> Result<SimulationSummary, DraftError> {
        let engine = self.engine();
        let predictor = engine.predictor()?;
        let summary =
            simulation::simulate(&engine.store, &engine.matrix, predictor, games, seed, on_game)?;

        let mut cache = SimulationCache::load(&self.state_dir).unwrap_or_else(|e| {
            warn!(error = %e, "discarding unreadable simulation cache");
            SimulationCache::new()
        });
        cache.add_run(summary.clone());
        cache.save(&self.state_dir)?;

        Ok(summary)
    }

    pub fn status(&self) -> StatusResponse {
        let engine = self.engine();
        let (models, feature_count) = match engine.predictor() {
            Ok(predictor) => (predictor.model_names(), predictor.feature_count()),
            Err(_) => (Vec::new(), 0),
        };
        let last_simulation = SimulationCache::load(&self.state_dir)
            .ok()
            .and_then(|cache| {
                let stale = cache.is_stale(engine.simulation_max_age_mins);
                cache.latest().map(|run| SimulationDigest {
                    games: run.games,
                    seed: run.seed,
                    blue_win_rate: run.blue_win_rate(),
                    generated_at: run.generated_at,
                    stale,
                })
            });

        StatusResponse {
            champions: engine.store.len(),
            complete: engine.store.count_by_quality(DataQuality::Complete),
            partial: engine.store.count_by_quality(DataQuality::Partial),
            missing: engine.store.count_by_quality(DataQuality::Missing),
            predictor_ready: engine.predictor_ready(),
            predictor_reason: engine.unavailable_reason().map(str::to_string),
            models,
            feature_count,
            matrix_overrides: engine.matrix_overrides,
            matrix_issue: engine.matrix_issue.clone(),
            data_dir: engine.data_dir.display().to_string(),
            loaded_at: engine.loaded_at,
            last_simulation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::classifier::ArchetypeClassifier;
    use crate::analysis::matrix::SynergyCounterMatrix;
    use crate::analysis::store::{AttributeStore, ChampionRecord, Positions};
    use crate::draft::Role;
    use crate::engine::PredictorState;

    fn engine(names: &[(&str, Role)]) -> DraftEngine {
        let classifier = ArchetypeClassifier::standard(0.7);
        let records = names
            .iter()
            .map(|(name, role)| ChampionRecord {
                name: name.to_string(),
                positions: Positions {
                    primary: Some(*role),
                    viable: vec![*role],
                },
                class_tags: vec!["Specialist".to_string()],
                attributes: None,
            })
            .collect();
        let store = AttributeStore::from_records(records, &classifier).unwrap();
        DraftEngine::from_parts(
            classifier,
            store,
            SynergyCounterMatrix::authored(),
            PredictorState::Unavailable("no models".into()),
        )
    }

    #[test]
    fn swap_replaces_whole_engine_for_new_snapshots() {
        let service = DraftService::new(engine(&[("Ahri", Role::Middle)]), PathBuf::from("."));
        let before = service.engine();
        service.handle.swap(engine(&[("Ahri", Role::Middle), ("Zed", Role::Middle)]));

        assert_eq!(before.store.len(), 1);
        assert_eq!(service.engine().store.len(), 2);
    }

    #[test]
    fn recommend_degrades_without_predictor() {
        let service = DraftService::new(engine(&[("Ahri", Role::Middle)]), PathBuf::from("."));
        let request = RecommendRequest {
            slots: vec![SlotRequest::new(Team::Blue, Some(Role::Middle))],
            ..Default::default()
        };
        let response = service.recommend(&request).unwrap();
        assert!(response.win_projection.is_none());
        assert_eq!(response.notes.len(), 1);
        assert_eq!(response.slots[0].recommendations.len(), 1);
    }

    #[test]
    fn analyze_requires_predictor() {
        let names = [
            ("A", Role::Top),
            ("B", Role::Jungle),
            ("C", Role::Middle),
            ("D", Role::Bottom),
            ("E", Role::Utility),
            ("F", Role::Top),
            ("G", Role::Jungle),
            ("H", Role::Middle),
            ("I", Role::Bottom),
            ("J", Role::Utility),
        ];
        let service = DraftService::new(engine(&names), PathBuf::from("."));
        let picks = |offset: usize| -> Vec<Pick> {
            names[offset..offset + 5]
                .iter()
                .map(|(n, r)| Pick::new(*n, *r))
                .collect()
        };
        let request = AnalyzeRequest {
            blue: picks(0),
            red: picks(5),
        };
        assert!(matches!(
            service.analyze(&request),
            Err(DraftError::PredictorUnavailable(_))
        ));

        let short = AnalyzeRequest {
            blue: picks(0)[..4].to_vec(),
            red: picks(5),
        };
        assert!(matches!(service.analyze(&short), Err(DraftError::InvalidDraft(_))));
    }

    #[test]
    fn unknown_pool_name_is_rejected() {
        let service = DraftService::new(engine(&[("Ahri", Role::Middle)]), PathBuf::from("."));
        let request = RecommendRequest {
            candidate_pool: Some(vec!["Ahri".into(), "Ahrii".into()]),
            ..Default::default()
        };
        assert!(matches!(
            service.recommend(&request),
            Err(DraftError::UnknownChampion(_))
        ));
        assert!(service.champion("ahri").is_ok());
        assert!(service.champion("nobody").is_err());
    }

    #[test]
    fn matrix_issue_is_reported_in_payloads() {
        let mut degraded = engine(&[("Ahri", Role::Middle)]);
        degraded.matrix_issue = Some("matrix overrides unusable".into());
        let service = DraftService::new(degraded, PathBuf::from("."));

        let response = service.recommend(&RecommendRequest::default()).unwrap();
        assert!(response.notes.iter().any(|n| n.contains("matrix overrides unusable")));

        let status = service.status();
        assert_eq!(status.matrix_issue.as_deref(), Some("matrix overrides unusable"));

        let clean = DraftService::new(engine(&[("Ahri", Role::Middle)]), PathBuf::from("."));
        assert!(clean.status().matrix_issue.is_none());
    }

    #[test]
    fn old_simulation_digest_is_flagged_stale() {
        let state = tempfile::tempdir().unwrap();
        let run = SimulationSummary {
            games: 10,
            seed: 3,
            blue_wins: 6,
            average_blue_probability: 0.55,
            average_confidence: 0.6,
            compositions: Default::default(),
            matchups: Default::default(),
            generated_at: chrono::Utc::now(),
        };
        let mut cache = SimulationCache::new();
        cache.add_run(run);
        cache.save(state.path()).unwrap();

        let mut fresh_engine = engine(&[("Ahri", Role::Middle)]);
        fresh_engine.simulation_max_age_mins = 60;
        let service = DraftService::new(fresh_engine, state.path().to_path_buf());
        assert!(!service.status().last_simulation.unwrap().stale);

        cache.last_updated = chrono::Utc::now() - chrono::Duration::minutes(90);
        cache.save(state.path()).unwrap();
        let digest = service.status().last_simulation.unwrap();
        assert!(digest.stale);
        assert_eq!((digest.games, digest.seed), (10, 3));
    }
}
