use super::archetype::{Archetype, ArchetypeFamily};
use super::composition::{CompositionType, DraftNeeds};
use super::ensemble::EnsemblePredictor;
use super::features::RosterEntry;
use super::matrix::SynergyCounterMatrix;
use super::store::{AttributeStore, Champion};
use crate::config::DEFAULT_DIVERSITY_CAP;
use crate::draft::{DraftState, Role, SlotRequest, Team, TeamDraft, MAX_PICKS};
use crate::error::DraftError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Score terms below this magnitude do not earn a rationale tag.
pub const MATERIALITY: f64 = 0.1;

/// Decrement per family member over the cap.
pub const DIVERSITY_STEP: f64 = 0.05;

/// Flex slots only: decrement per higher-ranked candidate already assigned
/// the same position.
pub const ROLE_STACK_STEP: f64 = 0.015;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecommendationWeights {
    pub synergy: f64,
    pub counter: f64,
    pub role_fit: f64,
    pub projection: f64,
}

impl Default for RecommendationWeights {
    fn default() -> Self {
        RecommendationWeights {
            synergy: 0.4,
            counter: 0.3,
            role_fit: 0.3,
            projection: 1.0,
        }
    }
}

/// Raw, unweighted score terms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub synergy: f64,
    pub counter: f64,
    pub role_fit: f64,
    pub projection: f64,
    pub diversity_penalty: f64,
}

impl ScoreBreakdown {
    pub fn composite(&self, weights: &RecommendationWeights) -> f64 {
        weights.synergy * self.synergy
            + weights.counter * self.counter
            + weights.role_fit * self.role_fit
            + weights.projection * self.projection
            - self.diversity_penalty
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub champion: String,
    #[serde(skip)]
    pub key: String,
    pub score: f64,
    pub score_breakdown: ScoreBreakdown,
    pub archetype: Archetype,
    pub family: ArchetypeFamily,
    /// Position the champion would take in the slot.
    pub role: Role,
    pub reasoning: Vec<String>,
    pub rationale_tags: Vec<String>,
    pub projected_team_winrate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BanRecommendation {
    pub champion: String,
    pub score: f64,
    pub archetype: Archetype,
    pub reason: String,
    pub roles: Vec<Role>,
}

/// Both sides' locked picks resolved against the store.
pub struct ResolvedDraft<'a> {
    pub blue: Vec<RosterEntry<'a>>,
    pub red: Vec<RosterEntry<'a>>,
}

impl<'a> ResolvedDraft<'a> {
    pub fn side(&self, team: Team) -> &[RosterEntry<'a>] {
        match team {
            Team::Blue => &self.blue,
            Team::Red => &self.red,
        }
    }

    pub fn archetypes(&self, team: Team) -> Vec<Archetype> {
        self.side(team)
            .iter()
            .map(|entry| entry.champion.primary_archetype)
            .collect()
    }

    fn with_pick(&self, team: Team, entry: RosterEntry<'a>) -> (Vec<RosterEntry<'a>>, Vec<RosterEntry<'a>>) {
        let mut blue = self.blue.clone();
        let mut red = self.red.clone();
        match team {
            Team::Blue => blue.push(entry),
            Team::Red => red.push(entry),
        }
        (blue, red)
    }
}

fn resolve_side<'a>(
    store: &'a AttributeStore,
    side: &TeamDraft,
) -> Result<Vec<RosterEntry<'a>>, DraftError> {
    for ban in &side.bans {
        store.resolve(ban)?;
    }
    side.picks
        .iter()
        .map(|pick| Ok(RosterEntry::new(store.resolve(&pick.champion)?, pick.role)))
        .collect()
}

/// Validates the draft and resolves every name in it. Unknown names fail.
pub fn resolve_draft<'a>(
    store: &'a AttributeStore,
    draft: &DraftState,
) -> Result<ResolvedDraft<'a>, DraftError> {
    draft.validate()?;
    Ok(ResolvedDraft {
        blue: resolve_side(store, &draft.blue)?,
        red: resolve_side(store, &draft.red)?,
    })
}

fn by_score_then_key(a: (f64, &str), b: (f64, &str)) -> Ordering {
    b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1))
}

/// Picks the visible list from a ranked batch: at most `cap` champions per
/// archetype family, in rank order. Over-cap candidates only fill seats the
/// other families cannot. The result stays sorted by score.
pub fn select_diverse(ranked: Vec<Recommendation>, limit: usize, cap: usize) -> Vec<Recommendation> {
    let cap = cap.max(1);
    let mut shown: HashMap<ArchetypeFamily, usize> = HashMap::new();
    let mut visible = Vec::with_capacity(limit);
    let mut overflow = Vec::new();

    for recommendation in ranked {
        if visible.len() == limit {
            break;
        }
        let count = shown.entry(recommendation.family).or_insert(0);
        if *count < cap {
            *count += 1;
            visible.push(recommendation);
        } else {
            overflow.push(recommendation);
        }
    }

    let open = limit.saturating_sub(visible.len());
    visible.extend(overflow.into_iter().take(open));
    visible.sort_by(|a, b| by_score_then_key((a.score, &a.key), (b.score, &b.key)));
    visible
}

pub struct RecommendationEngine<'a> {
    store: &'a AttributeStore,
    matrix: &'a SynergyCounterMatrix,
    predictor: Option<&'a EnsemblePredictor>,
    weights: RecommendationWeights,
    diversity_cap: usize,
}

impl<'a> RecommendationEngine<'a> {
    pub fn new(
        store: &'a AttributeStore,
        matrix: &'a SynergyCounterMatrix,
        predictor: Option<&'a EnsemblePredictor>,
    ) -> Self {
        RecommendationEngine {
            store,
            matrix,
            predictor,
            weights: RecommendationWeights::default(),
            diversity_cap: DEFAULT_DIVERSITY_CAP,
        }
    }

    pub fn with_weights(mut self, weights: RecommendationWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_diversity_cap(mut self, cap: usize) -> Self {
        self.diversity_cap = cap.max(1);
        self
    }

    /// Position a candidate would take. A role slot fixes it; a flex slot
    /// prefers the primary position, then any other open viable one.
    fn assign_role(champion: &Champion, slot: &SlotRequest, side: &TeamDraft) -> Option<Role> {
        match slot.role {
            Some(role) => champion.can_play(role).then_some(role),
            None => {
                if let Some(primary) = champion.primary_role {
                    if !side.has_role(primary) {
                        return Some(primary);
                    }
                }
                champion
                    .viable_roles
                    .iter()
                    .copied()
                    .find(|role| !side.has_role(*role))
            }
        }
    }

    fn role_fit(champion: &Champion, role: Role, slot: &SlotRequest) -> f64 {
        match slot.role {
            Some(_) => champion.role_fit(role),
            None if champion.primary_role == Some(role) => 1.0,
            None => 0.5,
        }
    }

    /// Ranks `pool` for one open slot. Champions already picked or banned by
    /// either side never appear; an exhausted pool yields an empty list.
    pub fn recommend(
        &self,
        draft: &DraftState,
        slot: &SlotRequest,
        pool: &[&'a Champion],
        limit: usize,
    ) -> Result<Vec<Recommendation>, DraftError> {
        let resolved = resolve_draft(self.store, draft)?;
        draft.check_slot_open(slot)?;

        let team = slot.team;
        let side = draft.team(team);
        let taken = draft.taken_keys();
        let ours = resolved.archetypes(team);
        let theirs = resolved.archetypes(team.opponent());
        let base_synergy = self.matrix.team_synergy(&ours);
        let needs = DraftNeeds::assess(&ours, &theirs);
        let has_engage = ours.iter().any(|a| a.is_hard_engage());

        let current = self.predictor.map(|p| {
            p.predict(&resolved.blue, &resolved.red, self.matrix)
                .team_probability(team)
        });

        let mut seen: HashSet<&str> = HashSet::new();
        let mut ranked: Vec<Recommendation> = Vec::new();

        for &champion in pool {
            if taken.contains(&champion.key) || !seen.insert(champion.key.as_str()) {
                continue;
            }
            let Some(role) = Self::assign_role(champion, slot, side) else {
                continue;
            };

            let archetype = champion.primary_archetype;
            let mut with_candidate = ours.clone();
            with_candidate.push(archetype);

            let synergy = self.matrix.team_synergy(&with_candidate) - base_synergy;
            let counter = self.matrix.counter_advantage(&[archetype], &theirs);
            let role_fit = Self::role_fit(champion, role, slot);

            let projected = match (self.predictor, current) {
                (Some(predictor), Some(_)) => {
                    let (blue, red) = resolved.with_pick(team, RosterEntry::new(champion, role));
                    Some(predictor.predict(&blue, &red, self.matrix).team_probability(team))
                }
                _ => None,
            };
            let projection = match (projected, current) {
                (Some(p), Some(c)) => p - c,
                _ => 0.0,
            };

            let breakdown = ScoreBreakdown {
                synergy,
                counter,
                role_fit,
                projection,
                diversity_penalty: 0.0,
            };

            let rationale_tags = self.rationale_tags(champion, &breakdown, &needs, has_engage);

            ranked.push(Recommendation {
                champion: champion.name.clone(),
                key: champion.key.clone(),
                score: breakdown.composite(&self.weights),
                score_breakdown: breakdown,
                archetype,
                family: archetype.family(),
                role,
                reasoning: Vec::new(),
                rationale_tags,
                projected_team_winrate: projected,
            });
        }

        ranked.sort_by(|a, b| by_score_then_key((a.score, &a.key), (b.score, &b.key)));
        self.apply_diversity(&mut ranked, slot.role.is_none());
        let mut ranked = select_diverse(ranked, limit, self.diversity_cap);

        for recommendation in &mut ranked {
            if let Some(champion) = self.store.get(&recommendation.key) {
                recommendation.reasoning = Self::reasoning(champion, recommendation, slot);
            }
        }

        debug!(slot = %slot.slot_id, results = ranked.len(), "slot ranked");
        Ok(ranked)
    }

    /// Walks the ranked batch; a candidate whose family already has `cap` or
    /// more members above it loses `DIVERSITY_STEP` per member over the cap.
    /// On flex slots each higher-ranked candidate sharing the assigned
    /// position costs another `ROLE_STACK_STEP`. The batch is then re-sorted.
    fn apply_diversity(&self, ranked: &mut [Recommendation], flex: bool) {
        let mut members: HashMap<ArchetypeFamily, usize> = HashMap::new();
        let mut positions: HashMap<Role, usize> = HashMap::new();
        for recommendation in ranked.iter_mut() {
            let above = members.entry(recommendation.family).or_insert(0);
            let mut penalty = 0.0;
            if *above >= self.diversity_cap {
                penalty += DIVERSITY_STEP * (*above - self.diversity_cap + 1) as f64;
            }
            *above += 1;

            if flex {
                let stacked = positions.entry(recommendation.role).or_insert(0);
                penalty += ROLE_STACK_STEP * *stacked as f64;
                *stacked += 1;
            }

            if penalty > 0.0 {
                recommendation.score_breakdown.diversity_penalty = penalty;
                recommendation.score -= penalty;
            }
        }
        ranked.sort_by(|a, b| by_score_then_key((a.score, &a.key), (b.score, &b.key)));
    }

    fn rationale_tags(
        &self,
        champion: &Champion,
        breakdown: &ScoreBreakdown,
        needs: &DraftNeeds,
        team_has_engage: bool,
    ) -> Vec<String> {
        let archetype = champion.primary_archetype;
        let mut tags = Vec::new();

        if archetype.is_hard_engage() && !team_has_engage {
            tags.push("fills engage gap".to_string());
        }
        if breakdown.counter >= MATERIALITY {
            tags.push("counters enemy threat".to_string());
        }
        if breakdown.synergy >= MATERIALITY {
            tags.push("strong team synergy".to_string());
        } else if breakdown.synergy <= -MATERIALITY {
            tags.push("awkward team fit".to_string());
        }
        for missing in &needs.missing_roles {
            let fills = match missing.as_str() {
                "damage_dealer" => archetype.is_damage_dealer(),
                "tank" => archetype.is_tank(),
                "support" => archetype.is_support(),
                _ => false,
            };
            if fills {
                tags.push(format!("fills missing {}", missing.replace('_', " ")));
            }
        }
        if breakdown.projection >= MATERIALITY / 10.0 {
            tags.push("improves win projection".to_string());
        }
        if breakdown.role_fit >= 1.0 {
            tags.push("primary role".to_string());
        }
        tags
    }

    fn reasoning(champion: &Champion, rec: &Recommendation, slot: &SlotRequest) -> Vec<String> {
        let breakdown = &rec.score_breakdown;
        let mut lines = Vec::new();

        lines.push(format!(
            "{}: {}",
            rec.archetype.label(),
            rec.archetype.description()
        ));

        if breakdown.role_fit >= 1.0 {
            lines.push(format!("Primary {} pick", rec.role));
        } else if slot.role.is_some() {
            lines.push(format!("Can flex into {}", rec.role));
        } else {
            lines.push(format!("Fills open {} position", rec.role));
        }

        if breakdown.synergy >= MATERIALITY {
            lines.push(format!("Synergizes with current picks ({:+.2})", breakdown.synergy));
        } else if breakdown.synergy <= -MATERIALITY {
            lines.push(format!("Awkward fit with current picks ({:+.2})", breakdown.synergy));
        }
        if breakdown.counter >= MATERIALITY {
            lines.push(format!("Favorable into enemy picks ({:+.2})", breakdown.counter));
        } else if breakdown.counter <= -MATERIALITY {
            lines.push(format!("Weak into enemy picks ({:+.2})", breakdown.counter));
        }
        if let Some(projected) = rec.projected_team_winrate {
            lines.push(format!(
                "Projected team win rate {:.1}% ({:+.1}%)",
                projected * 100.0,
                breakdown.projection * 100.0
            ));
        }
        if breakdown.diversity_penalty > 0.0 {
            lines.push(format!(
                "Diversity penalty {:.2}: {} or {} already represented higher up",
                breakdown.diversity_penalty,
                rec.family.label(),
                rec.role
            ));
        }
        if champion.reduced_confidence {
            lines.push("Limited attribute data; archetype estimate is approximate".to_string());
        }

        lines
    }
}

/// Bans before the opening rotation closes, three per side.
pub const OPENING_BANS: usize = 6;

/// Second-phase bonus for a core piece of the opponent's plan.
pub const THEME_BONUS: f64 = 0.45;

/// Second-phase bonus for a champion that punishes the core of our plan.
pub const EXPOSURE_BONUS: f64 = 0.2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BanMode {
    /// Draft-aware: flex threats first, then bans aimed at the opponent's plan.
    #[default]
    Pro,
    /// Draft-blind: broad threats regardless of who picked what.
    SoloQ,
}

impl fmt::Display for BanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BanMode::Pro => write!(f, "pro"),
            BanMode::SoloQ => write!(f, "soloq"),
        }
    }
}

impl FromStr for BanMode {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pro" => Ok(BanMode::Pro),
            "soloq" | "solo" => Ok(BanMode::SoloQ),
            _ => Err(DraftError::InvalidBanMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BanPhase {
    Opening,
    Second,
    SoloMeta,
}

/// Where the draft stands from the banning side's point of view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BanContext {
    pub mode: BanMode,
    pub phase: BanPhase,
    /// Absent in solo queue, where bans target the pool rather than a side.
    pub target_team: Option<Team>,
    pub target_theme: Option<CompositionType>,
    pub our_theme: Option<CompositionType>,
}

impl BanContext {
    pub fn assess(draft: &DraftState, resolved: &ResolvedDraft<'_>, banning: Team, mode: BanMode) -> Self {
        if mode == BanMode::SoloQ {
            return BanContext {
                mode,
                phase: BanPhase::SoloMeta,
                target_team: None,
                target_theme: None,
                our_theme: None,
            };
        }

        let total_bans = draft.blue.bans.len() + draft.red.bans.len();
        let opponent = banning.opponent();
        BanContext {
            mode,
            phase: if total_bans < OPENING_BANS {
                BanPhase::Opening
            } else {
                BanPhase::Second
            },
            target_team: Some(opponent),
            target_theme: Some(CompositionType::infer(&resolved.archetypes(opponent))),
            our_theme: Some(CompositionType::infer(&resolved.archetypes(banning))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BanPlan {
    pub context: BanContext,
    pub bans: Vec<BanRecommendation>,
}

/// Ranks champions the banning side should remove.
///
/// Pro mode opens on flexible champions that hide lane assignments, then
/// turns to the opponent's picks once the opening rotation is done. Solo
/// queue ignores picks and ranks broad threats.
pub struct BanAdvisor<'a> {
    store: &'a AttributeStore,
    matrix: &'a SynergyCounterMatrix,
}

impl<'a> BanAdvisor<'a> {
    pub fn new(store: &'a AttributeStore, matrix: &'a SynergyCounterMatrix) -> Self {
        BanAdvisor { store, matrix }
    }

    /// Second-phase base score:
    /// - 0.5 × synergy gained by the opponent
    /// - 0.3 × counter pressure against our picks
    /// - 0.2 × role flexibility (viable positions / 5)
    pub fn calculate_score(opponent_synergy: f64, counter_vs_us: f64, flexibility: f64) -> f64 {
        (0.5 * opponent_synergy) + (0.3 * counter_vs_us) + (0.2 * flexibility)
    }

    /// Mean counter score of `archetype` against the whole catalog.
    fn pressure(&self, archetype: Archetype) -> f64 {
        let total = Archetype::PRIORITY
            .iter()
            .fold(0.0, |acc, other| acc + self.matrix.counter(archetype, *other));
        total / Archetype::PRIORITY.len() as f64
    }

    fn favored_into(&self, archetype: Archetype) -> usize {
        Archetype::PRIORITY
            .iter()
            .filter(|other| self.matrix.counter(archetype, **other) > 0.0)
            .count()
    }

    pub fn recommend(
        &self,
        draft: &DraftState,
        banning: Team,
        mode: BanMode,
        limit: usize,
    ) -> Result<BanPlan, DraftError> {
        let resolved = resolve_draft(self.store, draft)?;
        let context = BanContext::assess(draft, &resolved, banning, mode);
        let opponent = banning.opponent();
        let opponent_side = draft.team(opponent);
        let opponent_archetypes = resolved.archetypes(opponent);
        let our_archetypes = resolved.archetypes(banning);
        let base = self.matrix.team_synergy(&opponent_archetypes);
        let taken = draft.taken_keys();
        let opponent_full = opponent_side.picks.len() >= MAX_PICKS;
        let our_theme = context.our_theme.unwrap_or(CompositionType::Mixed);
        let target_theme = context.target_theme.unwrap_or(CompositionType::Mixed);
        let our_core: Vec<Archetype> = our_archetypes
            .iter()
            .copied()
            .filter(|a| our_theme.is_core(*a))
            .collect();

        let mut recommendations: Vec<(String, BanRecommendation)> = self
            .store
            .iter()
            .filter(|c| !taken.contains(&c.key))
            .filter(|c| {
                mode == BanMode::SoloQ
                    || opponent_full
                    || c.viable_roles.iter().any(|r| !opponent_side.has_role(*r))
            })
            .map(|c| {
                let archetype = c.primary_archetype;
                let flexibility = c.viable_roles.len() as f64 / Role::ALL.len() as f64;

                let (score, reason) = match context.phase {
                    BanPhase::SoloMeta => {
                        let score = 0.6 * self.pressure(archetype) + 0.4 * flexibility;
                        let reason = format!(
                            "Broad threat: favored into {} of {} archetypes",
                            self.favored_into(archetype),
                            Archetype::PRIORITY.len()
                        );
                        (score, reason)
                    }
                    BanPhase::Opening => {
                        let score = 0.7 * flexibility + 0.3 * self.pressure(archetype);
                        let reason = if c.viable_roles.len() > 1 {
                            let roles: Vec<String> =
                                c.viable_roles.iter().take(3).map(|r| r.to_string()).collect();
                            format!("Keeps lanes ambiguous ({})", roles.join("/"))
                        } else {
                            format!("{} threat", archetype.label())
                        };
                        (score, reason)
                    }
                    BanPhase::Second => {
                        let mut with_candidate = opponent_archetypes.clone();
                        with_candidate.push(archetype);
                        let synergy = self.matrix.team_synergy(&with_candidate) - base;
                        let counter = self.matrix.counter_advantage(&[archetype], &our_archetypes);
                        let mut score = Self::calculate_score(synergy, counter, flexibility);
                        let mut reasons = Vec::new();

                        if target_theme.is_core(archetype) {
                            score += THEME_BONUS;
                            reasons.push(format!("Reinforces their {} plan", target_theme));
                        }
                        if !our_core.is_empty()
                            && self.matrix.counter_advantage(&[archetype], &our_core) >= MATERIALITY
                        {
                            score += EXPOSURE_BONUS;
                            reasons.push(format!("Punishes our {} core", our_theme));
                        }
                        if reasons.is_empty() {
                            reasons.push(if synergy >= MATERIALITY && synergy >= counter {
                                format!("Strong synergy with {} picks ({:+.2})", opponent, synergy)
                            } else if counter >= MATERIALITY {
                                format!("Counters our composition ({:+.2})", counter)
                            } else if c.viable_roles.len() > 1 {
                                format!("Flexible pick across {} positions", c.viable_roles.len())
                            } else {
                                format!("{} threat", archetype.label())
                            });
                        }
                        (score, reasons.join("; "))
                    }
                };

                (
                    c.key.clone(),
                    BanRecommendation {
                        champion: c.name.clone(),
                        score,
                        archetype,
                        reason,
                        roles: c.viable_roles.clone(),
                    },
                )
            })
            .collect();

        recommendations.sort_by(|a, b| by_score_then_key((a.1.score, &a.0), (b.1.score, &b.0)));
        recommendations.truncate(limit);
        debug!(%banning, %mode, phase = ?context.phase, "bans ranked");

        Ok(BanPlan {
            context,
            bans: recommendations.into_iter().map(|(_, rec)| rec).collect(),
        })
    }
}
