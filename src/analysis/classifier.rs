//! Fuzzy archetype classification.
//!
//! Each archetype declares trapezoidal membership functions over a subset of
//! attribute dimensions. Dimension memberships combine with `min` (fuzzy AND),
//! so a champion only scores high when it satisfies every criterion.

use super::archetype::Archetype;
use super::store::{AttributeDimension, ChampionAttributes};
use serde::Serialize;
use std::collections::BTreeMap;

/// Membership assigned to a dimension whose value is unknown.
pub const NEUTRAL_MEMBERSHIP: f64 = 0.5;

/// Constant membership of the catch-all specialist archetype.
pub const SPECIALIST_BASELINE: f64 = 0.3;

const TIE_EPSILON: f64 = 1e-9;

/// Piecewise-linear membership: 0 at or below `hard_min`, rising to 1 at
/// `soft_min`, flat through `soft_max`, falling to 0 at `hard_max`.
/// A side with no bounds never rejects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trapezoid {
    pub hard_min: Option<f64>,
    pub soft_min: Option<f64>,
    pub soft_max: Option<f64>,
    pub hard_max: Option<f64>,
}

impl Trapezoid {
    pub const fn at_least(hard_min: f64, soft_min: f64) -> Self {
        Trapezoid {
            hard_min: Some(hard_min),
            soft_min: Some(soft_min),
            soft_max: None,
            hard_max: None,
        }
    }

    pub const fn at_most(soft_max: f64, hard_max: f64) -> Self {
        Trapezoid {
            hard_min: None,
            soft_min: None,
            soft_max: Some(soft_max),
            hard_max: Some(hard_max),
        }
    }

    pub const fn between(hard_min: f64, soft_min: f64, soft_max: f64, hard_max: f64) -> Self {
        Trapezoid {
            hard_min: Some(hard_min),
            soft_min: Some(soft_min),
            soft_max: Some(soft_max),
            hard_max: Some(hard_max),
        }
    }

    pub fn membership(&self, value: f64) -> f64 {
        let lower = match (self.hard_min, self.soft_min) {
            (Some(hard), Some(soft)) if soft > hard => {
                if value <= hard {
                    0.0
                } else if value < soft {
                    (value - hard) / (soft - hard)
                } else {
                    1.0
                }
            }
            (Some(bound), _) | (None, Some(bound)) => {
                if value < bound {
                    0.0
                } else {
                    1.0
                }
            }
            (None, None) => 1.0,
        };

        let upper = match (self.soft_max, self.hard_max) {
            (Some(soft), Some(hard)) if hard > soft => {
                if value >= hard {
                    0.0
                } else if value > soft {
                    (hard - value) / (hard - soft)
                } else {
                    1.0
                }
            }
            (Some(bound), _) | (None, Some(bound)) => {
                if value > bound {
                    0.0
                } else {
                    1.0
                }
            }
            (None, None) => 1.0,
        };

        lower.min(upper).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    pub dimension: AttributeDimension,
    pub shape: Trapezoid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArchetypeDefinition {
    pub archetype: Archetype,
    pub criteria: Vec<Criterion>,
    /// Used instead of the criteria when none are declared.
    pub baseline: f64,
}

impl ArchetypeDefinition {
    fn new(archetype: Archetype, criteria: &[(AttributeDimension, Trapezoid)]) -> Self {
        ArchetypeDefinition {
            archetype,
            criteria: criteria
                .iter()
                .map(|(dimension, shape)| Criterion {
                    dimension: *dimension,
                    shape: *shape,
                })
                .collect(),
            baseline: 0.0,
        }
    }

    fn fallback(archetype: Archetype, baseline: f64) -> Self {
        ArchetypeDefinition {
            archetype,
            criteria: Vec::new(),
            baseline,
        }
    }

    pub fn score(&self, attributes: &ChampionAttributes) -> f64 {
        if self.criteria.is_empty() {
            return self.baseline;
        }

        self.criteria
            .iter()
            .map(|criterion| match attributes.get(criterion.dimension) {
                Some(value) => criterion.shape.membership(value),
                None => NEUTRAL_MEMBERSHIP,
            })
            .fold(1.0, f64::min)
    }
}

/// Where a champion's primary archetype came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchetypeSource {
    Authoritative,
    Fuzzy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub membership: BTreeMap<Archetype, f64>,
    pub primary: Archetype,
    pub secondary: Vec<Archetype>,
    pub source: ArchetypeSource,
    pub reduced_confidence: bool,
}

pub struct ArchetypeClassifier {
    definitions: Vec<ArchetypeDefinition>,
    secondary_threshold: f64,
}

impl ArchetypeClassifier {
    pub fn new(definitions: Vec<ArchetypeDefinition>, secondary_threshold: f64) -> Self {
        ArchetypeClassifier {
            definitions,
            secondary_threshold,
        }
    }

    /// The 13 authored archetype definitions.
    pub fn standard(secondary_threshold: f64) -> Self {
        use AttributeDimension::*;

        let definitions = vec![
            ArchetypeDefinition::new(
                Archetype::Marksman,
                &[
                    (SustainedDps, Trapezoid::at_least(110.0, 140.0)),
                    (MaxRange, Trapezoid::between(450.0, 550.0, 800.0, 1100.0)),
                    (AdRatio, Trapezoid::at_least(1.0, 1.8)),
                    (MobilityScore, Trapezoid::at_most(0.5, 0.8)),
                ],
            ),
            ArchetypeDefinition::new(
                Archetype::Enchanter,
                &[
                    (SustainedDps, Trapezoid::at_most(70.0, 95.0)),
                    (ApRatio, Trapezoid::at_least(0.3, 0.6)),
                    (MaxRange, Trapezoid::at_least(450.0, 550.0)),
                    (BurstIndex, Trapezoid::at_most(0.3, 0.5)),
                    (CcScore, Trapezoid::at_most(0.5, 0.75)),
                ],
            ),
            ArchetypeDefinition::new(
                Archetype::EngageTank,
                &[
                    (CcScore, Trapezoid::at_least(0.5, 0.7)),
                    (MobilityScore, Trapezoid::at_least(0.2, 0.4)),
                    (SustainedDps, Trapezoid::at_most(85.0, 110.0)),
                    (BurstIndex, Trapezoid::at_most(0.4, 0.6)),
                ],
            ),
            ArchetypeDefinition::new(
                Archetype::Warden,
                &[
                    (CcScore, Trapezoid::at_least(0.4, 0.6)),
                    (MobilityScore, Trapezoid::at_most(0.3, 0.5)),
                    (SustainedDps, Trapezoid::at_most(85.0, 110.0)),
                    (MaxRange, Trapezoid::at_most(500.0, 800.0)),
                ],
            ),
            ArchetypeDefinition::new(
                Archetype::Catcher,
                &[
                    (CcScore, Trapezoid::at_least(0.5, 0.7)),
                    (MaxRange, Trapezoid::at_least(700.0, 900.0)),
                    (SustainedDps, Trapezoid::at_most(85.0, 105.0)),
                ],
            ),
            ArchetypeDefinition::new(
                Archetype::BurstMage,
                &[
                    (BurstIndex, Trapezoid::at_least(0.5, 0.7)),
                    (ApRatio, Trapezoid::at_least(1.0, 1.8)),
                    (MaxRange, Trapezoid::between(500.0, 600.0, 1000.0, 1200.0)),
                    (MobilityScore, Trapezoid::at_most(0.4, 0.6)),
                ],
            ),
            ArchetypeDefinition::new(
                Archetype::ArtilleryMage,
                &[
                    (MaxRange, Trapezoid::at_least(900.0, 1100.0)),
                    (ApRatio, Trapezoid::at_least(1.0, 1.5)),
                    (MobilityScore, Trapezoid::at_most(0.3, 0.5)),
                ],
            ),
            ArchetypeDefinition::new(
                Archetype::BattleMage,
                &[
                    (ApRatio, Trapezoid::at_least(1.0, 1.5)),
                    (SustainedDps, Trapezoid::at_least(70.0, 90.0)),
                    (MaxRange, Trapezoid::between(250.0, 350.0, 650.0, 800.0)),
                    (BurstIndex, Trapezoid::at_most(0.5, 0.7)),
                ],
            ),
            ArchetypeDefinition::new(
                Archetype::BurstAssassin,
                &[
                    (BurstIndex, Trapezoid::at_least(0.5, 0.7)),
                    (MobilityScore, Trapezoid::at_least(0.5, 0.7)),
                    (MaxRange, Trapezoid::at_most(450.0, 700.0)),
                    (CcScore, Trapezoid::at_most(0.3, 0.6)),
                ],
            ),
            ArchetypeDefinition::new(
                Archetype::Diver,
                &[
                    (MobilityScore, Trapezoid::at_least(0.3, 0.5)),
                    (CcScore, Trapezoid::at_least(0.3, 0.5)),
                    (MaxRange, Trapezoid::at_most(450.0, 700.0)),
                    (SustainedDps, Trapezoid::between(60.0, 80.0, 140.0, 170.0)),
                ],
            ),
            ArchetypeDefinition::new(
                Archetype::Skirmisher,
                &[
                    (SustainedDps, Trapezoid::at_least(90.0, 120.0)),
                    (MobilityScore, Trapezoid::at_least(0.4, 0.6)),
                    (MaxRange, Trapezoid::at_most(350.0, 550.0)),
                    (BurstIndex, Trapezoid::at_most(0.6, 0.8)),
                    (CcScore, Trapezoid::at_most(0.4, 0.6)),
                ],
            ),
            ArchetypeDefinition::new(
                Archetype::Juggernaut,
                &[
                    (SustainedDps, Trapezoid::at_least(80.0, 100.0)),
                    (MobilityScore, Trapezoid::at_most(0.3, 0.5)),
                    (MaxRange, Trapezoid::at_most(350.0, 550.0)),
                    (AdRatio, Trapezoid::at_least(0.8, 1.2)),
                ],
            ),
            ArchetypeDefinition::fallback(Archetype::Specialist, SPECIALIST_BASELINE),
        ];

        ArchetypeClassifier::new(definitions, secondary_threshold)
    }

    pub fn definitions(&self) -> &[ArchetypeDefinition] {
        &self.definitions
    }

    pub fn definition(&self, archetype: Archetype) -> Option<&ArchetypeDefinition> {
        self.definitions.iter().find(|d| d.archetype == archetype)
    }

    pub fn secondary_threshold(&self) -> f64 {
        self.secondary_threshold
    }

    /// Membership degree in every archetype. Archetypes without a
    /// definition score 0.
    pub fn memberships(&self, attributes: &ChampionAttributes) -> BTreeMap<Archetype, f64> {
        let mut scores: BTreeMap<Archetype, f64> =
            Archetype::PRIORITY.iter().map(|a| (*a, 0.0)).collect();
        for definition in &self.definitions {
            scores.insert(definition.archetype, definition.score(attributes));
        }
        scores
    }

    /// Fuzzy classification only.
    pub fn classify(&self, attributes: &ChampionAttributes) -> Classification {
        let membership = self.memberships(attributes);
        let primary = select_primary(&membership);
        let secondary = self.secondaries(&membership, primary);

        Classification {
            membership,
            primary,
            secondary,
            source: ArchetypeSource::Fuzzy,
            reduced_confidence: !attributes.is_complete(),
        }
    }

    /// Authoritative class tags take precedence for the primary archetype;
    /// fuzzy scores only enrich (memberships, secondaries). The two sources
    /// are never averaged.
    pub fn classify_with_authority(
        &self,
        attributes: &ChampionAttributes,
        class_tags: &[String],
    ) -> Classification {
        let mut classification = self.classify(attributes);

        if let Some(authoritative) = class_tags.iter().find_map(|t| Archetype::from_class_tag(t)) {
            classification.primary = authoritative;
            classification.secondary =
                self.secondaries(&classification.membership, authoritative);
            classification.source = ArchetypeSource::Authoritative;
        }

        classification
    }

    fn secondaries(&self, membership: &BTreeMap<Archetype, f64>, primary: Archetype) -> Vec<Archetype> {
        let mut secondary: Vec<(Archetype, f64)> = membership
            .iter()
            .filter(|(archetype, score)| **archetype != primary && **score >= self.secondary_threshold)
            .map(|(archetype, score)| (*archetype, *score))
            .collect();

        secondary.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.priority().cmp(&b.0.priority()))
        });
        secondary.into_iter().map(|(archetype, _)| archetype).collect()
    }
}

/// Argmax with ties resolved by [`Archetype::PRIORITY`].
pub fn select_primary(membership: &BTreeMap<Archetype, f64>) -> Archetype {
    let mut best = Archetype::PRIORITY[0];
    let mut best_score = f64::NEG_INFINITY;

    for archetype in Archetype::PRIORITY {
        let score = membership.get(&archetype).copied().unwrap_or(0.0);
        if score > best_score + TIE_EPSILON {
            best = archetype;
            best_score = score;
        }
    }

    best
}
