//! Fixed-order feature extraction for the win predictor.
//!
//! Each roster maps to the same [`TEAM_FEATURES`]-long vector. A match exposes
//! three views of it, addressed by name: `blue.<f>`, `red.<f>` and
//! `diff.<f>` (blue minus red). Trained models carry their own ordered list
//! of these names, and [`FeatureIndex`] turns that list into the exact input
//! vector they were trained on.

use super::archetype::Archetype;
use super::matrix::SynergyCounterMatrix;
use super::store::{AttributeDimension, AttributeTag, Champion};
use crate::draft::{Role, MAX_PICKS};
use crate::error::DraftError;
use std::collections::HashMap;
use std::sync::OnceLock;

/// The five canonical role pairings.
pub const ROLE_PAIRS: [(Role, Role); 5] = [
    (Role::Top, Role::Jungle),
    (Role::Jungle, Role::Middle),
    (Role::Middle, Role::Bottom),
    (Role::Bottom, Role::Utility),
    (Role::Utility, Role::Jungle),
];

const AGGREGATES: [&str; 7] = [
    "agg_sustained_dps",
    "agg_burst",
    "agg_mobility",
    "agg_cc",
    "agg_range",
    "agg_team_synergy",
    "agg_filled",
];

pub const TEAM_FEATURES: usize =
    AttributeTag::ALL.len() + Archetype::PRIORITY.len() + ROLE_PAIRS.len() + AGGREGATES.len();

const DPS_SCALE: f64 = 1000.0;
const RANGE_SCALE: f64 = 5000.0;

/// One locked pick as the extractor sees it.
#[derive(Debug, Clone, Copy)]
pub struct RosterEntry<'a> {
    pub champion: &'a Champion,
    pub role: Role,
}

impl<'a> RosterEntry<'a> {
    pub fn new(champion: &'a Champion, role: Role) -> Self {
        RosterEntry { champion, role }
    }
}

fn role_pair_key(pair: (Role, Role)) -> String {
    format!(
        "pair_{}_{}",
        pair.0.as_str().to_ascii_lowercase(),
        pair.1.as_str().to_ascii_lowercase()
    )
}

/// Names of the per-team features, in vector order.
pub fn team_feature_names() -> &'static [String] {
    static NAMES: OnceLock<Vec<String>> = OnceLock::new();
    NAMES.get_or_init(|| {
        let mut names = Vec::with_capacity(TEAM_FEATURES);
        names.extend(AttributeTag::ALL.iter().map(|t| format!("tag_{}", t.key())));
        names.extend(Archetype::PRIORITY.iter().map(|a| format!("archetype_{}", a.key())));
        names.extend(ROLE_PAIRS.iter().map(|p| role_pair_key(*p)));
        names.extend(AGGREGATES.iter().map(|a| a.to_string()));
        names
    })
}

/// Feature vector for one roster. Empty slots and champions without an
/// attribute record contribute zero.
pub fn extract_team(
    roster: &[RosterEntry<'_>],
    matrix: &SynergyCounterMatrix,
) -> Vec<f64> {
    let mut features = vec![0.0; TEAM_FEATURES];
    let per_slot = 1.0 / MAX_PICKS as f64;

    let contributing: Vec<&RosterEntry<'_>> = roster
        .iter()
        .filter(|entry| entry.champion.has_attribute_record())
        .collect();

    let tag_offset = 0;
    let archetype_offset = tag_offset + AttributeTag::ALL.len();
    let pair_offset = archetype_offset + Archetype::PRIORITY.len();
    let agg_offset = pair_offset + ROLE_PAIRS.len();

    for entry in &contributing {
        let champion = entry.champion;
        for (i, tag) in AttributeTag::ALL.iter().enumerate() {
            if champion.has_tag(*tag) {
                features[tag_offset + i] += per_slot;
            }
        }
        features[archetype_offset + champion.primary_archetype.priority()] += per_slot;
    }

    let archetype_in = |role: Role| {
        contributing
            .iter()
            .find(|entry| entry.role == role)
            .map(|entry| entry.champion.primary_archetype)
    };
    for (i, pair) in ROLE_PAIRS.iter().enumerate() {
        if let (Some(a), Some(b)) = (archetype_in(pair.0), archetype_in(pair.1)) {
            features[pair_offset + i] = matrix.synergy(a, b);
        }
    }

    let sum = |dimension: AttributeDimension| -> f64 {
        contributing
            .iter()
            .filter_map(|entry| entry.champion.attributes.get(dimension))
            .sum()
    };
    let archetypes: Vec<Archetype> = contributing
        .iter()
        .map(|entry| entry.champion.primary_archetype)
        .collect();

    features[agg_offset] = sum(AttributeDimension::SustainedDps) / DPS_SCALE;
    features[agg_offset + 1] = sum(AttributeDimension::BurstIndex) * per_slot;
    features[agg_offset + 2] = sum(AttributeDimension::MobilityScore) * per_slot;
    features[agg_offset + 3] = sum(AttributeDimension::CcScore) * per_slot;
    features[agg_offset + 4] = sum(AttributeDimension::MaxRange) / RANGE_SCALE;
    features[agg_offset + 5] = matrix.team_synergy(&archetypes);
    features[agg_offset + 6] = contributing.len() as f64 * per_slot;

    features
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureSide {
    Blue,
    Red,
    Diff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureRef {
    pub side: FeatureSide,
    pub index: usize,
}

/// Both teams' vectors for one matchup.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchFeatures {
    pub blue: Vec<f64>,
    pub red: Vec<f64>,
}

impl MatchFeatures {
    pub fn extract(
        blue: &[RosterEntry<'_>],
        red: &[RosterEntry<'_>],
        matrix: &SynergyCounterMatrix,
    ) -> Self {
        MatchFeatures {
            blue: extract_team(blue, matrix),
            red: extract_team(red, matrix),
        }
    }

    pub fn value(&self, feature: FeatureRef) -> f64 {
        match feature.side {
            FeatureSide::Blue => self.blue[feature.index],
            FeatureSide::Red => self.red[feature.index],
            FeatureSide::Diff => self.blue[feature.index] - self.red[feature.index],
        }
    }
}

/// A model's ordered feature list resolved against the fixed layout.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureIndex {
    names: Vec<String>,
    refs: Vec<FeatureRef>,
}

impl FeatureIndex {
    /// Fails on any name the extractor does not produce.
    pub fn resolve(names: &[String]) -> Result<Self, DraftError> {
        let positions: HashMap<&str, usize> = team_feature_names()
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        let mut refs = Vec::with_capacity(names.len());
        for name in names {
            let (side, feature) = name.split_once('.').ok_or_else(|| {
                DraftError::DataError(format!("malformed feature name: {}", name))
            })?;
            let side = match side {
                "blue" => FeatureSide::Blue,
                "red" => FeatureSide::Red,
                "diff" => FeatureSide::Diff,
                _ => {
                    return Err(DraftError::DataError(format!(
                        "unknown feature side in {}",
                        name
                    )))
                }
            };
            let index = positions.get(feature).copied().ok_or_else(|| {
                DraftError::DataError(format!("unknown feature: {}", name))
            })?;
            refs.push(FeatureRef { side, index });
        }

        Ok(FeatureIndex {
            names: names.to_vec(),
            refs,
        })
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn vectorize(&self, features: &MatchFeatures) -> Vec<f64> {
        self.refs.iter().map(|r| features.value(*r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::classifier::ArchetypeClassifier;
    use crate::analysis::store::{ChampionAttributes, ChampionRecord, Positions};

    fn champion(name: &str, tag: &str, role: Role, attributes: Option<ChampionAttributes>) -> Champion {
        let record = ChampionRecord {
            name: name.to_string(),
            positions: Positions {
                primary: Some(role),
                viable: vec![role],
            },
            class_tags: vec![tag.to_string()],
            attributes,
        };
        Champion::from_record(record, &ArchetypeClassifier::standard(0.7))
    }

    fn full(dps: f64, range: f64) -> Option<ChampionAttributes> {
        Some(ChampionAttributes {
            sustained_dps: Some(dps),
            burst_index: Some(0.3),
            mobility_score: Some(0.2),
            cc_score: Some(0.4),
            max_range: Some(range),
            ad_ratio: Some(2.0),
            ap_ratio: Some(0.2),
        })
    }

    fn position(name: &str) -> usize {
        team_feature_names().iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn layout_is_fixed_and_unique() {
        let names = team_feature_names();
        assert_eq!(names.len(), TEAM_FEATURES);
        let mut sorted = names.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), TEAM_FEATURES);
        assert_eq!(names[0], "tag_damage_physical");
    }

    #[test]
    fn empty_roster_is_all_zero() {
        let matrix = SynergyCounterMatrix::authored();
        assert!(extract_team(&[], &matrix).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn missing_record_contributes_nothing() {
        let matrix = SynergyCounterMatrix::authored();
        let hwei = champion("Hwei", "Artillery", Role::Middle, None);
        let features = extract_team(&[RosterEntry::new(&hwei, Role::Middle)], &matrix);
        assert!(features.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn role_pair_uses_matrix_synergy() {
        let matrix = SynergyCounterMatrix::authored();
        let jinx = champion("Jinx", "Marksman", Role::Bottom, full(180.0, 650.0));
        let leona = champion("Leona", "Vanguard", Role::Utility, full(50.0, 150.0));
        let roster = [
            RosterEntry::new(&jinx, Role::Bottom),
            RosterEntry::new(&leona, Role::Utility),
        ];
        let features = extract_team(&roster, &matrix);

        assert_eq!(features[position("pair_bottom_utility")], 0.5);
        assert_eq!(features[position("pair_top_jungle")], 0.0);
        assert!((features[position("archetype_marksman")] - 0.2).abs() < 1e-12);
        assert!((features[position("agg_filled")] - 0.4).abs() < 1e-12);
        assert!((features[position("agg_range")] - 800.0 / 5000.0).abs() < 1e-12);
        assert_eq!(features[position("agg_team_synergy")], 0.5);
    }

    #[test]
    fn index_resolves_sides_and_rejects_unknown_names() {
        let names = vec![
            "diff.agg_filled".to_string(),
            "blue.agg_filled".to_string(),
            "red.agg_filled".to_string(),
        ];
        let index = FeatureIndex::resolve(&names).unwrap();
        let features = MatchFeatures {
            blue: {
                let mut v = vec![0.0; TEAM_FEATURES];
                v[position("agg_filled")] = 0.8;
                v
            },
            red: {
                let mut v = vec![0.0; TEAM_FEATURES];
                v[position("agg_filled")] = 0.2;
                v
            },
        };
        let vector = index.vectorize(&features);
        assert!((vector[0] - 0.6).abs() < 1e-12);
        assert_eq!(vector[1], 0.8);
        assert_eq!(vector[2], 0.2);

        assert!(FeatureIndex::resolve(&["blue.gold_lead".to_string()]).is_err());
        assert!(FeatureIndex::resolve(&["purple.agg_filled".to_string()]).is_err());
        assert!(FeatureIndex::resolve(&["agg_filled".to_string()]).is_err());
    }
}
