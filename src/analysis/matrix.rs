//! Archetype-pair interaction tables.
//!
//! Synergy is symmetric and scores two archetypes on the same team. Counter is
//! directional: `counter(a, b) > 0` means `a` is favored against `b`. Both
//! tables start from authored heuristics and accept per-cell overrides from
//! `matrix.json`, so data-derived values can replace individual cells without
//! touching consumers.

use super::archetype::Archetype;
use crate::error::DraftError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

const N: usize = 13;

type Table = [[f64; N]; N];

fn idx(archetype: Archetype) -> usize {
    archetype.priority()
}

use Archetype::*;

/// Unordered pairs; each value lands in both (a, b) and (b, a).
const AUTHORED_SYNERGY: &[(Archetype, Archetype, f64)] = &[
    (Marksman, Enchanter, 0.6),
    (Marksman, EngageTank, 0.5),
    (Marksman, Warden, 0.5),
    (Marksman, Catcher, 0.4),
    (Marksman, BurstMage, 0.2),
    (Marksman, ArtilleryMage, 0.3),
    (Marksman, BattleMage, 0.25),
    (Marksman, Diver, 0.1),
    (Marksman, Juggernaut, 0.2),
    (Marksman, Skirmisher, -0.1),
    (Marksman, BurstAssassin, -0.05),
    (Marksman, Marksman, -0.2),
    (EngageTank, BurstMage, 0.45),
    (EngageTank, BattleMage, 0.5),
    (EngageTank, Diver, 0.4),
    (EngageTank, BurstAssassin, 0.35),
    (EngageTank, Skirmisher, 0.2),
    (EngageTank, Juggernaut, 0.25),
    (EngageTank, Enchanter, 0.2),
    (EngageTank, Catcher, 0.15),
    (EngageTank, Warden, 0.1),
    (EngageTank, ArtilleryMage, -0.1),
    (EngageTank, EngageTank, -0.15),
    (EngageTank, Specialist, 0.1),
    (Enchanter, Juggernaut, 0.35),
    (Enchanter, Skirmisher, 0.3),
    (Enchanter, Diver, 0.25),
    (Enchanter, BattleMage, 0.2),
    (Enchanter, ArtilleryMage, 0.3),
    (Enchanter, BurstMage, 0.15),
    (Enchanter, Warden, 0.1),
    (Enchanter, Enchanter, -0.2),
    (Enchanter, BurstAssassin, -0.1),
    (Warden, ArtilleryMage, 0.35),
    (Warden, BattleMage, 0.25),
    (Warden, BurstMage, 0.2),
    (Warden, Juggernaut, 0.1),
    (Warden, Warden, -0.15),
    (Catcher, BurstAssassin, 0.45),
    (Catcher, BurstMage, 0.4),
    (Catcher, ArtilleryMage, 0.3),
    (Catcher, Diver, 0.2),
    (Catcher, Skirmisher, 0.15),
    (Catcher, Catcher, -0.1),
    (BurstMage, Diver, 0.3),
    (BurstMage, Juggernaut, 0.2),
    (BurstMage, BurstAssassin, 0.1),
    (BurstMage, BurstMage, -0.15),
    (ArtilleryMage, ArtilleryMage, 0.2),
    (ArtilleryMage, Juggernaut, 0.1),
    (ArtilleryMage, Diver, -0.2),
    (ArtilleryMage, BurstAssassin, -0.15),
    (BattleMage, Diver, 0.35),
    (BattleMage, Juggernaut, 0.25),
    (BattleMage, BattleMage, -0.1),
    (BurstAssassin, Diver, 0.3),
    (BurstAssassin, Skirmisher, 0.15),
    (BurstAssassin, BurstAssassin, -0.2),
    (Diver, Juggernaut, 0.2),
    (Diver, Skirmisher, 0.2),
    (Diver, Diver, 0.1),
    (Skirmisher, Juggernaut, 0.1),
    (Skirmisher, Skirmisher, -0.2),
    (Juggernaut, Juggernaut, -0.1),
    (Specialist, Enchanter, 0.1),
];

/// Directional edges; the mirrored cell gets the negated value unless an
/// explicit asymmetric entry below overrides it.
const AUTHORED_COUNTER: &[(Archetype, Archetype, f64)] = &[
    (Warden, BurstAssassin, 0.5),
    (EngageTank, ArtilleryMage, 0.4),
    (BurstAssassin, ArtilleryMage, 0.45),
    (BurstAssassin, Marksman, 0.4),
    (BurstAssassin, Enchanter, 0.3),
    (BurstAssassin, BurstMage, 0.2),
    (Diver, Marksman, 0.35),
    (Diver, BurstMage, 0.3),
    (Diver, ArtilleryMage, 0.35),
    (ArtilleryMage, Juggernaut, 0.4),
    (ArtilleryMage, BattleMage, 0.3),
    (ArtilleryMage, Enchanter, 0.15),
    (Marksman, Juggernaut, 0.3),
    (Marksman, EngageTank, 0.15),
    (BattleMage, Diver, 0.25),
    (BattleMage, Skirmisher, 0.2),
    (Warden, Diver, 0.3),
    (Enchanter, Diver, 0.2),
    (Catcher, BurstAssassin, 0.3),
    (Catcher, Marksman, 0.2),
    (Juggernaut, Skirmisher, 0.15),
    (Juggernaut, EngageTank, 0.1),
    (Skirmisher, Diver, 0.15),
    (Skirmisher, ArtilleryMage, 0.25),
    (EngageTank, Marksman, -0.15),
    (BurstMage, Juggernaut, 0.2),
    (BurstMage, EngageTank, -0.1),
];

/// Applied after the mirrored defaults.
const ASYMMETRIC_COUNTER: &[(Archetype, Archetype, f64)] = &[
    (Catcher, Enchanter, 0.2),
    (Enchanter, Catcher, -0.1),
    (Specialist, Juggernaut, 0.1),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellOverride {
    pub a: String,
    pub b: String,
    pub score: f64,
}

/// Shape of `matrix.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatrixOverrides {
    #[serde(default)]
    pub synergy: Vec<CellOverride>,
    #[serde(default)]
    pub counter: Vec<CellOverride>,
}

impl MatrixOverrides {
    pub fn load(path: &Path) -> Result<Self, DraftError> {
        let content = fs::read_to_string(path).map_err(|e| {
            DraftError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            DraftError::JsonError(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.synergy.is_empty() && self.counter.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynergyCounterMatrix {
    synergy: Table,
    counter: Table,
}

impl Default for SynergyCounterMatrix {
    fn default() -> Self {
        SynergyCounterMatrix::authored()
    }
}

impl SynergyCounterMatrix {
    /// All cells neutral.
    pub fn empty() -> Self {
        SynergyCounterMatrix {
            synergy: [[0.0; N]; N],
            counter: [[0.0; N]; N],
        }
    }

    pub fn authored() -> Self {
        let mut matrix = SynergyCounterMatrix::empty();
        for (a, b, score) in AUTHORED_SYNERGY {
            matrix.set_synergy(*a, *b, *score);
        }
        for (a, b, score) in AUTHORED_COUNTER {
            matrix.counter[idx(*a)][idx(*b)] = *score;
            matrix.counter[idx(*b)][idx(*a)] = -*score;
        }
        for (a, b, score) in ASYMMETRIC_COUNTER {
            matrix.set_counter(*a, *b, *score);
        }
        matrix
    }

    pub fn set_synergy(&mut self, a: Archetype, b: Archetype, score: f64) {
        self.synergy[idx(a)][idx(b)] = score;
        self.synergy[idx(b)][idx(a)] = score;
    }

    pub fn set_counter(&mut self, a: Archetype, b: Archetype, score: f64) {
        self.counter[idx(a)][idx(b)] = score;
    }

    pub fn synergy(&self, a: Archetype, b: Archetype) -> f64 {
        self.synergy[idx(a)][idx(b)]
    }

    pub fn counter(&self, a: Archetype, b: Archetype) -> f64 {
        self.counter[idx(a)][idx(b)]
    }

    /// Sum of synergy over every unordered pair of distinct roster positions.
    /// Two champions sharing an archetype still form a pair; a single
    /// champion contributes nothing.
    pub fn team_synergy(&self, archetypes: &[Archetype]) -> f64 {
        let mut total = 0.0;
        for (i, a) in archetypes.iter().enumerate() {
            for b in &archetypes[i + 1..] {
                total += self.synergy(*a, *b);
            }
        }
        total
    }

    /// Sum of directional counter scores over ours x theirs. Positive favors
    /// `ours`.
    pub fn counter_advantage(&self, ours: &[Archetype], theirs: &[Archetype]) -> f64 {
        // fold from +0.0: an empty f64 sum is -0.0
        ours.iter()
            .flat_map(|a| theirs.iter().map(move |b| self.counter(*a, *b)))
            .fold(0.0, |acc, v| acc + v)
    }

    /// Replaces individual cells. Cells naming an unknown archetype or
    /// carrying a non-finite score are skipped and listed in the report.
    pub fn apply_overrides(&mut self, overrides: &MatrixOverrides) -> OverrideReport {
        let mut report = OverrideReport::default();
        for (kind, cells) in [("synergy", &overrides.synergy), ("counter", &overrides.counter)] {
            for cell in cells {
                match (Archetype::from_key(&cell.a), Archetype::from_key(&cell.b)) {
                    (Some(a), Some(b)) if cell.score.is_finite() => {
                        if kind == "synergy" {
                            self.set_synergy(a, b, cell.score);
                        } else {
                            self.set_counter(a, b, cell.score);
                        }
                        report.applied += 1;
                    }
                    _ => {
                        warn!(kind, a = %cell.a, b = %cell.b, "ignoring matrix override");
                        report.skipped.push(format!("{} {}/{}", kind, cell.a, cell.b));
                    }
                }
            }
        }
        if report.applied > 0 {
            info!(cells = report.applied, "matrix overrides applied");
        }
        report
    }
}

/// Outcome of [`SynergyCounterMatrix::apply_overrides`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideReport {
    pub applied: usize,
    /// `"<kind> <a>/<b>"` for every rejected cell.
    pub skipped: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn archetype_strategy() -> impl Strategy<Value = Archetype> {
        (0usize..N).prop_map(|i| Archetype::PRIORITY[i])
    }

    #[test]
    fn authored_synergy_is_symmetric() {
        let matrix = SynergyCounterMatrix::authored();
        for a in Archetype::PRIORITY {
            for b in Archetype::PRIORITY {
                assert_eq!(matrix.synergy(a, b), matrix.synergy(b, a), "{} / {}", a, b);
            }
        }
    }

    #[test]
    fn team_synergy_skips_self_pairing() {
        let matrix = SynergyCounterMatrix::authored();
        assert_eq!(matrix.team_synergy(&[]), 0.0);
        assert_eq!(matrix.team_synergy(&[Marksman]), 0.0);
        assert_eq!(matrix.team_synergy(&[Marksman, EngageTank]), 0.5);
        // Three pairs: M-E, M-B, E-B
        let expected = 0.5 + 0.2 + 0.45;
        let got = matrix.team_synergy(&[Marksman, EngageTank, BurstMage]);
        assert!((got - expected).abs() < 1e-12);
    }

    #[test]
    fn counter_is_directional() {
        let matrix = SynergyCounterMatrix::authored();
        assert_eq!(matrix.counter(Warden, BurstAssassin), 0.5);
        assert_eq!(matrix.counter(BurstAssassin, Warden), -0.5);
        assert_eq!(matrix.counter(Catcher, Enchanter), 0.2);
        assert_eq!(matrix.counter(Enchanter, Catcher), -0.1);
    }

    #[test]
    fn counter_advantage_sums_cartesian_product() {
        let matrix = SynergyCounterMatrix::authored();
        let got = matrix.counter_advantage(&[BurstAssassin], &[Marksman, ArtilleryMage]);
        assert!((got - 0.85).abs() < 1e-12);
        assert_eq!(matrix.counter_advantage(&[], &[Marksman]), 0.0);
    }

    #[test]
    fn absent_cells_are_neutral() {
        let matrix = SynergyCounterMatrix::empty();
        assert_eq!(matrix.synergy(Specialist, Diver), 0.0);
        assert_eq!(matrix.counter_advantage(&[Specialist], &[Diver, Warden]), 0.0);
    }

    #[test]
    fn overrides_replace_cells_and_keep_symmetry() {
        let mut matrix = SynergyCounterMatrix::authored();
        let overrides = MatrixOverrides {
            synergy: vec![CellOverride {
                a: "diver".into(),
                b: "enchanter".into(),
                score: 0.9,
            }],
            counter: vec![
                CellOverride {
                    a: "marksman".into(),
                    b: "diver".into(),
                    score: 0.05,
                },
                CellOverride {
                    a: "not_an_archetype".into(),
                    b: "diver".into(),
                    score: 1.0,
                },
            ],
        };
        let report = matrix.apply_overrides(&overrides);
        assert_eq!(report.applied, 2);
        assert_eq!(report.skipped, vec!["counter not_an_archetype/diver".to_string()]);
        assert_eq!(matrix.synergy(Enchanter, Diver), 0.9);
        assert_eq!(matrix.synergy(Diver, Enchanter), 0.9);
        assert_eq!(matrix.counter(Marksman, Diver), 0.05);
        assert_eq!(matrix.counter(Diver, Marksman), 0.35);
    }

    #[test]
    fn counter_against_empty_side_is_positive_zero() {
        let matrix = SynergyCounterMatrix::authored();
        let advantage = matrix.counter_advantage(&[Marksman], &[]);
        assert_eq!(advantage, 0.0);
        assert!(advantage.is_sign_positive());
        assert_eq!(serde_json::to_string(&advantage).unwrap(), "0.0");
    }

    proptest! {
        #[test]
        fn synergy_stays_symmetric_after_overrides(
            a in archetype_strategy(),
            b in archetype_strategy(),
            score in -1.0f64..1.0,
        ) {
            let mut matrix = SynergyCounterMatrix::authored();
            matrix.set_synergy(a, b, score);
            for x in Archetype::PRIORITY {
                for y in Archetype::PRIORITY {
                    prop_assert_eq!(matrix.synergy(x, y), matrix.synergy(y, x));
                }
            }
        }

        #[test]
        fn team_synergy_ignores_roster_order(
            roster in proptest::collection::vec(archetype_strategy(), 0..=5),
        ) {
            let matrix = SynergyCounterMatrix::authored();
            let mut reversed = roster.clone();
            reversed.reverse();
            let forward = matrix.team_synergy(&roster);
            let backward = matrix.team_synergy(&reversed);
            prop_assert!((forward - backward).abs() < 1e-9);
        }
    }
}
