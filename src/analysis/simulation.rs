//! Seeded mass simulation of random legal drafts.
//!
//! Each game draws one champion per role for both sides without repeats,
//! projects it with the ensemble and samples the winner from the blended
//! probability. Results aggregate by composition matchup.

use super::composition::CompositionType;
use super::ensemble::EnsemblePredictor;
use super::features::RosterEntry;
use super::matrix::SynergyCounterMatrix;
use super::store::{AttributeStore, Champion};
use crate::draft::{Role, Team};
use crate::error::DraftError;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WinRecord {
    pub games: usize,
    pub wins: usize,
}

impl WinRecord {
    fn record(&mut self, won: bool) {
        self.games += 1;
        if won {
            self.wins += 1;
        }
    }

    pub fn win_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.wins as f64 / self.games as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub games: usize,
    pub seed: u64,
    pub blue_wins: usize,
    pub average_blue_probability: f64,
    pub average_confidence: f64,
    /// Keyed by composition type.
    pub compositions: BTreeMap<String, WinRecord>,
    /// Keyed by "<ours> vs <theirs>", from the first side's perspective.
    pub matchups: BTreeMap<String, WinRecord>,
    pub generated_at: DateTime<Utc>,
}

impl SimulationSummary {
    pub fn blue_win_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.blue_wins as f64 / self.games as f64
        }
    }
}

fn random_roster<'a>(
    by_role: &[(Role, Vec<&'a Champion>)],
    used: &mut HashSet<&'a str>,
    rng: &mut ChaCha8Rng,
) -> Result<Vec<RosterEntry<'a>>, DraftError> {
    let mut roster = Vec::with_capacity(by_role.len());
    for (role, candidates) in by_role {
        let open: Vec<&'a Champion> = candidates
            .iter()
            .copied()
            .filter(|c| !used.contains(c.key.as_str()))
            .collect();
        let champion = open.choose(rng).copied().ok_or_else(|| {
            DraftError::DataError(format!("not enough champions to fill {}", role))
        })?;
        used.insert(champion.key.as_str());
        roster.push(RosterEntry::new(champion, *role));
    }
    Ok(roster)
}

/// Runs `games` drafts. `on_game` is called after every game with the
/// number completed so far.
pub fn simulate(
    store: &AttributeStore,
    matrix: &SynergyCounterMatrix,
    predictor: &EnsemblePredictor,
    games: usize,
    seed: u64,
    mut on_game: impl FnMut(usize),
) -> Result<SimulationSummary, DraftError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let by_role: Vec<(Role, Vec<&Champion>)> = Role::ALL
        .iter()
        .map(|role| (*role, store.playable_in(*role).collect()))
        .collect();

    let mut blue_wins = 0;
    let mut probability_total = 0.0;
    let mut confidence_total = 0.0;
    let mut compositions: BTreeMap<String, WinRecord> = BTreeMap::new();
    let mut matchups: BTreeMap<String, WinRecord> = BTreeMap::new();

    for game in 0..games {
        let mut used = HashSet::new();
        let blue = random_roster(&by_role, &mut used, &mut rng)?;
        let red = random_roster(&by_role, &mut used, &mut rng)?;

        let projection = predictor.predict(&blue, &red, matrix);
        let winner = if rng.gen::<f64>() < projection.blue {
            Team::Blue
        } else {
            Team::Red
        };
        if winner == Team::Blue {
            blue_wins += 1;
        }
        probability_total += projection.blue;
        confidence_total += projection.confidence;

        let comp = |roster: &[RosterEntry<'_>]| {
            let archetypes: Vec<_> = roster.iter().map(|e| e.champion.primary_archetype).collect();
            CompositionType::infer(&archetypes)
        };
        let (blue_comp, red_comp) = (comp(&blue), comp(&red));

        compositions
            .entry(blue_comp.key().to_string())
            .or_default()
            .record(winner == Team::Blue);
        compositions
            .entry(red_comp.key().to_string())
            .or_default()
            .record(winner == Team::Red);
        matchups
            .entry(format!("{} vs {}", blue_comp, red_comp))
            .or_default()
            .record(winner == Team::Blue);
        if blue_comp != red_comp {
            matchups
                .entry(format!("{} vs {}", red_comp, blue_comp))
                .or_default()
                .record(winner == Team::Red);
        }

        on_game(game + 1);
    }

    let divisor = games.max(1) as f64;
    let summary = SimulationSummary {
        games,
        seed,
        blue_wins,
        average_blue_probability: probability_total / divisor,
        average_confidence: confidence_total / divisor,
        compositions,
        matchups,
        generated_at: Utc::now(),
    };
    info!(
        games,
        seed,
        blue_win_rate = summary.blue_win_rate(),
        "simulation finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::classifier::ArchetypeClassifier;
    use crate::analysis::ensemble::{LogisticModel, WinClassifier};
    use crate::analysis::features::FeatureIndex;
    use crate::analysis::store::{ChampionRecord, Positions};

    fn store(per_role: usize) -> AttributeStore {
        let tags = ["Vanguard", "Diver", "Burst", "Marksman", "Enchanter"];
        let mut records = Vec::new();
        for (i, role) in Role::ALL.iter().enumerate() {
            for n in 0..per_role {
                records.push(ChampionRecord {
                    name: format!("{}{}", role.as_str(), n),
                    positions: Positions {
                        primary: Some(*role),
                        viable: vec![*role],
                    },
                    class_tags: vec![tags[i].to_string()],
                    attributes: None,
                });
            }
        }
        AttributeStore::from_records(records, &ArchetypeClassifier::standard(0.7)).unwrap()
    }

    fn predictor() -> EnsemblePredictor {
        let index = FeatureIndex::resolve(&["diff.agg_filled".to_string()]).unwrap();
        let model: Box<dyn WinClassifier> = Box::new(LogisticModel {
            name: "lr".into(),
            historical_accuracy: 0.54,
            coefficients: vec![1.0],
            intercept: 0.3,
        });
        EnsemblePredictor::new(index, vec![model], 0.0).unwrap()
    }

    #[test]
    fn same_seed_same_summary() {
        let store = store(3);
        let matrix = SynergyCounterMatrix::authored();
        let predictor = predictor();
        let a = simulate(&store, &matrix, &predictor, 40, 7, |_| {}).unwrap();
        let b = simulate(&store, &matrix, &predictor, 40, 7, |_| {}).unwrap();

        assert_eq!(a.blue_wins, b.blue_wins);
        assert_eq!(a.compositions, b.compositions);
        assert_eq!(a.games, 40);
        let total: usize = a.compositions.values().map(|r| r.games).sum();
        assert_eq!(total, 80);
    }

    #[test]
    fn progress_reports_every_game() {
        let store = store(2);
        let matrix = SynergyCounterMatrix::authored();
        let mut calls = 0;
        simulate(&store, &matrix, &predictor(), 5, 1, |n| calls = n).unwrap();
        assert_eq!(calls, 5);
    }

    #[test]
    fn thin_roster_is_a_data_error() {
        let store = store(1);
        let matrix = SynergyCounterMatrix::authored();
        let result = simulate(&store, &matrix, &predictor(), 1, 1, |_| {});
        assert!(matches!(result, Err(DraftError::DataError(_))));
    }
}
