use draft_engine::analysis::classifier::ArchetypeClassifier;
use draft_engine::analysis::store::ChampionAttributes;
use draft_engine::api::models::{AnalyzeRequest, RecommendRequest};
use draft_engine::engine::DraftEngine;
use draft_engine::{Config, DraftService, DraftState, Pick, Role};
use proptest::prelude::*;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::OnceLock;

fn service() -> &'static DraftService {
    static SERVICE: OnceLock<DraftService> = OnceLock::new();
    SERVICE.get_or_init(|| {
        let config = Config {
            data_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data"),
            ..Config::default()
        };
        let engine = DraftEngine::load(&config).unwrap();
        DraftService::new(engine, std::env::temp_dir().join("draft_engine_props"))
    })
}

fn champion_names() -> Vec<String> {
    service().engine().store.iter().map(|c| c.name.clone()).collect()
}

fn attribute() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        1 => Just(None),
        1 => Just(Some(f64::NAN)),
        8 => (-100.0f64..4000.0).prop_map(Some),
    ]
}

prop_compose! {
    fn attributes()(
        sustained_dps in attribute(),
        burst_index in attribute(),
        mobility_score in attribute(),
        cc_score in attribute(),
        max_range in attribute(),
        ad_ratio in attribute(),
        ap_ratio in attribute(),
    ) -> ChampionAttributes {
        ChampionAttributes {
            sustained_dps,
            burst_index,
            mobility_score,
            cc_score,
            max_range,
            ad_ratio,
            ap_ratio,
        }
    }
}

proptest! {
    #[test]
    fn memberships_stay_in_unit_interval(attrs in attributes()) {
        let classifier = ArchetypeClassifier::standard(0.7);
        let result = classifier.classify(&attrs);

        for score in result.membership.values() {
            prop_assert!((0.0..=1.0).contains(score));
        }
        let best = result.membership.values().cloned().fold(0.0, f64::max);
        prop_assert_eq!(result.membership[&result.primary], best);
        prop_assert!(!result.secondary.contains(&result.primary));
    }

    #[test]
    fn taken_champions_are_never_recommended(
        taken in Just(champion_names()).prop_flat_map(|names| proptest::sample::subsequence(names, 0..=10)),
        limit in 1usize..=20,
    ) {
        let mut draft = DraftState::new();
        let split = taken.len().min(5);
        draft.blue.bans = taken[..split].to_vec();
        draft.red.bans = taken[split..].to_vec();

        let request = RecommendRequest {
            draft,
            limit: Some(limit),
            ..Default::default()
        };
        let response = service().recommend(&request).unwrap();
        let recs = &response.slots[0].recommendations;

        prop_assert!(recs.len() <= limit);
        let names: HashSet<&str> = recs.iter().map(|r| r.champion.as_str()).collect();
        prop_assert_eq!(names.len(), recs.len());
        for banned in &taken {
            prop_assert!(!names.contains(banned.as_str()));
        }
    }

    #[test]
    fn win_probabilities_sum_to_one(picks in proptest::collection::vec(0usize..64, 10)) {
        let engine = service().engine();
        let mut used = HashSet::new();
        let mut rosters: [Vec<Pick>; 2] = [Vec::new(), Vec::new()];

        for (slot, choice) in picks.iter().enumerate() {
            let role = Role::ALL[slot % 5];
            let candidates: Vec<_> = engine.store.playable_in(role).collect();
            let champion = candidates[choice % candidates.len()];
            prop_assume!(used.insert(champion.key.clone()));
            rosters[slot / 5].push(Pick::new(champion.name.as_str(), role));
        }

        let [blue, red] = rosters;
        let response = service().analyze(&AnalyzeRequest { blue, red }).unwrap();
        let prediction = &response.prediction;

        prop_assert!((0.0..=1.0).contains(&prediction.blue_win_probability));
        prop_assert!((prediction.blue_win_probability + prediction.red_win_probability - 1.0).abs() < 1e-9);
        prop_assert!((0.5..=1.0).contains(&prediction.confidence));
    }
}
