//! In-memory champion index, built once at load time.

use super::archetype::Archetype;
use super::classifier::{ArchetypeClassifier, ArchetypeSource};
use crate::draft::Role;
use crate::error::DraftError;
use crate::names::canonical_key;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeDimension {
    SustainedDps,
    BurstIndex,
    MobilityScore,
    CcScore,
    MaxRange,
    AdRatio,
    ApRatio,
}

impl AttributeDimension {
    pub const ALL: [AttributeDimension; 7] = [
        AttributeDimension::SustainedDps,
        AttributeDimension::BurstIndex,
        AttributeDimension::MobilityScore,
        AttributeDimension::CcScore,
        AttributeDimension::MaxRange,
        AttributeDimension::AdRatio,
        AttributeDimension::ApRatio,
    ];

    pub fn key(self) -> &'static str {
        match self {
            AttributeDimension::SustainedDps => "sustained_dps",
            AttributeDimension::BurstIndex => "burst_index",
            AttributeDimension::MobilityScore => "mobility_score",
            AttributeDimension::CcScore => "cc_score",
            AttributeDimension::MaxRange => "max_range",
            AttributeDimension::AdRatio => "ad_ratio",
            AttributeDimension::ApRatio => "ap_ratio",
        }
    }
}

/// Computed numeric attributes. Any dimension may be unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChampionAttributes {
    #[serde(default)]
    pub sustained_dps: Option<f64>,
    #[serde(default)]
    pub burst_index: Option<f64>,
    #[serde(default)]
    pub mobility_score: Option<f64>,
    #[serde(default)]
    pub cc_score: Option<f64>,
    #[serde(default)]
    pub max_range: Option<f64>,
    #[serde(default)]
    pub ad_ratio: Option<f64>,
    #[serde(default)]
    pub ap_ratio: Option<f64>,
}

impl ChampionAttributes {
    /// Non-finite values count as unknown.
    pub fn get(&self, dimension: AttributeDimension) -> Option<f64> {
        let value = match dimension {
            AttributeDimension::SustainedDps => self.sustained_dps,
            AttributeDimension::BurstIndex => self.burst_index,
            AttributeDimension::MobilityScore => self.mobility_score,
            AttributeDimension::CcScore => self.cc_score,
            AttributeDimension::MaxRange => self.max_range,
            AttributeDimension::AdRatio => self.ad_ratio,
            AttributeDimension::ApRatio => self.ap_ratio,
        };
        value.filter(|v| v.is_finite())
    }

    pub fn is_complete(&self) -> bool {
        AttributeDimension::ALL.iter().all(|d| self.get(*d).is_some())
    }

    pub fn missing(&self) -> Vec<AttributeDimension> {
        AttributeDimension::ALL
            .iter()
            .copied()
            .filter(|d| self.get(*d).is_none())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    Complete,
    Partial,
    /// No attribute record at all.
    Missing,
}

/// Categorical labels derived from the numeric attributes and the primary
/// archetype. Feature extraction counts these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeTag {
    DamagePhysical,
    DamageMagic,
    DamageMixed,
    DamageBurst,
    DamageSustained,
    RangeMelee,
    RangeShort,
    RangeMedium,
    RangeLong,
    MobilityHigh,
    MobilityMedium,
    MobilityLow,
    CcHard,
    CcSoft,
    ScalingEarly,
    ScalingLate,
    Engage,
    Peel,
    Frontline,
}

impl AttributeTag {
    pub const ALL: [AttributeTag; 19] = [
        AttributeTag::DamagePhysical,
        AttributeTag::DamageMagic,
        AttributeTag::DamageMixed,
        AttributeTag::DamageBurst,
        AttributeTag::DamageSustained,
        AttributeTag::RangeMelee,
        AttributeTag::RangeShort,
        AttributeTag::RangeMedium,
        AttributeTag::RangeLong,
        AttributeTag::MobilityHigh,
        AttributeTag::MobilityMedium,
        AttributeTag::MobilityLow,
        AttributeTag::CcHard,
        AttributeTag::CcSoft,
        AttributeTag::ScalingEarly,
        AttributeTag::ScalingLate,
        AttributeTag::Engage,
        AttributeTag::Peel,
        AttributeTag::Frontline,
    ];

    pub fn key(self) -> &'static str {
        match self {
            AttributeTag::DamagePhysical => "damage_physical",
            AttributeTag::DamageMagic => "damage_magic",
            AttributeTag::DamageMixed => "damage_mixed",
            AttributeTag::DamageBurst => "damage_burst",
            AttributeTag::DamageSustained => "damage_sustained",
            AttributeTag::RangeMelee => "range_melee",
            AttributeTag::RangeShort => "range_short",
            AttributeTag::RangeMedium => "range_medium",
            AttributeTag::RangeLong => "range_long",
            AttributeTag::MobilityHigh => "mobility_high",
            AttributeTag::MobilityMedium => "mobility_medium",
            AttributeTag::MobilityLow => "mobility_low",
            AttributeTag::CcHard => "cc_hard",
            AttributeTag::CcSoft => "cc_soft",
            AttributeTag::ScalingEarly => "scaling_early",
            AttributeTag::ScalingLate => "scaling_late",
            AttributeTag::Engage => "engage",
            AttributeTag::Peel => "peel",
            AttributeTag::Frontline => "frontline",
        }
    }

    pub fn derive(attributes: &ChampionAttributes, primary: Archetype) -> BTreeSet<AttributeTag> {
        let mut tags = BTreeSet::new();

        let ratios = (
            attributes.get(AttributeDimension::AdRatio),
            attributes.get(AttributeDimension::ApRatio),
        );
        match ratios {
            (Some(ad), Some(ap)) if ad > 0.0 && ad >= ap * 1.5 => {
                tags.insert(AttributeTag::DamagePhysical);
            }
            (Some(ad), Some(ap)) if ap > 0.0 && ap >= ad * 1.5 => {
                tags.insert(AttributeTag::DamageMagic);
            }
            (Some(ad), Some(ap)) if ad > 0.0 && ap > 0.0 => {
                tags.insert(AttributeTag::DamageMixed);
            }
            _ => {}
        }

        if let Some(burst) = attributes.get(AttributeDimension::BurstIndex) {
            if burst >= 0.6 {
                tags.insert(AttributeTag::DamageBurst);
            }
        }
        if let Some(dps) = attributes.get(AttributeDimension::SustainedDps) {
            if dps >= 110.0 {
                tags.insert(AttributeTag::DamageSustained);
            }
        }
        if let Some(range) = attributes.get(AttributeDimension::MaxRange) {
            tags.insert(if range < 250.0 {
                AttributeTag::RangeMelee
            } else if range < 500.0 {
                AttributeTag::RangeShort
            } else if range < 800.0 {
                AttributeTag::RangeMedium
            } else {
                AttributeTag::RangeLong
            });
        }
        let mobility = attributes.get(AttributeDimension::MobilityScore);
        if let Some(mobility) = mobility {
            tags.insert(if mobility >= 0.6 {
                AttributeTag::MobilityHigh
            } else if mobility >= 0.3 {
                AttributeTag::MobilityMedium
            } else {
                AttributeTag::MobilityLow
            });
        }
        let cc = attributes.get(AttributeDimension::CcScore);
        if let Some(cc) = cc {
            if cc >= 0.6 {
                tags.insert(AttributeTag::CcHard);
            } else if cc >= 0.3 {
                tags.insert(AttributeTag::CcSoft);
            }
        }
        if let (Some(ad), Some(ap)) = ratios {
            let scaling = ad + ap;
            if scaling >= 3.0 {
                tags.insert(AttributeTag::ScalingLate);
            } else if scaling <= 1.2 {
                tags.insert(AttributeTag::ScalingEarly);
            }
        }

        let engage_kit = matches!((cc, mobility), (Some(cc), Some(m)) if cc >= 0.6 && m >= 0.4);
        if primary.is_hard_engage() || engage_kit {
            tags.insert(AttributeTag::Engage);
        }
        if primary.is_peel() || primary == Archetype::Catcher {
            tags.insert(AttributeTag::Peel);
        }
        if matches!(
            primary,
            Archetype::EngageTank | Archetype::Warden | Archetype::Juggernaut
        ) {
            tags.insert(AttributeTag::Frontline);
        }

        tags
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Positions {
    #[serde(default)]
    pub primary: Option<Role>,
    #[serde(default)]
    pub viable: Vec<Role>,
}

/// One entry of `champions.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampionRecord {
    pub name: String,
    #[serde(default)]
    pub positions: Positions,
    #[serde(default)]
    pub class_tags: Vec<String>,
    #[serde(default)]
    pub attributes: Option<ChampionAttributes>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChampionFile {
    pub champions: Vec<ChampionRecord>,
}

/// A classified champion. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct Champion {
    pub name: String,
    pub key: String,
    pub attributes: ChampionAttributes,
    pub quality: DataQuality,
    pub primary_role: Option<Role>,
    pub viable_roles: Vec<Role>,
    pub class_tags: Vec<String>,
    pub membership: BTreeMap<Archetype, f64>,
    pub primary_archetype: Archetype,
    pub secondary_archetypes: Vec<Archetype>,
    pub archetype_source: ArchetypeSource,
    pub reduced_confidence: bool,
    pub tags: BTreeSet<AttributeTag>,
}

impl Champion {
    pub fn from_record(record: ChampionRecord, classifier: &ArchetypeClassifier) -> Self {
        let quality = match &record.attributes {
            None => DataQuality::Missing,
            Some(attrs) if attrs.is_complete() => DataQuality::Complete,
            Some(_) => DataQuality::Partial,
        };
        let attributes = record.attributes.unwrap_or_default();
        let classification = classifier.classify_with_authority(&attributes, &record.class_tags);
        let tags = AttributeTag::derive(&attributes, classification.primary);

        let mut viable_roles: Vec<Role> = Vec::new();
        for role in record.positions.primary.iter().chain(record.positions.viable.iter()) {
            if !viable_roles.contains(role) {
                viable_roles.push(*role);
            }
        }
        let primary_role = record.positions.primary.or_else(|| viable_roles.first().copied());

        Champion {
            key: canonical_key(&record.name),
            name: record.name,
            attributes,
            quality,
            primary_role,
            viable_roles,
            class_tags: record.class_tags,
            membership: classification.membership,
            primary_archetype: classification.primary,
            secondary_archetypes: classification.secondary,
            archetype_source: classification.source,
            reduced_confidence: classification.reduced_confidence,
            tags,
        }
    }

    pub fn can_play(&self, role: Role) -> bool {
        self.viable_roles.contains(&role)
    }

    /// 1.0 for the primary position, 0.5 for a viable secondary one, else 0.
    pub fn role_fit(&self, role: Role) -> f64 {
        if self.primary_role == Some(role) {
            1.0
        } else if self.can_play(role) {
            0.5
        } else {
            0.0
        }
    }

    pub fn has_tag(&self, tag: AttributeTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn has_attribute_record(&self) -> bool {
        self.quality != DataQuality::Missing
    }
}

pub struct AttributeStore {
    champions: Vec<Champion>,
    index: HashMap<String, usize>,
}

impl AttributeStore {
    pub fn from_records(
        records: Vec<ChampionRecord>,
        classifier: &ArchetypeClassifier,
    ) -> Result<Self, DraftError> {
        let mut champions: Vec<Champion> = records
            .into_iter()
            .map(|record| Champion::from_record(record, classifier))
            .collect();
        champions.sort_by(|a, b| a.key.cmp(&b.key));

        let mut index = HashMap::with_capacity(champions.len());
        for (idx, champion) in champions.iter().enumerate() {
            if champion.key.is_empty() {
                return Err(DraftError::DataError(format!(
                    "champion name {:?} has no usable characters",
                    champion.name
                )));
            }
            if index.insert(champion.key.clone(), idx).is_some() {
                return Err(DraftError::DataError(format!(
                    "duplicate champion record: {}",
                    champion.name
                )));
            }
            if champion.viable_roles.is_empty() {
                warn!(champion = %champion.name, "champion has no viable positions");
            }
            match champion.quality {
                DataQuality::Missing => {
                    warn!(champion = %champion.name, "no attribute record; using neutral values")
                }
                DataQuality::Partial => debug!(
                    champion = %champion.name,
                    missing = ?champion.attributes.missing(),
                    "partial attribute record"
                ),
                DataQuality::Complete => {}
            }
        }

        Ok(AttributeStore { champions, index })
    }

    pub fn load(path: &Path, classifier: &ArchetypeClassifier) -> Result<Self, DraftError> {
        let content = fs::read_to_string(path).map_err(|e| {
            DraftError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let file: ChampionFile = serde_json::from_str(&content).map_err(|e| {
            DraftError::JsonError(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        let store = Self::from_records(file.champions, classifier)?;
        info!(champions = store.len(), path = %path.display(), "champion data loaded");
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.champions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.champions.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Champion> {
        self.index
            .get(&canonical_key(name))
            .map(|idx| &self.champions[*idx])
    }

    /// Like [`get`](Self::get) but an unknown name is a validation failure.
    pub fn resolve(&self, name: &str) -> Result<&Champion, DraftError> {
        self.get(name)
            .ok_or_else(|| DraftError::UnknownChampion(name.to_string()))
    }

    /// Champions in canonical-key order.
    pub fn iter(&self) -> impl Iterator<Item = &Champion> {
        self.champions.iter()
    }

    pub fn playable_in(&self, role: Role) -> impl Iterator<Item = &Champion> {
        self.champions.iter().filter(move |c| c.can_play(role))
    }

    pub fn count_by_quality(&self, quality: DataQuality) -> usize {
        self.champions.iter().filter(|c| c.quality == quality).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, tags: &[&str], attributes: Option<ChampionAttributes>) -> ChampionRecord {
        ChampionRecord {
            name: name.to_string(),
            positions: Positions {
                primary: Some(Role::Middle),
                viable: vec![Role::Middle, Role::Utility],
            },
            class_tags: tags.iter().map(|t| t.to_string()).collect(),
            attributes,
        }
    }

    #[test]
    fn lookup_goes_through_canonical_key() {
        let classifier = ArchetypeClassifier::standard(0.7);
        let store = AttributeStore::from_records(
            vec![record("Kai'Sa", &["Marksman"], Some(ChampionAttributes::default()))],
            &classifier,
        )
        .unwrap();

        assert!(store.get("kaisa").is_some());
        assert!(store.get("KAI SA").is_some());
        assert!(matches!(store.resolve("Kaisaa"), Err(DraftError::UnknownChampion(_))));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let classifier = ArchetypeClassifier::standard(0.7);
        let result = AttributeStore::from_records(
            vec![record("Lee Sin", &[], None), record("leesin", &[], None)],
            &classifier,
        );
        assert!(matches!(result, Err(DraftError::DataError(_))));
    }

    #[test]
    fn data_quality_tracks_attribute_record() {
        let classifier = ArchetypeClassifier::standard(0.7);
        let partial = ChampionAttributes {
            sustained_dps: Some(90.0),
            ..Default::default()
        };
        let store = AttributeStore::from_records(
            vec![record("Hwei", &["Artillery"], None), record("Viktor", &[], Some(partial))],
            &classifier,
        )
        .unwrap();

        let hwei = store.get("Hwei").unwrap();
        assert_eq!(hwei.quality, DataQuality::Missing);
        assert!(hwei.reduced_confidence);
        assert_eq!(hwei.primary_archetype, Archetype::ArtilleryMage);

        let viktor = store.get("Viktor").unwrap();
        assert_eq!(viktor.quality, DataQuality::Partial);
        assert_eq!(viktor.archetype_source, ArchetypeSource::Fuzzy);
    }

    #[test]
    fn role_fit_grades_primary_and_secondary_positions() {
        let classifier = ArchetypeClassifier::standard(0.7);
        let champion = Champion::from_record(record("Lux", &["Burst"], None), &classifier);
        assert_eq!(champion.role_fit(Role::Middle), 1.0);
        assert_eq!(champion.role_fit(Role::Utility), 0.5);
        assert_eq!(champion.role_fit(Role::Top), 0.0);
    }

    #[test]
    fn tags_follow_thresholds_and_archetype() {
        let attrs = ChampionAttributes {
            sustained_dps: Some(60.0),
            burst_index: Some(0.3),
            mobility_score: Some(0.45),
            cc_score: Some(0.9),
            max_range: Some(300.0),
            ad_ratio: Some(0.3),
            ap_ratio: Some(0.8),
        };
        let tags = AttributeTag::derive(&attrs, Archetype::EngageTank);
        for expected in [
            AttributeTag::DamageMagic,
            AttributeTag::RangeShort,
            AttributeTag::MobilityMedium,
            AttributeTag::CcHard,
            AttributeTag::ScalingEarly,
            AttributeTag::Engage,
            AttributeTag::Frontline,
        ] {
            assert!(tags.contains(&expected), "missing {:?}", expected);
        }
        assert!(!tags.contains(&AttributeTag::Peel));
    }
}
