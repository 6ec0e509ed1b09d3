//! Team composition labels, draft-state gaps and match narrative.

use super::archetype::Archetype;
use super::ensemble::WinProjection;
use super::matrix::SynergyCounterMatrix;
use super::store::{AttributeTag, Champion};
use crate::draft::Team;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionType {
    Dive,
    FrontToBack,
    Poke,
    Pick,
    SplitPush,
    Mixed,
}

impl CompositionType {
    pub fn key(self) -> &'static str {
        match self {
            CompositionType::Dive => "dive",
            CompositionType::FrontToBack => "front_to_back",
            CompositionType::Poke => "poke",
            CompositionType::Pick => "pick",
            CompositionType::SplitPush => "split_push",
            CompositionType::Mixed => "mixed",
        }
    }

    /// First matching rule wins.
    pub fn infer(archetypes: &[Archetype]) -> CompositionType {
        let count = |pred: fn(&Archetype) -> bool| archetypes.iter().filter(|a| pred(a)).count();
        let has = |a: Archetype| archetypes.contains(&a);

        if count(|a| a.is_hard_engage()) >= 2 {
            return CompositionType::Dive;
        }
        let has_tank = archetypes.iter().any(|a| a.is_tank());
        let has_carry = archetypes.iter().any(|a| a.is_carry());
        let has_peel = archetypes.iter().any(|a| a.is_peel());
        if has_tank && has_carry && has_peel {
            return CompositionType::FrontToBack;
        }
        if count(|a| a.is_poke()) >= 2 {
            return CompositionType::Poke;
        }
        if has(Archetype::Catcher) && (has(Archetype::BurstMage) || has(Archetype::BurstAssassin)) {
            return CompositionType::Pick;
        }
        if count(|a| {
            matches!(
                a,
                Archetype::Skirmisher | Archetype::Juggernaut | Archetype::Specialist
            )
        }) >= 2
        {
            return CompositionType::SplitPush;
        }
        CompositionType::Mixed
    }

    /// Whether `archetype` is one of the pieces this plan is built from.
    /// Mixed has no core.
    pub fn is_core(self, archetype: Archetype) -> bool {
        match self {
            CompositionType::Dive => archetype.is_hard_engage(),
            CompositionType::FrontToBack => {
                archetype.is_tank() || archetype.is_carry() || archetype.is_peel()
            }
            CompositionType::Poke => archetype.is_poke(),
            CompositionType::Pick => matches!(
                archetype,
                Archetype::Catcher | Archetype::BurstMage | Archetype::BurstAssassin
            ),
            CompositionType::SplitPush => matches!(
                archetype,
                Archetype::Skirmisher | Archetype::Juggernaut | Archetype::Specialist
            ),
            CompositionType::Mixed => false,
        }
    }
}

impl fmt::Display for CompositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Coarse head-counts used by narrative and gap detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoleGroups {
    pub damage_dealers: usize,
    pub tanks: usize,
    pub fighters: usize,
    pub supports: usize,
}

impl RoleGroups {
    pub fn count(archetypes: &[Archetype]) -> Self {
        let mut groups = RoleGroups::default();
        for archetype in archetypes {
            if archetype.is_damage_dealer() {
                groups.damage_dealers += 1;
            }
            if archetype.is_tank() {
                groups.tanks += 1;
            }
            if archetype.is_fighter() {
                groups.fighters += 1;
            }
            if archetype.is_support() {
                groups.supports += 1;
            }
        }
        groups
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamComposition {
    /// Primary archetype per pick, in roster order.
    pub archetypes: Vec<Archetype>,
    pub archetype_distribution: BTreeMap<String, usize>,
    pub composition_type: CompositionType,
    pub synergy_score: f64,
    pub groups: RoleGroups,
}

impl TeamComposition {
    pub fn analyze(champions: &[&Champion], matrix: &SynergyCounterMatrix) -> Self {
        let archetypes: Vec<Archetype> = champions.iter().map(|c| c.primary_archetype).collect();
        let mut archetype_distribution = BTreeMap::new();
        for archetype in &archetypes {
            *archetype_distribution.entry(archetype.key().to_string()).or_insert(0) += 1;
        }

        TeamComposition {
            composition_type: CompositionType::infer(&archetypes),
            synergy_score: matrix.team_synergy(&archetypes),
            groups: RoleGroups::count(&archetypes),
            archetype_distribution,
            archetypes,
        }
    }
}

/// What our side still lacks and what the enemy side threatens.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DraftNeeds {
    pub missing_roles: Vec<String>,
    pub threats: Vec<String>,
}

impl DraftNeeds {
    /// Gaps are only reported once our side has picked something.
    pub fn assess(ours: &[Archetype], theirs: &[Archetype]) -> Self {
        let mut needs = DraftNeeds::default();

        if !ours.is_empty() {
            let groups = RoleGroups::count(ours);
            if groups.damage_dealers == 0 {
                needs.missing_roles.push("damage_dealer".to_string());
            }
            if groups.tanks == 0 {
                needs.missing_roles.push("tank".to_string());
            }
            if groups.supports == 0 {
                needs.missing_roles.push("support".to_string());
            }
        }

        if theirs.contains(&Archetype::BurstAssassin) {
            needs.threats.push("assassin_threat".to_string());
        }
        if theirs.iter().filter(|a| a.is_mage()).count() >= 2 {
            needs.threats.push("heavy_magic_damage".to_string());
        }
        if theirs.contains(&Archetype::ArtilleryMage) {
            needs.threats.push("poke_threat".to_string());
        }

        needs
    }
}

fn tag_count(champions: &[&Champion], tag: AttributeTag) -> usize {
    champions.iter().filter(|c| c.has_tag(tag)).count()
}

fn team_label(team: Team) -> &'static str {
    match team {
        Team::Blue => "Blue",
        Team::Red => "Red",
    }
}

/// Narrative lines for a full match analysis, favored team first.
pub fn match_insights(
    blue: (&[&Champion], &TeamComposition),
    red: (&[&Champion], &TeamComposition),
    projection: &WinProjection,
) -> Vec<String> {
    let favored = projection.favored;
    let ((favored_champs, favored_comp), (other_champs, _)) = match favored {
        Team::Blue => (blue, red),
        Team::Red => (red, blue),
    };
    let name = team_label(favored);
    let mut insights = Vec::new();

    let groups = favored_comp.groups;
    if groups.tanks > 1 {
        insights.push(format!(
            "{} team has strong frontline ({} tanks) enabling backline protection",
            name, groups.tanks
        ));
    }
    if groups.damage_dealers >= 3 {
        insights.push(format!(
            "{} team has diverse damage threats ({} damage dealers) spreading enemy resources",
            name, groups.damage_dealers
        ));
    }
    if groups.fighters >= 2 {
        insights.push(format!(
            "{} team has strong skirmishing potential ({} fighters)",
            name, groups.fighters
        ));
    }

    let engage = tag_count(favored_champs, AttributeTag::Engage);
    let peel = tag_count(other_champs, AttributeTag::Peel);
    if engage > peel {
        insights.push(format!(
            "{} team has engage advantage ({} vs {} disengage)",
            name, engage, peel
        ));
    }
    let mobile = tag_count(favored_champs, AttributeTag::MobilityHigh);
    let hard_cc = tag_count(other_champs, AttributeTag::CcHard);
    if mobile > hard_cc {
        insights.push(format!(
            "{} team has mobility advantage ({} mobile vs {} hard CC)",
            name, mobile, hard_cc
        ));
    }
    let long_range = tag_count(favored_champs, AttributeTag::RangeLong);
    if long_range >= 2 {
        insights.push(format!(
            "{} team has strong poke/range control ({} long-range champions)",
            name, long_range
        ));
    }
    if tag_count(favored_champs, AttributeTag::DamageBurst) >= 2
        && tag_count(favored_champs, AttributeTag::DamageSustained) >= 2
    {
        insights.push(format!("{} team has balanced damage profile (burst + sustained)", name));
    }

    insights.push(format!(
        "Team synergy: Blue {:+.2} ({}) vs Red {:+.2} ({})",
        blue.1.synergy_score, blue.1.composition_type, red.1.synergy_score, red.1.composition_type
    ));
    insights.push(projection.agreement.note().to_string());

    insights
}
