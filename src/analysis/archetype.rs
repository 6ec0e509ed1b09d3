use serde::{Deserialize, Serialize};
use std::fmt;

/// The 13 strategic archetypes a champion can partially belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Marksman,
    Enchanter,
    EngageTank,
    Warden,
    Catcher,
    BurstMage,
    ArtilleryMage,
    BattleMage,
    BurstAssassin,
    Diver,
    Skirmisher,
    Juggernaut,
    Specialist,
}

/// Coarser grouping used for diversity control and composition labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchetypeFamily {
    HardEngage,
    Poke,
    CarryScaling,
    Burst,
    Bruiser,
    ControlMage,
    Protect,
    Pick,
    Specialist,
}

impl Archetype {
    /// Declared tie-break priority: when several archetypes share the top
    /// membership, the one listed first wins.
    pub const PRIORITY: [Archetype; 13] = [
        Archetype::Marksman,
        Archetype::Enchanter,
        Archetype::EngageTank,
        Archetype::Warden,
        Archetype::Catcher,
        Archetype::BurstMage,
        Archetype::ArtilleryMage,
        Archetype::BattleMage,
        Archetype::BurstAssassin,
        Archetype::Diver,
        Archetype::Skirmisher,
        Archetype::Juggernaut,
        Archetype::Specialist,
    ];

    pub fn priority(self) -> usize {
        match self {
            Archetype::Marksman => 0,
            Archetype::Enchanter => 1,
            Archetype::EngageTank => 2,
            Archetype::Warden => 3,
            Archetype::Catcher => 4,
            Archetype::BurstMage => 5,
            Archetype::ArtilleryMage => 6,
            Archetype::BattleMage => 7,
            Archetype::BurstAssassin => 8,
            Archetype::Diver => 9,
            Archetype::Skirmisher => 10,
            Archetype::Juggernaut => 11,
            Archetype::Specialist => 12,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Archetype::Marksman => "marksman",
            Archetype::Enchanter => "enchanter",
            Archetype::EngageTank => "engage_tank",
            Archetype::Warden => "warden",
            Archetype::Catcher => "catcher",
            Archetype::BurstMage => "burst_mage",
            Archetype::ArtilleryMage => "artillery_mage",
            Archetype::BattleMage => "battle_mage",
            Archetype::BurstAssassin => "burst_assassin",
            Archetype::Diver => "diver",
            Archetype::Skirmisher => "skirmisher",
            Archetype::Juggernaut => "juggernaut",
            Archetype::Specialist => "specialist",
        }
    }

    pub fn from_key(key: &str) -> Option<Archetype> {
        Archetype::PRIORITY
            .iter()
            .copied()
            .find(|a| a.key() == key.trim().to_ascii_lowercase())
    }

    pub fn label(self) -> String {
        self.key().replace('_', " ")
    }

    /// Maps one authoritative class tag onto an archetype.
    pub fn from_class_tag(tag: &str) -> Option<Archetype> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "marksman" => Some(Archetype::Marksman),
            "enchanter" => Some(Archetype::Enchanter),
            "vanguard" => Some(Archetype::EngageTank),
            "warden" => Some(Archetype::Warden),
            "catcher" => Some(Archetype::Catcher),
            "burst" => Some(Archetype::BurstMage),
            "artillery" => Some(Archetype::ArtilleryMage),
            "battlemage" => Some(Archetype::BattleMage),
            "assassin" => Some(Archetype::BurstAssassin),
            "diver" => Some(Archetype::Diver),
            "skirmisher" => Some(Archetype::Skirmisher),
            "juggernaut" => Some(Archetype::Juggernaut),
            "specialist" => Some(Archetype::Specialist),
            _ => None,
        }
    }

    pub fn family(self) -> ArchetypeFamily {
        match self {
            Archetype::EngageTank | Archetype::Diver => ArchetypeFamily::HardEngage,
            Archetype::ArtilleryMage => ArchetypeFamily::Poke,
            Archetype::Marksman => ArchetypeFamily::CarryScaling,
            Archetype::BurstMage | Archetype::BurstAssassin => ArchetypeFamily::Burst,
            Archetype::Juggernaut | Archetype::Skirmisher => ArchetypeFamily::Bruiser,
            Archetype::BattleMage => ArchetypeFamily::ControlMage,
            Archetype::Enchanter | Archetype::Warden => ArchetypeFamily::Protect,
            Archetype::Catcher => ArchetypeFamily::Pick,
            Archetype::Specialist => ArchetypeFamily::Specialist,
        }
    }

    pub fn is_hard_engage(self) -> bool {
        self.family() == ArchetypeFamily::HardEngage
    }

    pub fn is_poke(self) -> bool {
        self.family() == ArchetypeFamily::Poke
    }

    pub fn is_tank(self) -> bool {
        matches!(self, Archetype::EngageTank | Archetype::Warden)
    }

    pub fn is_carry(self) -> bool {
        matches!(self, Archetype::Marksman)
    }

    pub fn is_peel(self) -> bool {
        matches!(self, Archetype::Enchanter | Archetype::Warden)
    }

    pub fn is_damage_dealer(self) -> bool {
        matches!(
            self,
            Archetype::Marksman
                | Archetype::BurstMage
                | Archetype::ArtilleryMage
                | Archetype::BattleMage
                | Archetype::BurstAssassin
        )
    }

    pub fn is_fighter(self) -> bool {
        matches!(self, Archetype::Diver | Archetype::Skirmisher | Archetype::Juggernaut)
    }

    pub fn is_support(self) -> bool {
        matches!(self, Archetype::Enchanter | Archetype::Catcher)
    }

    pub fn is_mage(self) -> bool {
        matches!(
            self,
            Archetype::BurstMage | Archetype::ArtilleryMage | Archetype::BattleMage
        )
    }

    pub fn description(self) -> &'static str {
        match self {
            Archetype::Marksman => "Ranged sustained damage dealer, scales with items, vulnerable but high DPS",
            Archetype::BurstMage => "High burst magic damage, skill-shot dependent, fragile but threatening",
            Archetype::BurstAssassin => "High mobility single-target burst, excels at eliminating carries",
            Archetype::EngageTank => "Initiates teamfights with hard CC, soaks damage for team",
            Archetype::Warden => "Protective tank, excels at peeling for carries",
            Archetype::Diver => "Jumps onto backline, disrupts and threatens enemy carries",
            Archetype::Juggernaut => "Low mobility high durability fighter, dominates melee range",
            Archetype::Skirmisher => "Sustained damage fighter, excels in extended 1v1s",
            Archetype::BattleMage => "Short-range sustained magic damage, durable mage",
            Archetype::Enchanter => "Heals and shields allies, enables carries to survive",
            Archetype::Catcher => "Picks off enemies with long-range CC, creates picks",
            Archetype::ArtilleryMage => "Long-range poke, controls zones, siege specialist",
            Archetype::Specialist => "Unique mechanics, doesn't fit standard patterns",
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl ArchetypeFamily {
    pub fn key(self) -> &'static str {
        match self {
            ArchetypeFamily::HardEngage => "hard_engage",
            ArchetypeFamily::Poke => "poke",
            ArchetypeFamily::CarryScaling => "carry_scaling",
            ArchetypeFamily::Burst => "burst",
            ArchetypeFamily::Bruiser => "bruiser",
            ArchetypeFamily::ControlMage => "control_mage",
            ArchetypeFamily::Protect => "protect",
            ArchetypeFamily::Pick => "pick",
            ArchetypeFamily::Specialist => "specialist",
        }
    }

    pub fn label(self) -> String {
        self.key().replace('_', " ")
    }
}
