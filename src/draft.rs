//! Draft state supplied by the caller per request.

use crate::error::DraftError;
use crate::names::canonical_key;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

pub const MAX_PICKS: usize = 5;
pub const MAX_BANS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    #[default]
    Blue,
    Red,
}

impl Team {
    pub fn opponent(self) -> Team {
        match self {
            Team::Blue => Team::Red,
            Team::Red => Team::Blue,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Team::Blue => "blue",
            Team::Red => "red",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Team {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blue" => Ok(Team::Blue),
            "red" => Ok(Team::Red),
            _ => Err(DraftError::InvalidTeam(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Top,
    Jungle,
    #[serde(alias = "MID")]
    Middle,
    #[serde(alias = "BOT", alias = "ADC")]
    Bottom,
    #[serde(alias = "SUPPORT")]
    Utility,
}

impl Role {
    pub const ALL: [Role; 5] = [Role::Top, Role::Jungle, Role::Middle, Role::Bottom, Role::Utility];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Top => "TOP",
            Role::Jungle => "JUNGLE",
            Role::Middle => "MIDDLE",
            Role::Bottom => "BOTTOM",
            Role::Utility => "UTILITY",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TOP" => Ok(Role::Top),
            "JUNGLE" | "JG" => Ok(Role::Jungle),
            "MIDDLE" | "MID" => Ok(Role::Middle),
            "BOTTOM" | "BOT" | "ADC" | "CARRY" => Ok(Role::Bottom),
            "UTILITY" | "SUPPORT" | "SUP" => Ok(Role::Utility),
            _ => Err(DraftError::InvalidRole(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    pub champion: String,
    pub role: Role,
}

impl Pick {
    pub fn new(champion: impl Into<String>, role: Role) -> Self {
        Pick {
            champion: champion.into(),
            role,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamDraft {
    #[serde(default)]
    pub picks: Vec<Pick>,
    #[serde(default)]
    pub bans: Vec<String>,
}

impl TeamDraft {
    pub fn has_role(&self, role: Role) -> bool {
        self.picks.iter().any(|p| p.role == role)
    }
}

/// Picks, bans and the turn pointer for both sides.
///
/// A champion appears in at most one of {blue picks, red picks, blue bans,
/// red bans}; a (team, role) slot is filled at most once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftState {
    #[serde(default)]
    pub blue: TeamDraft,
    #[serde(default)]
    pub red: TeamDraft,
    #[serde(default)]
    pub next_pick: Team,
}

/// One open (team, role) position a caller wants filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotRequest {
    pub slot_id: String,
    pub team: Team,
    #[serde(default)]
    pub role: Option<Role>,
}

impl SlotRequest {
    pub fn new(team: Team, role: Option<Role>) -> Self {
        let slot_id = match role {
            Some(role) => format!("{}_{}", team, role.as_str().to_ascii_lowercase()),
            None => format!("{}_next", team),
        };
        SlotRequest { slot_id, team, role }
    }
}

impl DraftState {
    pub fn new() -> Self {
        DraftState::default()
    }

    pub fn team(&self, team: Team) -> &TeamDraft {
        match team {
            Team::Blue => &self.blue,
            Team::Red => &self.red,
        }
    }

    fn team_mut(&mut self, team: Team) -> &mut TeamDraft {
        match team {
            Team::Blue => &mut self.blue,
            Team::Red => &mut self.red,
        }
    }

    /// Canonical keys of every picked or banned champion on either side.
    pub fn taken_keys(&self) -> HashSet<String> {
        self.blue
            .picks
            .iter()
            .chain(self.red.picks.iter())
            .map(|p| canonical_key(&p.champion))
            .chain(
                self.blue
                    .bans
                    .iter()
                    .chain(self.red.bans.iter())
                    .map(|b| canonical_key(b)),
            )
            .collect()
    }

    pub fn is_taken(&self, champion: &str) -> bool {
        self.taken_keys().contains(&canonical_key(champion))
    }

    /// Checks the structural invariants. Name resolution against the champion
    /// roster is done by the service, not here.
    pub fn validate(&self) -> Result<(), DraftError> {
        let mut seen: HashSet<String> = HashSet::new();

        for team in [Team::Blue, Team::Red] {
            let side = self.team(team);

            if side.picks.len() > MAX_PICKS {
                return Err(DraftError::InvalidDraft(format!(
                    "{} has {} picks (max {})",
                    team,
                    side.picks.len(),
                    MAX_PICKS
                )));
            }
            if side.bans.len() > MAX_BANS {
                return Err(DraftError::InvalidDraft(format!(
                    "{} has {} bans (max {})",
                    team,
                    side.bans.len(),
                    MAX_BANS
                )));
            }

            let mut roles = HashSet::new();
            for pick in &side.picks {
                if !roles.insert(pick.role) {
                    return Err(DraftError::SlotAlreadyFilled {
                        team: team.to_string(),
                        role: pick.role.to_string(),
                    });
                }
            }

            let names = side
                .picks
                .iter()
                .map(|p| p.champion.as_str())
                .chain(side.bans.iter().map(|b| b.as_str()));
            for name in names {
                if !seen.insert(canonical_key(name)) {
                    return Err(DraftError::DuplicateChampion(name.to_string()));
                }
            }
        }

        Ok(())
    }

    /// Errors when the requested slot is already occupied.
    pub fn check_slot_open(&self, slot: &SlotRequest) -> Result<(), DraftError> {
        let side = self.team(slot.team);
        if let Some(role) = slot.role {
            if side.has_role(role) {
                return Err(DraftError::SlotAlreadyFilled {
                    team: slot.team.to_string(),
                    role: role.to_string(),
                });
            }
        }
        if side.picks.len() >= MAX_PICKS {
            return Err(DraftError::InvalidDraft(format!("{} has no open slots", slot.team)));
        }
        Ok(())
    }

    pub fn lock_pick(&mut self, team: Team, role: Role, champion: &str) -> Result<(), DraftError> {
        self.check_slot_open(&SlotRequest::new(team, Some(role)))?;
        if self.is_taken(champion) {
            return Err(DraftError::DuplicateChampion(champion.to_string()));
        }
        self.team_mut(team).picks.push(Pick::new(champion, role));
        self.next_pick = team.opponent();
        Ok(())
    }

    pub fn ban(&mut self, team: Team, champion: &str) -> Result<(), DraftError> {
        if self.team(team).bans.len() >= MAX_BANS {
            return Err(DraftError::InvalidDraft(format!("{} has no bans left", team)));
        }
        if self.is_taken(champion) {
            return Err(DraftError::DuplicateChampion(champion.to_string()));
        }
        self.team_mut(team).bans.push(champion.to_string());
        Ok(())
    }
}
