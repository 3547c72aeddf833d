// ═══════════════════════════════════════════════════════════════════════
// Game settings and lobby roster
// ═══════════════════════════════════════════════════════════════════════

use crate::maps::TreasureMapId;
use crate::types::PlayerColor;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

pub const MIN_CLASSIC_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 4;
pub const MIN_TREASURE_PLAYERS: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassicSettings {
    pub total_rounds: u32,
    /// Settlement runs after every `cycle_length` rounds.
    pub cycle_length: u32,
    pub starting_money: i64,
    pub destination_bonus: i64,
}

impl Default for ClassicSettings {
    fn default() -> Self {
        ClassicSettings {
            total_rounds: 20,
            cycle_length: 4,
            starting_money: 1000,
            destination_bonus: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreasureSettings {
    pub map: TreasureMapId,
    pub target_treasures: u32,
    /// Optional round cap; the game otherwise runs until a target or
    /// exhaustion ending.
    pub round_limit: Option<u32>,
}

impl Default for TreasureSettings {
    fn default() -> Self {
        TreasureSettings { map: TreasureMapId::default(), target_treasures: 10, round_limit: None }
    }
}

/// One seat as configured in the lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyPlayer {
    pub name: String,
    pub color: PlayerColor,
    pub is_human: bool,
}

impl LobbyPlayer {
    pub fn human(name: &str, color: PlayerColor) -> Self {
        LobbyPlayer { name: name.to_string(), color, is_human: true }
    }

    pub fn cpu(name: &str, color: PlayerColor) -> Self {
        LobbyPlayer { name: name.to_string(), color, is_human: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("need {min}-{max} players, got {got}")]
    PlayerCount { min: usize, max: usize, got: usize },
    #[error("colour {0} is used by more than one player")]
    DuplicateColor(PlayerColor),
    #[error("total rounds must be at least 1")]
    ZeroRounds,
    #[error("settlement cycle length must be at least 1")]
    ZeroCycleLength,
    #[error("target treasure count must be at least 1")]
    ZeroTarget,
}

/// Seat count within `[min, MAX_PLAYERS]` and colours distinct.
pub fn validate_roster(roster: &[LobbyPlayer], min: usize) -> Result<(), SetupError> {
    if roster.len() < min || roster.len() > MAX_PLAYERS {
        return Err(SetupError::PlayerCount { min, max: MAX_PLAYERS, got: roster.len() });
    }
    let mut seen = HashSet::new();
    for p in roster {
        if !seen.insert(p.color) {
            return Err(SetupError::DuplicateColor(p.color));
        }
    }
    Ok(())
}

impl ClassicSettings {
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.total_rounds == 0 {
            return Err(SetupError::ZeroRounds);
        }
        if self.cycle_length == 0 {
            return Err(SetupError::ZeroCycleLength);
        }
        Ok(())
    }
}

impl TreasureSettings {
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.round_limit == Some(0) {
            return Err(SetupError::ZeroRounds);
        }
        if self.target_treasures == 0 {
            return Err(SetupError::ZeroTarget);
        }
        Ok(())
    }
}
