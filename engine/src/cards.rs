// ═══════════════════════════════════════════════════════════════════════
// Treasure cards — catalogue, draws, effect durations, targeting rules
// ═══════════════════════════════════════════════════════════════════════

use crate::types::*;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const SEAL_TURNS: u8 = 3;
pub const PARALYSIS_TURNS: u8 = 1;
pub const DICE_TURNS: u8 = 1;

/// Display data for a card kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CardSpec {
    pub kind: CardKind,
    pub name: &'static str,
    pub description: &'static str,
}

pub fn card_spec(kind: CardKind) -> CardSpec {
    let (name, description) = match kind {
        CardKind::PowerUp => ("Raider's Charm", "While held, steal chance +15%"),
        CardKind::Substitute => ("Decoy Doll", "Blocks one steal against you, then breaks"),
        CardKind::Seal => ("Sealing Jar", "Target cannot dig for 3 turns"),
        CardKind::BlowAway => ("Blast Hammer", "Warp the target to another node"),
        CardKind::Paralysis => ("Shock Trap", "Target skips their next turn"),
        CardKind::PhoneFraud => ("Phone Scam", "Steal from one player as if on the same node"),
        CardKind::Dice1 => ("One-Step Card", "Next dice roll is 1"),
        CardKind::Dice10 => ("Ten-Step Card", "Next dice roll is 10"),
        CardKind::TimeMachine => ("Time Machine", "Return one node you mined to unmined"),
    };
    CardSpec { kind, name, description }
}

/// Draw a uniformly random card. `serial` makes the id unique per game.
pub fn draw_card<R: Rng + ?Sized>(rng: &mut R, serial: u32) -> Card {
    let kind = *CardKind::ALL.choose(rng).unwrap_or(&CardKind::PowerUp);
    Card { id: CardId(serial), kind }
}

/// Which player a card may be aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetRule {
    /// Passive; never played.
    NotPlayable,
    /// Requires another player.
    Opponent,
    /// Any player, defaulting to the card holder.
    AnyPlayer,
    /// Acts on the card holder only.
    SelfOnly,
}

pub fn target_rule(kind: CardKind) -> TargetRule {
    match kind {
        CardKind::PowerUp | CardKind::Substitute => TargetRule::NotPlayable,
        CardKind::Seal | CardKind::Paralysis | CardKind::PhoneFraud => TargetRule::Opponent,
        CardKind::BlowAway | CardKind::Dice1 | CardKind::Dice10 => TargetRule::AnyPlayer,
        CardKind::TimeMachine => TargetRule::SelfOnly,
    }
}

/// Resolve the player a card play lands on, or `None` when the target
/// does not satisfy the card's rule.
pub fn resolve_target(
    kind: CardKind,
    user: PlayerId,
    requested: Option<PlayerId>,
    player_count: usize,
) -> Option<PlayerId> {
    let in_range = |p: PlayerId| p.index() < player_count;
    match target_rule(kind) {
        TargetRule::NotPlayable => None,
        TargetRule::Opponent => requested.filter(|&p| p != user && in_range(p)),
        TargetRule::AnyPlayer => Some(requested.unwrap_or(user)).filter(|&p| in_range(p)),
        TargetRule::SelfOnly => Some(user),
    }
}

/// The timed effect a card applies, if it applies one.
pub fn effect_for(kind: CardKind) -> Option<Effect> {
    let (kind, remaining_turns) = match kind {
        CardKind::Seal => (EffectKind::Sealed, SEAL_TURNS),
        CardKind::Paralysis => (EffectKind::Paralyzed, PARALYSIS_TURNS),
        CardKind::Dice1 => (EffectKind::DiceOne, DICE_TURNS),
        CardKind::Dice10 => (EffectKind::DiceTen, DICE_TURNS),
        _ => return None,
    };
    Some(Effect { kind, remaining_turns })
}

/// Start-of-turn tick. Effects with time left are in force for the turn
/// now starting; every duration then counts down once and spent effects
/// drop off. Returns the effects in force.
pub fn tick_effects(effects: &mut Vec<Effect>) -> Vec<Effect> {
    let in_force: Vec<Effect> = effects.iter().filter(|e| e.remaining_turns > 0).copied().collect();
    for e in effects.iter_mut() {
        e.remaining_turns = e.remaining_turns.saturating_sub(1);
    }
    effects.retain(|e| e.remaining_turns > 0);
    in_force
}

/// Node-picking flows for cards that need a board selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardTargetKind {
    /// Pick where a blow-away sends its target.
    WarpDestination,
    /// Pick one of your own mined nodes to revive.
    ReviveNode,
}

impl CardTargetKind {
    pub fn card_kind(self) -> CardKind {
        match self {
            CardTargetKind::WarpDestination => CardKind::BlowAway,
            CardTargetKind::ReviveNode => CardKind::TimeMachine,
        }
    }
}

/// Pending node selection for a card play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardTargetSelection {
    pub card_id: CardId,
    pub kind: CardTargetKind,
    pub target_player: Option<PlayerId>,
    pub valid_nodes: Vec<NodeId>,
}

/// A CPU or driver decision to play a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPlay {
    pub card_id: CardId,
    pub target: Option<PlayerId>,
    /// For cards that pick a node (warp destination / revive node).
    pub node: Option<NodeId>,
}
