// ═══════════════════════════════════════════════════════════════════════
// Game events — typed log entries emitted by both game modes
// The driver drains them after each action or clock advance.
// ═══════════════════════════════════════════════════════════════════════

use crate::combat::StealOutcome;
use crate::types::*;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CashReason {
    Bonus,
    Penalty,
    Destination,
    Settlement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    GameStarted { players: usize },
    TurnStarted { player: PlayerId, round: u32 },
    DiceRolled { player: PlayerId, value: u8, routes: usize },
    Moved { player: PlayerId, from: NodeId, to: NodeId, steps: usize },
    LapCompleted { player: PlayerId, laps: u32 },

    // ── Classic ──
    CashChanged { player: PlayerId, delta: i64, reason: CashReason },
    RentPaid { from: PlayerId, to: PlayerId, amount: i64 },
    PropertyBought { player: PlayerId, property: PropertyId, price: i64 },
    DestinationReached { player: PlayerId, node: NodeId, bonus: i64 },
    DestinationChanged { node: NodeId },
    SettlementPaid { round: u32, cycle_number: u32, total: i64 },

    // ── Treasure ──
    Dug { player: PlayerId, node: NodeId, outcome: DigOutcome, chance: f64 },
    DigBlocked { player: PlayerId, node: NodeId },
    Steal(StealOutcome),
    CardDrawn { player: PlayerId, card: CardKind },
    CardPlayed { player: PlayerId, card: CardKind, target: Option<PlayerId> },
    EffectApplied { player: PlayerId, effect: EffectKind, turns: u8 },
    Warped { player: PlayerId, to: NodeId },
    NodeRevived { player: PlayerId, node: NodeId },
    TurnSkipped { player: PlayerId },

    GameOver { standings: Vec<PlayerId> },
}
