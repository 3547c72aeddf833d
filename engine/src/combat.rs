// ═══════════════════════════════════════════════════════════════════════
// Steals — pass-by and same-node treasure theft with counter-steals
//
// Resolution order for one attacker/defender pair:
//   1. Defender holds a substitute → blocked, substitute consumed, no roll
//   2. Success roll against base + 0.15 × attacker power_ups (cap 1.0)
//   3. Only on failure: counter roll against the context's counter rate
// ═══════════════════════════════════════════════════════════════════════

use crate::types::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const POWER_UP_BONUS: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StealContext {
    PassBy,
    SameNode,
}

impl StealContext {
    pub fn base_success(self) -> f64 {
        match self {
            StealContext::PassBy => 0.30,
            StealContext::SameNode => 0.60,
        }
    }

    pub fn counter_chance(self) -> f64 {
        match self {
            StealContext::PassBy => 0.15,
            StealContext::SameNode => 0.30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StealOutcome {
    pub attacker: PlayerId,
    pub defender: PlayerId,
    pub context: StealContext,
    pub success: bool,
    pub is_counter: bool,
    pub blocked: bool,
}

impl StealOutcome {
    /// Treasure moved, as (from, to).
    pub fn transfer(&self) -> Option<(PlayerId, PlayerId)> {
        if self.success {
            Some((self.defender, self.attacker))
        } else if self.is_counter {
            Some((self.attacker, self.defender))
        } else {
            None
        }
    }
}

/// Attacker success chance with power-ups, capped at 1.
pub fn success_chance(context: StealContext, power_ups: usize) -> f64 {
    (context.base_success() + POWER_UP_BONUS * power_ups as f64).min(1.0)
}

/// Pure resolution given the rolls. `counter_roll` is only read on a
/// failed steal. Substitute consumption is left to the caller.
pub fn resolve_with_rolls(
    attacker: &TreasurePlayer,
    defender: &TreasurePlayer,
    context: StealContext,
    roll: f64,
    counter_roll: f64,
) -> StealOutcome {
    let mut outcome = StealOutcome {
        attacker: attacker.id,
        defender: defender.id,
        context,
        success: false,
        is_counter: false,
        blocked: false,
    };
    if defender.has_card(CardKind::Substitute) {
        outcome.blocked = true;
        return outcome;
    }
    let chance = success_chance(context, attacker.count_cards(CardKind::PowerUp));
    // A side holding no treasure has nothing to lose
    if roll <= chance {
        outcome.success = defender.treasures > 0;
    } else if counter_roll <= context.counter_chance() {
        outcome.is_counter = attacker.treasures > 0;
    }
    outcome
}

/// Resolve and apply one steal between two seats of `players`.
/// Uses live treasure counts; success or counter is only reported when a
/// treasure actually moves.
pub fn perform_steal<R: Rng + ?Sized>(
    players: &mut [TreasurePlayer],
    attacker: PlayerId,
    defender: PlayerId,
    context: StealContext,
    rng: &mut R,
) -> StealOutcome {
    let (roll, counter_roll) = if players[defender.index()].has_card(CardKind::Substitute) {
        (1.0, 1.0)
    } else {
        let roll: f64 = rng.gen();
        let chance = success_chance(context, players[attacker.index()].count_cards(CardKind::PowerUp));
        let counter_roll: f64 = if roll <= chance { 1.0 } else { rng.gen() };
        (roll, counter_roll)
    };

    let outcome = resolve_with_rolls(
        &players[attacker.index()],
        &players[defender.index()],
        context,
        roll,
        counter_roll,
    );

    if outcome.blocked {
        players[defender.index()].discard_first(CardKind::Substitute);
    }
    if let Some((from, to)) = outcome.transfer() {
        players[from.index()].treasures -= 1;
        players[to.index()].treasures += 1;
    }
    outcome
}

/// Opponents of `attacker` standing on `node` with at least one treasure,
/// in seat order.
pub fn stealable_at(players: &[TreasurePlayer], attacker: PlayerId, node: NodeId) -> Vec<PlayerId> {
    players
        .iter()
        .filter(|p| p.id != attacker && p.position == node && p.treasures > 0)
        .map(|p| p.id)
        .collect()
}
