// ═══════════════════════════════════════════════════════════════════════
// Mining — dig odds escalate with mined neighbours
// ═══════════════════════════════════════════════════════════════════════

use crate::map::GameMap;
use crate::types::*;
use rand::Rng;
use std::collections::BTreeMap;

pub const BASE_MINING_CHANCE: f64 = 0.25;
pub const MINING_CHANCE_PER_NEIGHBOR: f64 = 0.25;
pub const RARE_THRESHOLD: f64 = 0.10;
pub const TRAP_THRESHOLD: f64 = 0.20;

/// Treasure delta applied for each successful outcome.
pub fn treasure_delta(outcome: DigOutcome) -> i32 {
    match outcome {
        DigOutcome::Normal => 1,
        DigOutcome::Rare => 2,
        DigOutcome::Trap => -1,
        DigOutcome::Fail | DigOutcome::Empty => 0,
    }
}

/// `min(1, 0.25 + 0.25 × mined neighbours)`.
pub fn mining_chance(map: &GameMap, mined: &BTreeMap<NodeId, MiningRecord>, node: NodeId) -> f64 {
    let mined_neighbors = map
        .neighbors(node)
        .iter()
        .filter(|n| mined.contains_key(n))
        .count();
    (BASE_MINING_CHANCE + MINING_CHANCE_PER_NEIGHBOR * mined_neighbors as f64).min(1.0)
}

/// Pure outcome of a dig given both rolls.
pub fn outcome_for(chance: f64, roll: f64, sub_roll: f64) -> DigOutcome {
    if roll > chance {
        DigOutcome::Fail
    } else if sub_roll < RARE_THRESHOLD {
        DigOutcome::Rare
    } else if sub_roll < TRAP_THRESHOLD {
        DigOutcome::Trap
    } else {
        DigOutcome::Normal
    }
}

/// Roll a dig on `node`. Already-mined nodes yield `Empty` without rolling.
/// Does not touch state; the caller applies the outcome.
pub fn attempt_dig<R: Rng + ?Sized>(
    map: &GameMap,
    mined: &BTreeMap<NodeId, MiningRecord>,
    node: NodeId,
    rng: &mut R,
) -> DigOutcome {
    if mined.contains_key(&node) {
        return DigOutcome::Empty;
    }
    let chance = mining_chance(map, mined, node);
    let roll: f64 = rng.gen();
    if roll > chance {
        return DigOutcome::Fail;
    }
    let sub_roll: f64 = rng.gen();
    outcome_for(chance, roll, sub_roll)
}

/// Apply an outcome to `player` and the mined record.
pub fn apply_dig(
    player: &mut TreasurePlayer,
    mined: &mut BTreeMap<NodeId, MiningRecord>,
    node: NodeId,
    outcome: DigOutcome,
) {
    let delta = treasure_delta(outcome);
    player.treasures = (player.treasures as i64 + delta as i64).max(0) as u32;
    if outcome.consumes_node() {
        mined.insert(node, MiningRecord { miner: Some(player.id), outcome });
    }
}

/// Dig sites: every Property-kind node. Card nodes never count.
pub fn mineable_nodes(map: &GameMap) -> impl Iterator<Item = NodeId> + '_ {
    map.nodes()
        .iter()
        .filter(|n| n.kind == TileKind::Property)
        .map(|n| n.id)
}

pub fn all_mined(map: &GameMap, mined: &BTreeMap<NodeId, MiningRecord>) -> bool {
    mineable_nodes(map).all(|n| mined.contains_key(&n))
}
