// ═══════════════════════════════════════════════════════════════════════
// Game setup — seats, starting positions, roster padding, destinations
// ═══════════════════════════════════════════════════════════════════════

use crate::economy;
use crate::map::GameMap;
use crate::maps::destination_candidates;
use crate::settings::{ClassicSettings, LobbyPlayer, MAX_PLAYERS};
use crate::types::*;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;

/// Classic seats: everyone on the start node with the starting money.
pub fn classic_players(roster: &[LobbyPlayer], settings: &ClassicSettings, map: &GameMap) -> Vec<ClassicPlayer> {
    roster
        .iter()
        .enumerate()
        .map(|(i, lp)| {
            let mut player = ClassicPlayer {
                id: PlayerId(i as u8),
                name: lp.name.clone(),
                color: lp.color,
                position: map.start(),
                money: settings.starting_money,
                owned: BTreeSet::new(),
                total_assets: 0,
                is_human: lp.is_human,
                laps_completed: 0,
            };
            player.total_assets = economy::total_assets(&player, map);
            player
        })
        .collect()
}

/// Fill the roster up to four seats with CPU thieves on unused colours.
pub fn pad_treasure_roster(roster: &[LobbyPlayer]) -> Vec<LobbyPlayer> {
    let mut seats = roster.to_vec();
    let mut cpu_number = 1;
    while seats.len() < MAX_PLAYERS {
        let color = PlayerColor::ALL
            .into_iter()
            .find(|c| seats.iter().all(|s| s.color != *c))
            .unwrap_or(PlayerColor::Red);
        seats.push(LobbyPlayer::cpu(&format!("NPC Thief {cpu_number}"), color));
        cpu_number += 1;
    }
    seats
}

/// Treasure seats on distinct shuffled nodes. Seats beyond the node count
/// fall back to the map start.
pub fn treasure_players<R: Rng + ?Sized>(roster: &[LobbyPlayer], map: &GameMap, rng: &mut R) -> Vec<TreasurePlayer> {
    let mut nodes: Vec<NodeId> = map.node_ids().collect();
    nodes.shuffle(rng);
    roster
        .iter()
        .enumerate()
        .map(|(i, lp)| TreasurePlayer {
            id: PlayerId(i as u8),
            name: lp.name.clone(),
            color: lp.color,
            position: nodes.get(i).copied().unwrap_or(map.start()),
            is_human: lp.is_human,
            treasures: 0,
            cards: Vec::new(),
            active_effects: Vec::new(),
            personality: None,
        })
        .collect()
}

/// A random property node that is neither the current destination nor
/// occupied. Falls back to the first candidate when everything is excluded.
pub fn pick_destination<R: Rng + ?Sized>(
    map: &GameMap,
    current: Option<NodeId>,
    occupied: &[NodeId],
    rng: &mut R,
) -> Option<NodeId> {
    let all = destination_candidates(map);
    let open: Vec<NodeId> = all
        .iter()
        .copied()
        .filter(|n| Some(*n) != current && !occupied.contains(n))
        .collect();
    match open.choose(rng) {
        Some(&n) => Some(n),
        None => all.first().copied(),
    }
}
