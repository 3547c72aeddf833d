// ═══════════════════════════════════════════════════════════════════════
// Classic economics — rent, group bonus, settlement, asset valuation
// ═══════════════════════════════════════════════════════════════════════

use crate::map::GameMap;
use crate::maps::GROUP_BONUS_MULTIPLIER;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentPayment {
    pub to: PlayerId,
    pub amount: i64,
}

/// What landing on a property node asks of the current player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAction {
    pub node: NodeId,
    /// One entry per distinct owner, amounts already summed.
    pub rent_payments: Vec<RentPayment>,
    pub can_buy: bool,
}

impl NodeAction {
    pub fn is_empty(&self) -> bool {
        !self.can_buy && self.rent_payments.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeLine {
    pub property: PropertyId,
    pub name: String,
    pub income: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerIncome {
    pub player: PlayerId,
    pub amount: i64,
    pub breakdown: Vec<IncomeLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub round: u32,
    pub cycle_number: u32,
    pub incomes: Vec<PlayerIncome>,
}

impl Settlement {
    pub fn income_of(&self, player: PlayerId) -> i64 {
        self.incomes.iter().find(|i| i.player == player).map_or(0, |i| i.amount)
    }
}

/// Every property on every node tagged `group` is in `owned`.
/// Unknown or empty groups never count as complete.
pub fn is_group_complete(map: &GameMap, owned: &BTreeSet<PropertyId>, group: &str) -> bool {
    let members = map.group_nodes(group);
    !members.is_empty()
        && members
            .iter()
            .all(|&n| map.node(n).properties.iter().all(|p| owned.contains(&p.id)))
}

/// Income (and rent) of one property for an owner holding `owned`,
/// rounded per property.
pub fn property_income(map: &GameMap, property: &Property, owned: &BTreeSet<PropertyId>) -> i64 {
    let group_bonus = map
        .node(property.id.node)
        .group
        .as_deref()
        .is_some_and(|g| is_group_complete(map, owned, g));
    if group_bonus {
        (property.base_income as f64 * GROUP_BONUS_MULTIPLIER).round() as i64
    } else {
        property.base_income
    }
}

pub fn owner_of<'a>(players: &'a [ClassicPlayer], property: &PropertyId) -> Option<&'a ClassicPlayer> {
    players.iter().find(|p| p.owns(property))
}

/// Rent owed and purchase eligibility for `current` landing on `node`.
/// `None` for nodes without properties.
pub fn rent_owed(
    map: &GameMap,
    node: NodeId,
    current: PlayerId,
    players: &[ClassicPlayer],
) -> Option<NodeAction> {
    let node_def = map.node(node);
    if node_def.kind != TileKind::Property || node_def.properties.is_empty() {
        return None;
    }

    let mut rent_payments: Vec<RentPayment> = Vec::new();
    let mut can_buy = false;

    for property in &node_def.properties {
        match owner_of(players, &property.id) {
            None => can_buy = true,
            Some(owner) if owner.id == current => {}
            Some(owner) => {
                let rent = property_income(map, property, &owner.owned);
                match rent_payments.iter_mut().find(|rp| rp.to == owner.id) {
                    Some(existing) => existing.amount += rent,
                    None => rent_payments.push(RentPayment { to: owner.id, amount: rent }),
                }
            }
        }
    }

    Some(NodeAction { node, rent_payments, can_buy })
}

/// Income for every player from everything they own.
pub fn settle_income(players: &[ClassicPlayer], map: &GameMap, round: u32, cycle_number: u32) -> Settlement {
    let incomes = players
        .iter()
        .map(|player| {
            let breakdown: Vec<IncomeLine> = player
                .owned
                .iter()
                .filter_map(|id| map.property(id))
                .map(|property| IncomeLine {
                    property: property.id,
                    name: property.name.clone(),
                    income: property_income(map, property, &player.owned),
                })
                .collect();
            let amount = breakdown.iter().map(|l| l.income).sum();
            PlayerIncome { player: player.id, amount, breakdown }
        })
        .collect();

    Settlement { round, cycle_number, incomes }
}

/// `money + Σ price(owned)`.
pub fn total_assets(player: &ClassicPlayer, map: &GameMap) -> i64 {
    let property_value: i64 = player
        .owned
        .iter()
        .filter_map(|id| map.property(id))
        .map(|p| p.price)
        .sum();
    player.money + property_value
}

/// Unowned members remaining in `group` from `player`'s point of view:
/// nodes of the group whose properties the player does not all hold.
pub fn group_nodes_missing(map: &GameMap, player: &ClassicPlayer, group: &str) -> usize {
    map.group_nodes(group)
        .iter()
        .filter(|&&n| !map.node(n).properties.iter().all(|p| player.owns(&p.id)))
        .count()
}
