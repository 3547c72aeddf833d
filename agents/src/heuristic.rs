// ═══════════════════════════════════════════════════════════════════════
// Heuristic Agent — plays with simple strategic rules of thumb.
// Noticeably stronger than RandomAgent in both modes.
//
// Classic: buys when affordable relative to cash, more aggressively when
// close to completing a group; heads for the destination.
// Treasure: a personality (miner / card lover / stalker) weights how each
// dice route is scored.
// ═══════════════════════════════════════════════════════════════════════

use crate::agent::{Agent, AgentKind};
use pepe_engine::cards::CardPlay;
use pepe_engine::economy;
use pepe_engine::*;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

// ── Classic purchase thresholds (fractions of current money) ────────────
pub const MAX_PRICE_SHARE: f64 = 0.6;
pub const LAST_OF_GROUP_SHARE: f64 = 0.9;
pub const TWO_LEFT_IN_GROUP_SHARE: f64 = 0.7;
/// Settlement cycles a property may take to pay for itself.
pub const MAX_PAYBACK_CYCLES: f64 = 10.0;

// ── Treasure route scoring ──────────────────────────────────────────────
pub const UNMINED_LANDING_SCORE: f64 = 10.0;
pub const MINED_NEIGHBOR_SCORE: f64 = 2.0;
pub const CARD_NODE_SCORE: f64 = 10.0;
pub const LAND_ON_OPPONENT_SCORE: f64 = 15.0;
pub const PASS_OPPONENT_SCORE: f64 = 5.0;
pub const LEADER_MULTIPLIER: f64 = 2.5;
pub const MINER_WEIGHT: f64 = 2.5;
pub const CARD_LOVER_WEIGHT: f64 = 2.0;
pub const STALKER_WEIGHT: f64 = 2.5;
pub const ROUTE_NOISE: f64 = 2.0;

// ── Treasure card use ───────────────────────────────────────────────────
pub const BASE_CARD_USE: f64 = 0.1;
pub const CARD_LOVER_CARD_USE: f64 = 0.7;

pub struct HeuristicAgent {
    rng: ChaCha8Rng,
}

impl HeuristicAgent {
    pub fn new(seed: u64) -> Self {
        HeuristicAgent { rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    /// Random pick among routes sharing the best key.
    fn pick_random(&mut self, routes: &[&Route]) -> Option<RouteId> {
        routes.choose(&mut self.rng).map(|r| r.id)
    }

    /// Weighted route value before noise.
    fn route_value(state: &TreasureState, me: PlayerId, route: &Route, weights: &Personality) -> f64 {
        let landing = state.map.node(route.landing);

        let mut mining = 0.0;
        if landing.kind == TileKind::Property && !state.mined.contains_key(&route.landing) {
            mining += UNMINED_LANDING_SCORE;
        }
        let mined_neighbors = landing.adjacent.iter().filter(|n| state.mined.contains_key(n)).count();
        mining += mined_neighbors as f64 * MINED_NEIGHBOR_SCORE;

        let card = if landing.kind == TileKind::Bonus { CARD_NODE_SCORE } else { 0.0 };

        let leader = state.leader_excluding(me);
        let mut intercept = 0.0;
        for p in state.players.iter().filter(|p| p.id != me && p.treasures > 0) {
            let base = if p.position == route.landing {
                LAND_ON_OPPONENT_SCORE
            } else if route.path.contains(&p.position) {
                PASS_OPPONENT_SCORE
            } else {
                0.0
            };
            intercept += if Some(p.id) == leader { base * LEADER_MULTIPLIER } else { base };
        }

        mining * MINER_WEIGHT * weights.miner
            + card * CARD_LOVER_WEIGHT * weights.card_lover
            + intercept * STALKER_WEIGHT * weights.stalker
    }
}

impl Agent for HeuristicAgent {
    fn name(&self) -> &str {
        AgentKind::Heuristic.agent_name()
    }

    fn decide_buy(&mut self, state: &ClassicState, me: PlayerId, property: &Property) -> bool {
        let player = state.player(me);
        let money = player.money as f64;
        let price = property.price as f64;

        if price > money * MAX_PRICE_SHARE {
            return false;
        }

        // Close to completing a group: accept a bigger share of cash
        if let Some(group) = state.map.node(property.id.node).group.as_deref() {
            match economy::group_nodes_missing(&state.map, player, group) {
                1 => return price <= money * LAST_OF_GROUP_SHARE,
                2 => return price <= money * TWO_LEFT_IN_GROUP_SHARE,
                _ => {}
            }
        }

        property.base_income > 0 && price / property.base_income as f64 <= MAX_PAYBACK_CYCLES
    }

    fn decide_route(&mut self, _state: &ClassicState, _me: PlayerId, routes: &[Route]) -> RouteId {
        let exact: Vec<&Route> = routes.iter().filter(|r| r.distance_to_destination == Some(0)).collect();
        if let Some(id) = self.pick_random(&exact) {
            return id;
        }

        let best = routes.iter().filter_map(|r| r.distance_to_destination).min();
        let closest: Vec<&Route> = match best {
            Some(d) => routes.iter().filter(|r| r.distance_to_destination == Some(d)).collect(),
            None => routes.iter().collect(),
        };
        self.pick_random(&closest).unwrap_or(RouteId(0))
    }

    /// Three uniform draws raised to a shared power in [1, 3] then
    /// normalised; higher powers skew toward one trait.
    fn personality(&mut self) -> Personality {
        let power = self.rng.gen_range(1.0..=3.0);
        let raw: [f64; 3] = std::array::from_fn(|_| self.rng.gen::<f64>().powf(power));
        let sum: f64 = raw.iter().sum();
        if sum <= f64::EPSILON {
            return Personality::default();
        }
        Personality { miner: raw[0] / sum, card_lover: raw[1] / sum, stalker: raw[2] / sum }
    }

    fn choose_card_play(&mut self, state: &TreasureState, me: PlayerId) -> Option<CardPlay> {
        let player = state.player(me);
        let active: Vec<Card> = player.cards.iter().filter(|c| !c.is_passive()).copied().collect();
        if active.is_empty() {
            return None;
        }
        let weights = player.personality.unwrap_or_default();
        let chance = (BASE_CARD_USE + CARD_LOVER_CARD_USE * weights.card_lover).clamp(0.0, 1.0);
        if !self.rng.gen_bool(chance) {
            return None;
        }

        let card = *active.choose(&mut self.rng)?;
        let leader = state.leader_excluding(me);
        let (target, node) = match card.kind {
            CardKind::TimeMachine => {
                let own = state.mined_by(me);
                (None, Some(*own.choose(&mut self.rng)?))
            }
            // Boosts my own next roll; never aimed at the leader
            CardKind::Dice10 => (Some(me), None),
            _ => (Some(leader?), None),
        };
        Some(CardPlay { card_id: card.id, target, node })
    }

    fn choose_route(&mut self, state: &TreasureState, me: PlayerId, routes: &[Route]) -> RouteId {
        let weights = state.player(me).personality.unwrap_or_default();
        let mut best: Option<(f64, RouteId)> = None;
        for route in routes {
            let score = Self::route_value(state, me, route, &weights) + self.rng.gen::<f64>() * ROUTE_NOISE;
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, route.id));
            }
        }
        trace!(%me, ?best, "route scored");
        best.map_or(RouteId(0), |(_, id)| id)
    }
}
