// ═══════════════════════════════════════════════════════════════════════
// Random Agent — makes every decision uniformly at random.
// Serves as the tournament baseline and for engine stability testing.
// ═══════════════════════════════════════════════════════════════════════

use crate::agent::{Agent, AgentKind};
use pepe_engine::cards::{self, CardPlay, TargetRule};
use pepe_engine::*;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Chance of buying an offered property or playing a held card.
const COIN_FLIP: f64 = 0.5;

pub struct RandomAgent {
    rng: ChaCha8Rng,
}

impl RandomAgent {
    pub fn new(seed: u64) -> Self {
        RandomAgent { rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    fn any_route(&mut self, routes: &[Route]) -> RouteId {
        routes.choose(&mut self.rng).map_or(RouteId(0), |r| r.id)
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &str {
        AgentKind::Random.agent_name()
    }

    fn decide_buy(&mut self, _state: &ClassicState, _me: PlayerId, _property: &Property) -> bool {
        self.rng.gen_bool(COIN_FLIP)
    }

    fn decide_route(&mut self, _state: &ClassicState, _me: PlayerId, routes: &[Route]) -> RouteId {
        self.any_route(routes)
    }

    fn personality(&mut self) -> Personality {
        Personality::default()
    }

    fn choose_card_play(&mut self, state: &TreasureState, me: PlayerId) -> Option<CardPlay> {
        let held: Vec<Card> = state.player(me).cards.iter().filter(|c| !c.is_passive()).copied().collect();
        if held.is_empty() || !self.rng.gen_bool(COIN_FLIP) {
            return None;
        }
        let card = *held.choose(&mut self.rng)?;

        let opponents: Vec<PlayerId> = state.players.iter().map(|p| p.id).filter(|&p| p != me).collect();
        let target = match cards::target_rule(card.kind) {
            TargetRule::NotPlayable => return None,
            TargetRule::Opponent => Some(*opponents.choose(&mut self.rng)?),
            TargetRule::AnyPlayer => state.players.choose(&mut self.rng).map(|p| p.id),
            TargetRule::SelfOnly => None,
        };
        Some(CardPlay { card_id: card.id, target, node: None })
    }

    fn choose_route(&mut self, _state: &TreasureState, _me: PlayerId, routes: &[Route]) -> RouteId {
        self.any_route(routes)
    }
}
