// ═══════════════════════════════════════════════════════════════════════
// Agent Trait — interface every CPU player implements
//
// An agent controls one seat. It sees the same read-only game state a
// human UI would and answers the decision points of both modes. The
// games talk to a `Lineup`, which routes each question to the agent
// sitting in the asking seat.
// ═══════════════════════════════════════════════════════════════════════

use crate::heuristic::HeuristicAgent;
use crate::random::RandomAgent;
use pepe_engine::cards::CardPlay;
use pepe_engine::policy::{ClassicPolicy, TreasurePolicy};
use pepe_engine::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

pub trait Agent: Send + Sync {
    /// Human-readable name (e.g. "Heuristic"), used as the tournament key.
    fn name(&self) -> &str;

    // ── Classic ────────────────────────────────────────────────────────

    /// Buy `property`? It is unowned and affordable when asked.
    fn decide_buy(&mut self, state: &ClassicState, me: PlayerId, property: &Property) -> bool;

    /// Choose among branch routes (never empty).
    fn decide_route(&mut self, state: &ClassicState, me: PlayerId, routes: &[Route]) -> RouteId;

    // ── Treasure ───────────────────────────────────────────────────────

    /// Weights drawn once at game start.
    fn personality(&mut self) -> Personality;

    /// A card to play before rolling, if any.
    fn choose_card_play(&mut self, state: &TreasureState, me: PlayerId) -> Option<CardPlay>;

    /// Choose among dice routes (never empty).
    fn choose_route(&mut self, state: &TreasureState, me: PlayerId, routes: &[Route]) -> RouteId;
}

/// Built-in agent kinds, selectable by name from the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Heuristic,
    Random,
}

impl AgentKind {
    pub const ALL: [AgentKind; 2] = [AgentKind::Heuristic, AgentKind::Random];

    pub fn build(self, seed: u64) -> Box<dyn Agent> {
        match self {
            AgentKind::Heuristic => Box::new(HeuristicAgent::new(seed)),
            AgentKind::Random => Box::new(RandomAgent::new(seed)),
        }
    }

    /// The name agents of this kind report, and the key results are stored under.
    pub fn agent_name(self) -> &'static str {
        match self {
            AgentKind::Heuristic => "Heuristic",
            AgentKind::Random => "Random",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentKind::Heuristic => write!(f, "heuristic"),
            AgentKind::Random => write!(f, "random"),
        }
    }
}

impl FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heuristic" => Ok(AgentKind::Heuristic),
            "random" => Ok(AgentKind::Random),
            other => Err(format!("unknown agent kind '{other}' (expected heuristic or random)")),
        }
    }
}

/// Seat-indexed agents. Seats without an agent (humans, or seats added
/// after the lineup was built) get the simplest legal answer.
pub struct Lineup {
    seats: Vec<Box<dyn Agent>>,
}

impl Lineup {
    pub fn new(seats: Vec<Box<dyn Agent>>) -> Self {
        Lineup { seats }
    }

    /// `kinds[i]` sits in seat i, seeded from `seed` and the seat number.
    pub fn from_kinds(kinds: &[AgentKind], seed: u64) -> Self {
        let seats = kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| kind.build(seed.wrapping_add(i as u64 * 7919)))
            .collect();
        Lineup { seats }
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.seats.iter().map(|a| a.name().to_string()).collect()
    }

    fn seat(&mut self, player: PlayerId) -> Option<&mut Box<dyn Agent>> {
        let agent = self.seats.get_mut(player.index());
        if agent.is_none() {
            trace!(%player, "no agent seated, using fallback");
        }
        agent
    }
}

fn first_route(routes: &[Route]) -> RouteId {
    routes.first().map_or(RouteId(0), |r| r.id)
}

impl ClassicPolicy for Lineup {
    fn decide_buy(&mut self, state: &ClassicState, player: PlayerId, property: &Property) -> bool {
        self.seat(player).is_some_and(|a| a.decide_buy(state, player, property))
    }

    fn decide_route(&mut self, state: &ClassicState, player: PlayerId, routes: &[Route]) -> RouteId {
        match self.seat(player) {
            Some(agent) => agent.decide_route(state, player, routes),
            None => first_route(routes),
        }
    }
}

impl TreasurePolicy for Lineup {
    fn personality(&mut self, player: PlayerId) -> Personality {
        self.seat(player).map_or_else(Personality::default, |a| a.personality())
    }

    fn choose_card_play(&mut self, state: &TreasureState, player: PlayerId) -> Option<CardPlay> {
        self.seat(player)?.choose_card_play(state, player)
    }

    fn choose_route(&mut self, state: &TreasureState, player: PlayerId, routes: &[Route]) -> RouteId {
        match self.seat(player) {
            Some(agent) => agent.choose_route(state, player, routes),
            None => first_route(routes),
        }
    }
}
