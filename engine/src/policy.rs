// ═══════════════════════════════════════════════════════════════════════
// CPU policy seams
//
// The games never decide for a CPU seat themselves. When a CPU seat
// reaches a decision point the game asks its policy, which sees the same
// read-only state a human UI would.
// ═══════════════════════════════════════════════════════════════════════

use crate::cards::CardPlay;
use crate::classic::ClassicState;
use crate::navigation::{Route, RouteId};
use crate::treasure::TreasureState;
use crate::types::*;

pub trait ClassicPolicy {
    /// Buy `property` (already known to be unowned and affordable)?
    fn decide_buy(&mut self, state: &ClassicState, player: PlayerId, property: &Property) -> bool;

    /// Pick one of `routes` (never empty).
    fn decide_route(&mut self, state: &ClassicState, player: PlayerId, routes: &[Route]) -> RouteId;
}

pub trait TreasurePolicy {
    /// Drawn once per CPU seat at game start.
    fn personality(&mut self, player: PlayerId) -> Personality;

    /// Optionally play a held card before rolling.
    fn choose_card_play(&mut self, state: &TreasureState, player: PlayerId) -> Option<CardPlay>;

    /// Pick one of `routes` (never empty).
    fn choose_route(&mut self, state: &TreasureState, player: PlayerId, routes: &[Route]) -> RouteId;
}

/// Deterministic baseline: buys whatever it can afford, always takes the
/// first route, never plays cards.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstChoice;

impl ClassicPolicy for FirstChoice {
    fn decide_buy(&mut self, _: &ClassicState, _: PlayerId, _: &Property) -> bool {
        true
    }

    fn decide_route(&mut self, _: &ClassicState, _: PlayerId, routes: &[Route]) -> RouteId {
        routes.first().map_or(RouteId(0), |r| r.id)
    }
}

impl TreasurePolicy for FirstChoice {
    fn personality(&mut self, _: PlayerId) -> Personality {
        Personality::default()
    }

    fn choose_card_play(&mut self, _: &TreasureState, _: PlayerId) -> Option<CardPlay> {
        None
    }

    fn choose_route(&mut self, _: &TreasureState, _: PlayerId, routes: &[Route]) -> RouteId {
        routes.first().map_or(RouteId(0), |r| r.id)
    }
}
