// ═══════════════════════════════════════════════════════════════════════
// Treasure Hunt mode — digging, stealing and cards turn state machine
//
// Flow of one turn:
//   turn start: tick effects ─▶ game over? ─▶ paralysed? skip : playing
//   playing ─(cards)─▶ roll ─▶ route_selection (if >1 route) ─▶ moving
//   moving walks in chunks: each cell holding a stealable opponent halts
//   the walk, resolves steals (steal_result), then resumes the remainder
//   landing ─▶ card_result | mining_result | straight to the next turn
// ═══════════════════════════════════════════════════════════════════════

use crate::cards::{self, CardPlay, CardTargetKind, CardTargetSelection};
use crate::combat::{self, StealContext, StealOutcome};
use crate::events::GameEvent;
use crate::map::GameMap;
use crate::mining;
use crate::navigation::{self, Route, RouteId};
use crate::policy::TreasurePolicy;
use crate::schedule::*;
use crate::settings::{validate_roster, LobbyPlayer, SetupError, TreasureSettings, MIN_TREASURE_PLAYERS};
use crate::setup;
use crate::types::*;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::{debug, info, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TreasurePhase {
    Lobby,
    Playing,
    RouteSelection,
    Moving,
    StealResult,
    MiningResult,
    CardResult,
    CardTargetSelection,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MiningResult {
    pub node: NodeId,
    pub outcome: DigOutcome,
    pub chance: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TreasureState {
    pub phase: TreasurePhase,
    pub settings: TreasureSettings,
    pub map: GameMap,
    pub players: Vec<TreasurePlayer>,
    pub current_player: usize,
    pub round: u32,
    pub mined: BTreeMap<NodeId, MiningRecord>,

    // ── Per-turn, cleared on every turn change ──
    /// Effects in force for the current player this turn.
    pub turn_effects: Vec<Effect>,
    pub dice_value: Option<u8>,
    pub is_rolling: bool,
    pub routes: Vec<Route>,
    pub moving_path: Vec<NodeId>,
    /// Index into `moving_path` of the next cell still to walk.
    pub path_cursor: usize,
    pub steal_results: Vec<StealOutcome>,
    pub mining_result: Option<MiningResult>,
    pub card_result: Option<Card>,
    pub card_target: Option<CardTargetSelection>,

    pub standings: Vec<PlayerId>,
    next_card_serial: u32,
}

impl TreasureState {
    fn lobby(map: GameMap) -> Self {
        TreasureState {
            phase: TreasurePhase::Lobby,
            settings: TreasureSettings::default(),
            map,
            players: Vec::new(),
            current_player: 0,
            round: 1,
            mined: BTreeMap::new(),
            turn_effects: Vec::new(),
            dice_value: None,
            is_rolling: false,
            routes: Vec::new(),
            moving_path: Vec::new(),
            path_cursor: 0,
            steal_results: Vec::new(),
            mining_result: None,
            card_result: None,
            card_target: None,
            standings: Vec::new(),
            next_card_serial: 1,
        }
    }

    pub fn current(&self) -> &TreasurePlayer {
        &self.players[self.current_player]
    }

    pub fn player(&self, id: PlayerId) -> &TreasurePlayer {
        &self.players[id.index()]
    }

    pub fn is_in_force(&self, kind: EffectKind) -> bool {
        self.turn_effects.iter().any(|e| e.kind == kind)
    }

    pub fn mining_chance(&self, node: NodeId) -> f64 {
        mining::mining_chance(&self.map, &self.mined, node)
    }

    /// Nodes whose dig was made by `player`.
    pub fn mined_by(&self, player: PlayerId) -> Vec<NodeId> {
        self.mined
            .iter()
            .filter(|(_, r)| r.miner == Some(player))
            .map(|(&n, _)| n)
            .collect()
    }

    /// Opponent holding the most treasures; seat order breaks ties.
    pub fn leader_excluding(&self, player: PlayerId) -> Option<PlayerId> {
        self.players
            .iter()
            .filter(|p| p.id != player)
            .min_by_key(|p| (Reverse(p.treasures), p.id))
            .map(|p| p.id)
    }

    /// Seats by treasure count, highest first. Ties keep seat order.
    pub fn ranking(&self) -> Vec<PlayerId> {
        let mut ranked: Vec<&TreasurePlayer> = self.players.iter().collect();
        ranked.sort_by_key(|p| Reverse(p.treasures));
        ranked.into_iter().map(|p| p.id).collect()
    }

    pub fn winner(&self) -> Option<PlayerId> {
        match self.phase {
            TreasurePhase::GameOver => self.standings.first().copied(),
            _ => None,
        }
    }

    fn is_finished(&self) -> bool {
        let target = self.settings.target_treasures;
        self.players.iter().any(|p| p.treasures >= target)
            || mining::all_mined(&self.map, &self.mined)
            || self.settings.round_limit.is_some_and(|limit| self.round > limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    CpuTurn,
    RevealDice,
    CpuRoute,
    WalkTo { index: usize },
    ResumeWalk,
    Land,
    EndTurn,
    SkipTurn,
}

pub struct TreasureGame<P: TreasurePolicy, R: Rng = ChaCha8Rng> {
    state: TreasureState,
    /// Replaces the map named in the settings.
    map_override: Option<GameMap>,
    policy: P,
    rng: R,
    timeline: Timeline<Step>,
    generation: u64,
    events: Vec<GameEvent>,
}

impl<P: TreasurePolicy> TreasureGame<P> {
    pub fn new(policy: P, seed: u64) -> Self {
        TreasureGame {
            state: TreasureState::lobby(TreasureSettings::default().map.build()),
            map_override: None,
            policy,
            rng: ChaCha8Rng::seed_from_u64(seed),
            timeline: Timeline::new(),
            generation: 0,
            events: Vec::new(),
        }
    }
}

impl<P: TreasurePolicy, R: Rng> TreasureGame<P, R> {
    /// A game that always plays on `map`, whatever the settings name.
    pub fn with_map(map: GameMap, policy: P, rng: R) -> Self {
        TreasureGame {
            state: TreasureState::lobby(map.clone()),
            map_override: Some(map),
            policy,
            rng,
            timeline: Timeline::new(),
            generation: 0,
            events: Vec::new(),
        }
    }

    // ── Read access ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TreasureState {
        &self.state
    }

    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    pub fn now(&self) -> u64 {
        self.timeline.now()
    }

    pub fn is_idle(&self) -> bool {
        self.timeline.is_empty()
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut TreasureState {
        &mut self.state
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    pub fn start_game(&mut self, settings: TreasureSettings, roster: &[LobbyPlayer]) -> Result<(), SetupError> {
        settings.validate()?;
        validate_roster(roster, MIN_TREASURE_PLAYERS)?;

        self.timeline.clear();
        let map = match &self.map_override {
            Some(map) => map.clone(),
            None => settings.map.build(),
        };
        let seats = setup::pad_treasure_roster(roster);
        let mut players = setup::treasure_players(&seats, &map, &mut self.rng);
        for p in players.iter_mut().filter(|p| !p.is_human) {
            p.personality = Some(self.policy.personality(p.id));
        }

        self.state = TreasureState::lobby(map);
        self.state.settings = settings;
        self.state.players = players;

        info!(players = seats.len(), map = %self.state.settings.map, "treasure game started");
        self.emit(GameEvent::GameStarted { players: seats.len() });
        self.start_turn();
        Ok(())
    }

    pub fn reset_game(&mut self) {
        self.timeline.clear();
        self.generation += 1;
        let map = self.state.map.clone();
        self.state = TreasureState::lobby(map);
        debug!("treasure game reset");
    }

    // ── Human actions ────────────────────────────────────────────────────

    pub fn roll_dice(&mut self) -> bool {
        self.current_is_human() && self.start_roll()
    }

    pub fn select_route(&mut self, route: RouteId) -> bool {
        self.state.phase == TreasurePhase::RouteSelection && self.current_is_human() && self.take_route(route)
    }

    /// Play a held active card. Blow-away warps to a random node and the
    /// time machine revives a random node of yours; pick the node instead
    /// with `setup_card_target_selection`.
    pub fn use_card(&mut self, card: CardId, target: Option<PlayerId>) -> bool {
        self.current_is_human() && self.play_card(CardPlay { card_id: card, target, node: None })
    }

    /// Enter node selection for a blow-away or time machine card.
    pub fn setup_card_target_selection(
        &mut self,
        card: CardId,
        kind: CardTargetKind,
        target: Option<PlayerId>,
    ) -> bool {
        if !self.current_is_human() || !self.can_play_cards() {
            return false;
        }
        let user = self.current_id();
        let Some(held) = self.state.current().cards.iter().find(|c| c.id == card).copied() else {
            return false;
        };
        if held.kind != kind.card_kind() {
            return false;
        }
        if cards::resolve_target(held.kind, user, target, self.state.players.len()).is_none() {
            return false;
        }
        let valid_nodes = match kind {
            CardTargetKind::WarpDestination => self.state.map.node_ids().collect(),
            CardTargetKind::ReviveNode => self.state.mined_by(user),
        };
        if valid_nodes.is_empty() {
            return false;
        }
        self.state.card_target = Some(CardTargetSelection { card_id: card, kind, target_player: target, valid_nodes });
        self.set_phase(TreasurePhase::CardTargetSelection);
        true
    }

    pub fn confirm_card_target_selection(&mut self, node: NodeId) -> bool {
        if self.state.phase != TreasurePhase::CardTargetSelection || !self.current_is_human() {
            return false;
        }
        let Some(selection) = self.state.card_target.clone() else { return false };
        if !selection.valid_nodes.contains(&node) {
            return false;
        }
        self.state.card_target = None;
        self.set_phase(TreasurePhase::Playing);
        self.play_card(CardPlay { card_id: selection.card_id, target: selection.target_player, node: Some(node) })
    }

    pub fn cancel_card_target_selection(&mut self) -> bool {
        if self.state.phase != TreasurePhase::CardTargetSelection || !self.current_is_human() {
            return false;
        }
        self.state.card_target = None;
        self.set_phase(TreasurePhase::Playing);
        true
    }

    /// Skip the rest of a mining or card reveal.
    pub fn acknowledge(&mut self) -> bool {
        let revealing = matches!(self.state.phase, TreasurePhase::MiningResult | TreasurePhase::CardResult);
        if !revealing || !self.current_is_human() {
            return false;
        }
        self.advance_turn();
        true
    }

    // ── Clock ────────────────────────────────────────────────────────────

    pub fn advance_clock(&mut self, ms: u64) -> usize {
        let deadline = self.timeline.now().saturating_add(ms);
        let mut fired = 0;
        while fired < MAX_STEPS_PER_RUN {
            let Some(due) = self.timeline.pop_due(deadline) else { break };
            self.fire(due.generation, due.step);
            fired += 1;
        }
        self.timeline.advance_to(deadline);
        fired
    }

    pub fn run_until_idle(&mut self) -> usize {
        let mut fired = 0;
        while fired < MAX_STEPS_PER_RUN {
            let Some(due) = self.timeline.pop_due(u64::MAX) else { break };
            self.fire(due.generation, due.step);
            fired += 1;
        }
        fired
    }

    fn fire(&mut self, generation: u64, step: Step) {
        if generation != self.generation {
            trace!(?step, generation, current = self.generation, "dropping stale step");
            return;
        }
        match step {
            Step::CpuTurn => self.cpu_turn(),
            Step::RevealDice => self.reveal_dice(),
            Step::CpuRoute => self.cpu_route(),
            Step::WalkTo { index } => self.walk_to(index),
            Step::ResumeWalk => {
                if self.state.phase == TreasurePhase::StealResult {
                    self.state.steal_results.clear();
                    self.set_phase(TreasurePhase::Moving);
                    self.schedule_walk();
                }
            }
            Step::Land => self.land(),
            Step::EndTurn => {
                if matches!(self.state.phase, TreasurePhase::MiningResult | TreasurePhase::CardResult) {
                    self.advance_turn();
                }
            }
            Step::SkipTurn => {
                if self.state.phase == TreasurePhase::Playing && self.state.is_in_force(EffectKind::Paralyzed) {
                    self.advance_turn();
                }
            }
        }
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn emit(&mut self, event: GameEvent) {
        debug!(?event, "treasure event");
        self.events.push(event);
    }

    fn set_phase(&mut self, phase: TreasurePhase) {
        self.generation += 1;
        debug!(from = ?self.state.phase, to = ?phase, generation = self.generation, "treasure phase");
        self.state.phase = phase;
    }

    fn schedule(&mut self, delay_ms: u64, step: Step) {
        self.timeline.schedule(delay_ms, self.generation, step);
    }

    fn current_is_human(&self) -> bool {
        self.state.players.get(self.state.current_player).is_some_and(|p| p.is_human)
    }

    fn current_id(&self) -> PlayerId {
        self.state.current().id
    }

    /// Cards are played in `playing`, before the dice, by an unparalysed
    /// current player.
    fn can_play_cards(&self) -> bool {
        let s = &self.state;
        s.phase == TreasurePhase::Playing
            && !s.is_rolling
            && s.dice_value.is_none()
            && !s.is_in_force(EffectKind::Paralyzed)
    }

    // ── Turn order ───────────────────────────────────────────────────────

    fn clear_turn(&mut self) {
        let s = &mut self.state;
        s.turn_effects.clear();
        s.dice_value = None;
        s.is_rolling = false;
        s.routes.clear();
        s.moving_path.clear();
        s.path_cursor = 0;
        s.steal_results.clear();
        s.mining_result = None;
        s.card_result = None;
        s.card_target = None;
    }

    fn advance_turn(&mut self) {
        self.clear_turn();
        self.state.current_player = (self.state.current_player + 1) % self.state.players.len();
        if self.state.current_player == 0 {
            self.state.round += 1;
        }
        self.start_turn();
    }

    fn start_turn(&mut self) {
        let idx = self.state.current_player;
        self.state.turn_effects = cards::tick_effects(&mut self.state.players[idx].active_effects);
        if self.state.is_finished() {
            self.game_over();
            return;
        }
        self.set_phase(TreasurePhase::Playing);
        let player = self.current_id();
        self.emit(GameEvent::TurnStarted { player, round: self.state.round });

        if self.state.is_in_force(EffectKind::Paralyzed) {
            self.emit(GameEvent::TurnSkipped { player });
            self.schedule(PARALYSIS_SKIP_MS, Step::SkipTurn);
        } else if !self.current_is_human() {
            self.schedule(CPU_THINK_MS, Step::CpuTurn);
        }
    }

    fn game_over(&mut self) {
        self.state.standings = self.state.ranking();
        self.set_phase(TreasurePhase::GameOver);
        self.timeline.clear();
        info!(round = self.state.round, winner = ?self.state.standings.first(), "treasure game over");
        let standings = self.state.standings.clone();
        self.emit(GameEvent::GameOver { standings });
    }

    // ── Cards ────────────────────────────────────────────────────────────

    fn play_card(&mut self, play: CardPlay) -> bool {
        if !self.can_play_cards() {
            return false;
        }
        let idx = self.state.current_player;
        let user = self.current_id();
        let Some(card) = self.state.players[idx].cards.iter().find(|c| c.id == play.card_id).copied() else {
            return false;
        };
        let Some(target) = cards::resolve_target(card.kind, user, play.target, self.state.players.len()) else {
            return false;
        };

        let revive = if card.kind == CardKind::TimeMachine {
            let own = self.state.mined_by(user);
            let chosen = match play.node {
                Some(n) if own.contains(&n) => Some(n),
                Some(_) => None,
                None => own.choose(&mut self.rng).copied(),
            };
            match chosen {
                Some(n) => Some(n),
                None => return false,
            }
        } else {
            None
        };

        self.state.players[idx].cards.retain(|c| c.id != card.id);
        self.emit(GameEvent::CardPlayed { player: user, card: card.kind, target: Some(target) });

        match card.kind {
            CardKind::Seal | CardKind::Paralysis | CardKind::Dice1 | CardKind::Dice10 => {
                if let Some(effect) = cards::effect_for(card.kind) {
                    self.state.players[target.index()].active_effects.push(effect);
                    self.emit(GameEvent::EffectApplied {
                        player: target,
                        effect: effect.kind,
                        turns: effect.remaining_turns,
                    });
                }
            }
            CardKind::BlowAway => {
                let to = match play.node.filter(|n| self.state.map.get(*n).is_some()) {
                    Some(n) => n,
                    None => {
                        let ids: Vec<NodeId> = self.state.map.node_ids().collect();
                        ids.choose(&mut self.rng).copied().unwrap_or(self.state.map.start())
                    }
                };
                self.state.players[target.index()].position = to;
                self.emit(GameEvent::Warped { player: target, to });
            }
            CardKind::PhoneFraud => {
                let outcome =
                    combat::perform_steal(&mut self.state.players, user, target, StealContext::SameNode, &mut self.rng);
                self.emit(GameEvent::Steal(outcome));
            }
            CardKind::TimeMachine => {
                if let Some(node) = revive {
                    self.state.mined.remove(&node);
                    self.emit(GameEvent::NodeRevived { player: user, node });
                }
            }
            CardKind::PowerUp | CardKind::Substitute => {}
        }
        true
    }

    // ── Rolling and moving ───────────────────────────────────────────────

    fn cpu_turn(&mut self) {
        if self.state.phase != TreasurePhase::Playing || self.current_is_human() {
            return;
        }
        let player = self.current_id();
        if let Some(play) = self.policy.choose_card_play(&self.state, player) {
            if !self.play_card(play) {
                debug!(?play, "cpu card play rejected");
            }
        }
        self.start_roll();
    }

    fn start_roll(&mut self) -> bool {
        if !self.can_play_cards() {
            return false;
        }
        self.generation += 1;
        self.state.is_rolling = true;
        self.schedule(DICE_ROLL_MS, Step::RevealDice);
        true
    }

    /// A dice effect in force this turn wins; otherwise a dice card the
    /// player aimed at themselves earlier this turn is spent here.
    fn forced_dice(&mut self) -> Option<u8> {
        if let Some(v) = self.state.turn_effects.iter().find_map(|e| e.kind.forced_dice()) {
            return Some(v);
        }
        let effects = &mut self.state.players[self.state.current_player].active_effects;
        let pos = effects.iter().position(|e| e.kind.forced_dice().is_some())?;
        effects.remove(pos).kind.forced_dice()
    }

    fn reveal_dice(&mut self) {
        if self.state.phase != TreasurePhase::Playing || !self.state.is_rolling {
            return;
        }
        let value = match self.forced_dice() {
            Some(v) => v,
            None => navigation::roll_die(&mut self.rng),
        };
        self.state.is_rolling = false;
        self.state.dice_value = Some(value);

        let from = self.state.current().position;
        let mut routes = navigation::enumerate_routes(&self.state.map, from, value as u32, None);
        self.emit(GameEvent::DiceRolled { player: self.current_id(), value, routes: routes.len() });

        match routes.len() {
            0 => self.advance_turn(),
            1 => {
                let route = routes.remove(0);
                self.start_walk(route);
            }
            _ => {
                self.state.routes = routes;
                self.set_phase(TreasurePhase::RouteSelection);
                if !self.current_is_human() {
                    self.schedule(CPU_ROUTE_MS, Step::CpuRoute);
                }
            }
        }
    }

    fn cpu_route(&mut self) {
        if self.state.phase != TreasurePhase::RouteSelection || self.current_is_human() {
            return;
        }
        let player = self.current_id();
        let choice = self.policy.choose_route(&self.state, player, &self.state.routes);
        if !self.take_route(choice) {
            if let Some(fallback) = self.state.routes.first().map(|r| r.id) {
                self.take_route(fallback);
            }
        }
    }

    fn take_route(&mut self, id: RouteId) -> bool {
        let Some(route) = self.state.routes.iter().find(|r| r.id == id).cloned() else {
            return false;
        };
        self.start_walk(route);
        true
    }

    fn start_walk(&mut self, route: Route) {
        self.set_phase(TreasurePhase::Moving);
        self.state.routes.clear();
        self.state.moving_path = route.path;
        self.state.path_cursor = 0;
        self.emit(GameEvent::Moved {
            player: self.current_id(),
            from: self.state.current().position,
            to: route.landing,
            steps: self.state.moving_path.len(),
        });
        self.schedule_walk();
    }

    /// Queue the walk up to the next cell holding a stealable opponent, or
    /// to the landing if there is none.
    fn schedule_walk(&mut self) {
        let player = self.current_id();
        let s = &self.state;
        let cursor = s.path_cursor;
        let stop = (cursor..s.moving_path.len())
            .find(|&i| !combat::stealable_at(&s.players, player, s.moving_path[i]).is_empty());
        match stop {
            Some(index) => self.schedule(STEP_MS * (index + 1 - cursor) as u64, Step::WalkTo { index }),
            None => {
                let remaining = s.moving_path.len().saturating_sub(cursor) as u64;
                self.schedule(STEP_MS * remaining, Step::Land);
            }
        }
    }

    fn walk_to(&mut self, index: usize) {
        if self.state.phase != TreasurePhase::Moving {
            return;
        }
        let Some(&node) = self.state.moving_path.get(index) else { return };
        let idx = self.state.current_player;
        let attacker = self.current_id();
        self.state.players[idx].position = node;
        self.state.path_cursor = index + 1;

        let context = if index + 1 == self.state.moving_path.len() {
            StealContext::SameNode
        } else {
            StealContext::PassBy
        };
        for defender in combat::stealable_at(&self.state.players, attacker, node) {
            if self.state.players[defender.index()].treasures == 0 {
                continue;
            }
            let outcome = combat::perform_steal(&mut self.state.players, attacker, defender, context, &mut self.rng);
            self.state.steal_results.push(outcome);
            self.emit(GameEvent::Steal(outcome));
        }
        self.set_phase(TreasurePhase::StealResult);
        self.schedule(STEAL_PAUSE_MS, Step::ResumeWalk);
    }

    fn land(&mut self) {
        if self.state.phase != TreasurePhase::Moving {
            return;
        }
        let idx = self.state.current_player;
        let player = self.current_id();
        let Some(&node) = self.state.moving_path.last() else {
            self.advance_turn();
            return;
        };
        self.state.players[idx].position = node;
        self.state.moving_path.clear();
        self.state.path_cursor = 0;

        match self.state.map.node(node).kind {
            TileKind::Bonus => {
                let serial = self.state.next_card_serial;
                self.state.next_card_serial += 1;
                let card = cards::draw_card(&mut self.rng, serial);
                self.state.players[idx].cards.push(card);
                self.state.card_result = Some(card);
                self.emit(GameEvent::CardDrawn { player, card: card.kind });
                self.set_phase(TreasurePhase::CardResult);
                self.schedule(REVEAL_MS, Step::EndTurn);
            }
            TileKind::Property => self.dig(node),
            TileKind::Start | TileKind::Penalty => self.advance_turn(),
        }
    }

    fn dig(&mut self, node: NodeId) {
        let idx = self.state.current_player;
        let player = self.current_id();
        if self.state.is_in_force(EffectKind::Sealed) {
            self.emit(GameEvent::DigBlocked { player, node });
            self.advance_turn();
            return;
        }
        let chance = self.state.mining_chance(node);
        let outcome = mining::attempt_dig(&self.state.map, &self.state.mined, node, &mut self.rng);
        if outcome == DigOutcome::Empty {
            self.advance_turn();
            return;
        }
        mining::apply_dig(&mut self.state.players[idx], &mut self.state.mined, node, outcome);
        self.state.mining_result = Some(MiningResult { node, outcome, chance });
        self.emit(GameEvent::Dug { player, node, outcome, chance });
        self.set_phase(TreasurePhase::MiningResult);
        self.schedule(REVEAL_MS, Step::EndTurn);
    }
}
