// ═══════════════════════════════════════════════════════════════════════
// Classic mode — property, rent and settlement turn state machine
//
// Flow of one turn:
//   playing ─roll─▶ (dice reveal) ─┬─ 1 route ──────────────▶ moving
//                                  └─ >1 routes ▶ branch_selection ─▶ moving
//   moving ─▶ destination_reached? ─▶ property_action? ─▶ end of turn
//   end of turn ─▶ settlement (every cycle_length rounds) ─▶ playing / game_over
//
// The game never waits on wall-clock time. Every pause is a step on the
// timeline; drivers call `advance_clock` (paced UI) or `run_until_idle`
// (headless). Human seats act through the public action methods; CPU seats
// are driven by timeline steps that consult the policy.
// ═══════════════════════════════════════════════════════════════════════

use crate::economy::{self, NodeAction, Settlement};
use crate::events::{CashReason, GameEvent};
use crate::map::GameMap;
use crate::maps::{self, DEFAULT_BONUS_AMOUNT, DEFAULT_PENALTY_AMOUNT};
use crate::navigation::{self, Route, RouteId};
use crate::policy::ClassicPolicy;
use crate::schedule::*;
use crate::settings::{validate_roster, ClassicSettings, LobbyPlayer, SetupError, MIN_CLASSIC_PLAYERS};
use crate::setup;
use crate::types::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::cmp::Reverse;
use tracing::{debug, info, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassicPhase {
    Lobby,
    Playing,
    BranchSelection,
    Moving,
    PropertyAction,
    Settlement,
    DestinationReached,
    GameOver,
}

/// Cash tile landed on this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileEvent {
    pub node: NodeId,
    pub kind: TileKind,
    /// Money actually gained or lost after the zero floor.
    pub delta: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassicState {
    pub phase: ClassicPhase,
    pub settings: ClassicSettings,
    pub map: GameMap,
    pub players: Vec<ClassicPlayer>,
    pub current_player: usize,
    pub round: u32,
    pub destination: Option<NodeId>,
    /// Drawn when the destination is reached, installed on acknowledgement.
    pub next_destination: Option<NodeId>,
    pub destination_reach_count: u32,

    // ── Per-turn, cleared on every turn change ──
    pub dice_value: Option<u8>,
    pub is_rolling: bool,
    pub routes: Vec<Route>,
    pub moving_path: Vec<NodeId>,
    pub node_action: Option<NodeAction>,
    pub tile_event: Option<TileEvent>,

    pub last_settlement: Option<Settlement>,
    pub settlements: Vec<Settlement>,
    /// Final ranking, filled at game over.
    pub standings: Vec<PlayerId>,
}

impl ClassicState {
    fn lobby(map: GameMap) -> Self {
        ClassicState {
            phase: ClassicPhase::Lobby,
            settings: ClassicSettings::default(),
            map,
            players: Vec::new(),
            current_player: 0,
            round: 1,
            destination: None,
            next_destination: None,
            destination_reach_count: 0,
            dice_value: None,
            is_rolling: false,
            routes: Vec::new(),
            moving_path: Vec::new(),
            node_action: None,
            tile_event: None,
            last_settlement: None,
            settlements: Vec::new(),
            standings: Vec::new(),
        }
    }

    pub fn current(&self) -> &ClassicPlayer {
        &self.players[self.current_player]
    }

    pub fn player(&self, id: PlayerId) -> &ClassicPlayer {
        &self.players[id.index()]
    }

    pub fn has_humans(&self) -> bool {
        self.players.iter().any(|p| p.is_human)
    }

    pub fn owner_of(&self, property: &PropertyId) -> Option<PlayerId> {
        economy::owner_of(&self.players, property).map(|p| p.id)
    }

    /// Seats by total assets, highest first. Ties keep seat order.
    pub fn ranking(&self) -> Vec<PlayerId> {
        let mut ranked: Vec<&ClassicPlayer> = self.players.iter().collect();
        ranked.sort_by_key(|p| Reverse(p.total_assets));
        ranked.into_iter().map(|p| p.id).collect()
    }

    pub fn winner(&self) -> Option<PlayerId> {
        match self.phase {
            ClassicPhase::GameOver => self.standings.first().copied(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    CpuTurn,
    RevealDice,
    CpuRoute,
    FinishMove,
    AutoAcknowledge,
}

pub struct ClassicGame<P: ClassicPolicy, R: Rng = ChaCha8Rng> {
    state: ClassicState,
    policy: P,
    rng: R,
    timeline: Timeline<Step>,
    generation: u64,
    events: Vec<GameEvent>,
}

impl<P: ClassicPolicy> ClassicGame<P> {
    /// A game on the built-in Classic board.
    pub fn new(policy: P, seed: u64) -> Self {
        Self::with_map(maps::classic_map(), policy, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<P: ClassicPolicy, R: Rng> ClassicGame<P, R> {
    pub fn with_map(map: GameMap, policy: P, rng: R) -> Self {
        ClassicGame {
            state: ClassicState::lobby(map),
            policy,
            rng,
            timeline: Timeline::new(),
            generation: 0,
            events: Vec::new(),
        }
    }

    // ── Read access ──────────────────────────────────────────────────────

    pub fn state(&self) -> &ClassicState {
        &self.state
    }

    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    pub fn now(&self) -> u64 {
        self.timeline.now()
    }

    /// No timed step is pending; the game waits on a human or is over.
    pub fn is_idle(&self) -> bool {
        self.timeline.is_empty()
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    pub fn start_game(&mut self, settings: ClassicSettings, roster: &[LobbyPlayer]) -> Result<(), SetupError> {
        settings.validate()?;
        validate_roster(roster, MIN_CLASSIC_PLAYERS)?;

        self.timeline.clear();
        let map = self.state.map.clone();
        let players = setup::classic_players(roster, &settings, &map);
        let occupied: Vec<NodeId> = players.iter().map(|p| p.position).collect();
        let destination = setup::pick_destination(&map, None, &occupied, &mut self.rng);

        self.state = ClassicState::lobby(map);
        self.state.settings = settings;
        self.state.players = players;
        self.state.destination = destination;

        info!(players = roster.len(), ?destination, "classic game started");
        self.emit(GameEvent::GameStarted { players: roster.len() });
        if let Some(node) = destination {
            self.emit(GameEvent::DestinationChanged { node });
        }
        self.begin_turn();
        Ok(())
    }

    /// Back to the lobby. Pending steps are discarded.
    pub fn reset_game(&mut self) {
        self.timeline.clear();
        self.generation += 1;
        let map = self.state.map.clone();
        self.state = ClassicState::lobby(map);
        debug!("classic game reset");
    }

    // ── Human actions ────────────────────────────────────────────────────
    // Each returns whether it was accepted. Anything out of phase, or
    // aimed at a CPU seat's turn, is a no-op.

    pub fn roll_dice(&mut self) -> bool {
        self.current_is_human() && self.start_roll()
    }

    pub fn select_route(&mut self, route: RouteId) -> bool {
        self.state.phase == ClassicPhase::BranchSelection && self.current_is_human() && self.take_route(route)
    }

    /// Buy `property` on the current node, or the first affordable unowned
    /// one when `None`.
    pub fn buy_property(&mut self, property: Option<PropertyId>) -> bool {
        if self.state.phase != ClassicPhase::PropertyAction || !self.current_is_human() {
            return false;
        }
        let Some(action) = &self.state.node_action else { return false };
        if !action.can_buy {
            return false;
        }
        let node = action.node;
        let money = self.state.current().money;
        let chosen = self
            .state
            .map
            .node(node)
            .properties
            .iter()
            .filter(|p| self.state.owner_of(&p.id).is_none())
            .find(|p| match property {
                Some(id) => p.id == id,
                None => p.price <= money,
            })
            .cloned();
        let Some(chosen) = chosen else { return false };
        if money < chosen.price {
            return false;
        }
        self.purchase(self.state.current_player, &chosen);
        self.refresh_can_buy();
        true
    }

    pub fn skip_buy(&mut self) -> bool {
        if self.state.phase != ClassicPhase::PropertyAction || !self.current_is_human() {
            return false;
        }
        self.end_turn();
        true
    }

    /// Dismiss the bonus/penalty/rent, settlement or destination modal.
    pub fn acknowledge_action(&mut self) -> bool {
        match self.state.phase {
            ClassicPhase::Settlement => self.acknowledge(),
            ClassicPhase::PropertyAction | ClassicPhase::DestinationReached if self.current_is_human() => {
                self.acknowledge()
            }
            _ => false,
        }
    }

    // ── Clock ────────────────────────────────────────────────────────────

    /// Fire every step due within the next `ms` milliseconds.
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

    /// Fire steps until nothing is pending. Returns the number processed.
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
            Step::CpuTurn => {
                if self.state.phase == ClassicPhase::Playing && !self.current_is_human() {
                    self.start_roll();
                }
            }
            Step::RevealDice => self.reveal_dice(),
            Step::CpuRoute => self.cpu_route(),
            Step::FinishMove => self.finish_move(),
            Step::AutoAcknowledge => {
                self.acknowledge();
            }
        }
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn emit(&mut self, event: GameEvent) {
        debug!(?event, "classic event");
        self.events.push(event);
    }

    fn set_phase(&mut self, phase: ClassicPhase) {
        self.generation += 1;
        debug!(from = ?self.state.phase, to = ?phase, generation = self.generation, "classic phase");
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

    fn begin_turn(&mut self) {
        self.set_phase(ClassicPhase::Playing);
        let player = self.current_id();
        self.emit(GameEvent::TurnStarted { player, round: self.state.round });
        if !self.current_is_human() {
            self.schedule(CPU_THINK_MS, Step::CpuTurn);
        }
    }

    fn start_roll(&mut self) -> bool {
        let s = &self.state;
        if s.phase != ClassicPhase::Playing || s.is_rolling || s.dice_value.is_some() {
            return false;
        }
        self.generation += 1;
        self.state.is_rolling = true;
        self.schedule(DICE_ROLL_MS, Step::RevealDice);
        true
    }

    fn reveal_dice(&mut self) {
        if self.state.phase != ClassicPhase::Playing || !self.state.is_rolling {
            return;
        }
        let value = navigation::roll_die(&mut self.rng);
        self.state.is_rolling = false;
        self.state.dice_value = Some(value);

        let from = self.state.current().position;
        let mut routes = navigation::enumerate_routes(&self.state.map, from, value as u32, self.state.destination);
        self.emit(GameEvent::DiceRolled { player: self.current_id(), value, routes: routes.len() });

        match routes.len() {
            0 => self.end_turn(),
            1 => {
                let route = routes.remove(0);
                self.start_move(route);
            }
            _ => {
                self.state.routes = routes;
                self.set_phase(ClassicPhase::BranchSelection);
                if !self.current_is_human() {
                    self.schedule(CPU_ROUTE_MS, Step::CpuRoute);
                }
            }
        }
    }

    fn cpu_route(&mut self) {
        if self.state.phase != ClassicPhase::BranchSelection || self.current_is_human() {
            return;
        }
        let player = self.current_id();
        let choice = self.policy.decide_route(&self.state, player, &self.state.routes);
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
        self.start_move(route);
        true
    }

    fn start_move(&mut self, route: Route) {
        self.set_phase(ClassicPhase::Moving);
        self.state.routes.clear();
        let duration = move_duration(route.path.len());
        self.state.moving_path = route.path;
        self.schedule(duration, Step::FinishMove);
    }

    fn finish_move(&mut self) {
        if self.state.phase != ClassicPhase::Moving {
            return;
        }
        let path = std::mem::take(&mut self.state.moving_path);
        let Some(&landing) = path.last() else {
            self.end_turn();
            return;
        };
        let idx = self.state.current_player;
        let player = self.current_id();
        let from = self.state.players[idx].position;
        self.state.players[idx].position = landing;
        self.emit(GameEvent::Moved { player, from, to: landing, steps: path.len() });

        if path.contains(&self.state.map.start()) {
            self.state.players[idx].laps_completed += 1;
            let laps = self.state.players[idx].laps_completed;
            self.emit(GameEvent::LapCompleted { player, laps });
        }

        if self.state.destination == Some(landing) {
            self.reach_destination(landing);
        } else {
            self.handle_tile(landing);
        }
    }

    fn reach_destination(&mut self, node: NodeId) {
        let idx = self.state.current_player;
        let player = self.current_id();
        let bonus = self.state.settings.destination_bonus;
        self.adjust_money(idx, bonus);
        self.emit(GameEvent::CashChanged { player, delta: bonus, reason: CashReason::Destination });
        self.emit(GameEvent::DestinationReached { player, node, bonus });

        let occupied: Vec<NodeId> = self.state.players.iter().map(|p| p.position).collect();
        self.state.next_destination = setup::pick_destination(&self.state.map, Some(node), &occupied, &mut self.rng);
        self.set_phase(ClassicPhase::DestinationReached);
        self.auto_acknowledge_for_cpu();
    }

    fn handle_tile(&mut self, node: NodeId) {
        let idx = self.state.current_player;
        let player = self.current_id();
        let (kind, amount) = {
            let n = self.state.map.node(node);
            (n.kind, n.amount)
        };
        let (default_amount, reason) = match kind {
            TileKind::Start => {
                self.end_turn();
                return;
            }
            TileKind::Property => {
                self.handle_property(node);
                return;
            }
            TileKind::Bonus => (DEFAULT_BONUS_AMOUNT, CashReason::Bonus),
            TileKind::Penalty => (DEFAULT_PENALTY_AMOUNT, CashReason::Penalty),
        };
        let delta = self.adjust_money(idx, amount.unwrap_or(default_amount));
        self.emit(GameEvent::CashChanged { player, delta, reason });
        self.state.tile_event = Some(TileEvent { node, kind, delta });
        self.state.node_action = Some(NodeAction { node, rent_payments: Vec::new(), can_buy: false });
        self.set_phase(ClassicPhase::PropertyAction);
        self.auto_acknowledge_for_cpu();
    }

    fn handle_property(&mut self, node: NodeId) {
        let idx = self.state.current_player;
        let player = self.current_id();
        let Some(action) = economy::rent_owed(&self.state.map, node, player, &self.state.players) else {
            self.end_turn();
            return;
        };

        for payment in &action.rent_payments {
            self.adjust_money(idx, -payment.amount);
            self.adjust_money(payment.to.index(), payment.amount);
            self.emit(GameEvent::RentPaid { from: player, to: payment.to, amount: payment.amount });
        }

        let had_rent = !action.rent_payments.is_empty();
        self.state.node_action = Some(action);

        if self.current_is_human() {
            if self.state.node_action.as_ref().is_some_and(|a| a.is_empty()) {
                self.end_turn();
            } else {
                self.set_phase(ClassicPhase::PropertyAction);
            }
            return;
        }

        let properties = self.state.map.node(node).properties.clone();
        let mut bought = false;
        for property in &properties {
            if self.state.owner_of(&property.id).is_some() || self.state.players[idx].money < property.price {
                continue;
            }
            if self.policy.decide_buy(&self.state, player, property) {
                self.purchase(idx, property);
                bought = true;
            }
        }
        self.refresh_can_buy();

        if had_rent || bought {
            self.set_phase(ClassicPhase::PropertyAction);
            self.auto_acknowledge_for_cpu();
        } else {
            self.end_turn();
        }
    }

    fn purchase(&mut self, idx: usize, property: &Property) {
        let p = &mut self.state.players[idx];
        p.money -= property.price;
        p.owned.insert(property.id);
        self.refresh_assets(idx);
        let player = self.state.players[idx].id;
        self.emit(GameEvent::PropertyBought { player, property: property.id, price: property.price });
    }

    fn refresh_can_buy(&mut self) {
        let Some(node) = self.state.node_action.as_ref().map(|a| a.node) else { return };
        let any_unowned = self
            .state
            .map
            .node(node)
            .properties
            .iter()
            .any(|p| self.state.owner_of(&p.id).is_none());
        if let Some(action) = self.state.node_action.as_mut() {
            action.can_buy = any_unowned;
        }
    }

    /// Add `delta` to a seat's money, flooring at zero. Returns the change
    /// actually applied.
    fn adjust_money(&mut self, idx: usize, delta: i64) -> i64 {
        let p = &mut self.state.players[idx];
        let before = p.money;
        p.money = (p.money + delta).max(0);
        let applied = p.money - before;
        self.refresh_assets(idx);
        applied
    }

    fn refresh_assets(&mut self, idx: usize) {
        let total = economy::total_assets(&self.state.players[idx], &self.state.map);
        self.state.players[idx].total_assets = total;
    }

    fn auto_acknowledge_for_cpu(&mut self) {
        if !self.current_is_human() {
            self.schedule(REVEAL_MS, Step::AutoAcknowledge);
        }
    }

    fn acknowledge(&mut self) -> bool {
        match self.state.phase {
            ClassicPhase::DestinationReached => {
                if let Some(next) = self.state.next_destination.take() {
                    self.state.destination = Some(next);
                    self.emit(GameEvent::DestinationChanged { node: next });
                }
                self.state.destination_reach_count += 1;
                let position = self.state.current().position;
                self.handle_tile(position);
                true
            }
            ClassicPhase::PropertyAction => {
                self.end_turn();
                true
            }
            ClassicPhase::Settlement => {
                if self.state.round > self.state.settings.total_rounds {
                    self.game_over();
                } else {
                    self.begin_turn();
                }
                true
            }
            _ => false,
        }
    }

    fn clear_turn(&mut self) {
        let s = &mut self.state;
        s.dice_value = None;
        s.is_rolling = false;
        s.routes.clear();
        s.moving_path.clear();
        s.node_action = None;
        s.tile_event = None;
    }

    fn end_turn(&mut self) {
        self.clear_turn();
        let old_round = self.state.round;
        self.state.current_player = (self.state.current_player + 1) % self.state.players.len();
        if self.state.current_player == 0 {
            self.state.round += 1;
        }
        let wrapped = self.state.round > old_round;
        let cycle_length = self.state.settings.cycle_length;

        if wrapped && old_round % cycle_length == 0 {
            self.settle(old_round, old_round / cycle_length);
            return;
        }
        if self.state.round > self.state.settings.total_rounds {
            self.game_over();
            return;
        }
        self.begin_turn();
    }

    fn settle(&mut self, round: u32, cycle_number: u32) {
        let settlement = economy::settle_income(&self.state.players, &self.state.map, round, cycle_number);
        for income in &settlement.incomes {
            if income.amount != 0 {
                self.adjust_money(income.player.index(), income.amount);
                self.emit(GameEvent::CashChanged {
                    player: income.player,
                    delta: income.amount,
                    reason: CashReason::Settlement,
                });
            }
        }
        let total = settlement.incomes.iter().map(|i| i.amount).sum();
        self.emit(GameEvent::SettlementPaid { round, cycle_number, total });
        self.state.last_settlement = Some(settlement.clone());
        self.state.settlements.push(settlement);

        self.set_phase(ClassicPhase::Settlement);
        if !self.state.has_humans() {
            self.schedule(REVEAL_MS, Step::AutoAcknowledge);
        }
    }

    fn game_over(&mut self) {
        self.state.standings = self.state.ranking();
        self.set_phase(ClassicPhase::GameOver);
        self.timeline.clear();
        info!(round = self.state.round, winner = ?self.state.standings.first(), "classic game over");
        let standings = self.state.standings.clone();
        self.emit(GameEvent::GameOver { standings });
    }
}
