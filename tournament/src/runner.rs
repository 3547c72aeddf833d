// ═══════════════════════════════════════════════════════════════════════
// Game Runner — plays complete headless CPU games and collects results
// ═══════════════════════════════════════════════════════════════════════

use pepe_agents::{AgentKind, Lineup};
use pepe_engine::events::GameEvent;
use pepe_engine::settings::MAX_PLAYERS;
use pepe_engine::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Virtual time advanced per driver iteration.
const CLOCK_SLICE_MS: u64 = 10_000;

/// Default safety limit on timeline steps per game.
pub const DEFAULT_MAX_STEPS: usize = 50_000;

/// Agent name recorded for Treasure seats filled in as NPC thieves, kept
/// apart from the entrants' ratings.
pub const NPC_AGENT_NAME: &str = "NPC Heuristic";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Classic,
    Treasure,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Classic => write!(f, "classic"),
            Mode::Treasure => write!(f, "treasure"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classic" => Ok(Mode::Classic),
            "treasure" => Ok(Mode::Treasure),
            other => Err(format!("unknown mode '{other}' (expected classic or treasure)")),
        }
    }
}

/// Result of a completed game.
#[derive(Debug, Clone, Serialize)]
pub struct GameResult {
    pub seed: u64,
    pub mode: Mode,
    pub rounds_played: u32,
    pub steps: usize,
    pub winner: PlayerId,
    /// Seats in final ranking order.
    pub player_results: Vec<PlayerResult>,
}

impl GameResult {
    pub fn winner_agent(&self) -> &str {
        self.player_results
            .iter()
            .find(|p| p.seat == self.winner)
            .map_or("", |p| p.agent_name.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerResult {
    pub seat: PlayerId,
    pub name: String,
    pub agent_name: String,
    /// 1 for the winner.
    pub rank: usize,
    /// Total assets (Classic) or treasures (Treasure).
    pub score: i64,
}

/// Everything needed to replay one pairing many times.
#[derive(Debug, Clone)]
pub struct MatchSpec {
    pub mode: Mode,
    pub kinds: Vec<AgentKind>,
    pub classic: ClassicSettings,
    pub treasure: TreasureSettings,
    pub max_steps: usize,
}

impl MatchSpec {
    pub fn new(mode: Mode, kinds: Vec<AgentKind>) -> Self {
        MatchSpec {
            mode,
            kinds,
            classic: ClassicSettings::default(),
            treasure: TreasureSettings::default(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

fn cpu_roster(seats: usize) -> Vec<LobbyPlayer> {
    PlayerColor::ALL
        .iter()
        .take(seats)
        .enumerate()
        .map(|(i, &color)| LobbyPlayer::cpu(&format!("CPU {}", i + 1), color))
        .collect()
}

/// Fire timeline steps slice by slice until the game goes idle, feeding
/// every event to `on_event`. Errors once `max_steps` is exceeded.
fn drive<F, A>(mut advance: A, max_steps: usize, mut on_event: F) -> Result<usize, String>
where
    A: FnMut(u64) -> (usize, Vec<GameEvent>, bool),
    F: FnMut(&GameEvent),
{
    let mut fired = 0;
    loop {
        let (n, events, idle) = advance(CLOCK_SLICE_MS);
        fired += n;
        events.iter().for_each(&mut on_event);
        if idle {
            return Ok(fired);
        }
        if fired > max_steps {
            return Err(format!("game exceeded {max_steps} steps without finishing"));
        }
    }
}

fn rank(standings: &[PlayerId], names: &[String], agents: &[String], score: impl Fn(PlayerId) -> i64) -> Vec<PlayerResult> {
    standings
        .iter()
        .enumerate()
        .map(|(i, &seat)| PlayerResult {
            seat,
            name: names.get(seat.index()).cloned().unwrap_or_default(),
            agent_name: agents.get(seat.index()).cloned().unwrap_or_default(),
            rank: i + 1,
            score: score(seat),
        })
        .collect()
}

// ── Classic ──────────────────────────────────────────────────────────────

pub fn run_classic(kinds: &[AgentKind], settings: &ClassicSettings, seed: u64, max_steps: usize) -> Result<GameResult, String> {
    run_classic_with(kinds, settings, seed, max_steps, |_| {})
}

/// Play one Classic game, one agent per seat, reporting every event.
pub fn run_classic_with<F: FnMut(&GameEvent)>(
    kinds: &[AgentKind],
    settings: &ClassicSettings,
    seed: u64,
    max_steps: usize,
    on_event: F,
) -> Result<GameResult, String> {
    let lineup = Lineup::from_kinds(kinds, seed);
    let agents = lineup.names();
    let roster = cpu_roster(kinds.len());

    let mut game = ClassicGame::new(lineup, seed);
    game.start_game(settings.clone(), &roster).map_err(|e| e.to_string())?;

    let steps = drive(
        |ms| {
            let n = game.advance_clock(ms);
            (n, game.drain_events(), game.is_idle())
        },
        max_steps,
        on_event,
    )?;

    let s = game.state();
    let Some(winner) = s.winner() else {
        return Err(format!("game stuck: phase={:?}, round={}", s.phase, s.round));
    };
    let names: Vec<String> = s.players.iter().map(|p| p.name.clone()).collect();
    let player_results = rank(&s.standings, &names, &agents, |p| s.player(p).total_assets);
    debug!(seed, steps, %winner, "classic game finished");
    Ok(GameResult { seed, mode: Mode::Classic, rounds_played: s.round - 1, steps, winner, player_results })
}

// ── Treasure ─────────────────────────────────────────────────────────────

pub fn run_treasure(kinds: &[AgentKind], settings: &TreasureSettings, seed: u64, max_steps: usize) -> Result<GameResult, String> {
    run_treasure_with(kinds, settings, seed, max_steps, |_| {})
}

/// Play one Treasure game. Seats past `kinds` are filled by the game's NPC
/// thieves, which play heuristically.
pub fn run_treasure_with<F: FnMut(&GameEvent)>(
    kinds: &[AgentKind],
    settings: &TreasureSettings,
    seed: u64,
    max_steps: usize,
    on_event: F,
) -> Result<GameResult, String> {
    let mut seated = kinds.to_vec();
    seated.resize(MAX_PLAYERS.max(kinds.len()), AgentKind::Heuristic);
    let lineup = Lineup::from_kinds(&seated, seed);
    let mut agents = lineup.names();
    for name in agents.iter_mut().skip(kinds.len()) {
        *name = NPC_AGENT_NAME.to_string();
    }
    let roster = cpu_roster(kinds.len());

    let mut game = TreasureGame::new(lineup, seed);
    game.start_game(settings.clone(), &roster).map_err(|e| e.to_string())?;

    let steps = drive(
        |ms| {
            let n = game.advance_clock(ms);
            (n, game.drain_events(), game.is_idle())
        },
        max_steps,
        on_event,
    )?;

    let s = game.state();
    let Some(winner) = s.winner() else {
        return Err(format!("game stuck: phase={:?}, round={}", s.phase, s.round));
    };
    let names: Vec<String> = s.players.iter().map(|p| p.name.clone()).collect();
    let player_results = rank(&s.standings, &names, &agents, |p| s.player(p).treasures as i64);
    debug!(seed, steps, %winner, "treasure game finished");
    Ok(GameResult { seed, mode: Mode::Treasure, rounds_played: s.round, steps, winner, player_results })
}

// ── Batches ──────────────────────────────────────────────────────────────

/// Play one game of `spec`.
pub fn run_match(spec: &MatchSpec, seed: u64) -> Result<GameResult, String> {
    match spec.mode {
        Mode::Classic => run_classic(&spec.kinds, &spec.classic, seed, spec.max_steps),
        Mode::Treasure => run_treasure(&spec.kinds, &spec.treasure, seed, spec.max_steps),
    }
}

/// Per-game seeds derived from one base seed.
pub fn batch_seeds(base_seed: u64, games: u32) -> Vec<u64> {
    let mut rng = ChaCha8Rng::seed_from_u64(base_seed);
    (0..games).map(|_| rng.gen()).collect()
}

/// Play `games` games of `spec` in parallel. Seating rotates each game so
/// no agent keeps the first-move advantage. Results keep game order.
pub fn run_batch(spec: &MatchSpec, games: u32, base_seed: u64) -> Vec<Result<GameResult, String>> {
    info!(mode = %spec.mode, games, seats = spec.kinds.len(), "running batch");
    let results: Vec<Result<GameResult, String>> = batch_seeds(base_seed, games)
        .into_par_iter()
        .enumerate()
        .map(|(g, seed)| {
            let mut rotated = spec.clone();
            if !rotated.kinds.is_empty() {
                let shift = g % rotated.kinds.len();
                rotated.kinds.rotate_left(shift);
            }
            run_match(&rotated, seed)
        })
        .collect();

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        warn!(failed, games, "some games did not finish");
    }
    results
}

/// Wins per agent name over `results`. Every entrant of `spec` is listed,
/// winless ones at zero; NPC seats show up only when they won.
pub fn tally_wins(spec: &MatchSpec, results: &[GameResult]) -> BTreeMap<String, u32> {
    let mut wins: BTreeMap<String, u32> =
        spec.kinds.iter().map(|k| (k.agent_name().to_string(), 0)).collect();
    for result in results {
        *wins.entry(result.winner_agent().to_string()).or_insert(0) += 1;
    }
    wins
}
