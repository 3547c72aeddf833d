// ═══════════════════════════════════════════════════════════════════════
// Runner — CLI entry point for headless games, batches and leaderboards
// ═══════════════════════════════════════════════════════════════════════

use clap::{Parser, Subcommand};
use pepe_agents::AgentKind;
use pepe_engine::events::GameEvent;
use pepe_engine::{ClassicSettings, TreasureMapId, TreasureSettings};
use pepe_tournament::{database::Database, GameResult, MatchSpec, Mode, DEFAULT_MAX_STEPS};
use serde::de::DeserializeOwned;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pepe-runner", about = "Board game engine: Classic and Treasure Hunt")]
struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one Classic game between CPU agents
    Classic {
        #[arg(short, long)]
        seed: Option<u64>,
        /// One agent per seat: "heuristic" or "random"
        #[arg(short, long, value_delimiter = ',', default_value = "heuristic,heuristic,random,random")]
        agents: Vec<AgentKind>,
        /// JSON settings file; flags below override it
        #[arg(short, long)]
        config: Option<String>,
        #[arg(long)]
        rounds: Option<u32>,
        #[arg(long)]
        cycle: Option<u32>,
        #[arg(long)]
        money: Option<i64>,
        /// Print every game event as a JSON line
        #[arg(long)]
        events: bool,
    },
    /// Play one Treasure Hunt game; empty seats get NPC thieves
    Treasure {
        #[arg(short, long)]
        seed: Option<u64>,
        #[arg(short, long, value_delimiter = ',', default_value = "heuristic")]
        agents: Vec<AgentKind>,
        #[arg(short, long)]
        config: Option<String>,
        /// five_islands, twin_continents or ring_of_fire
        #[arg(short, long)]
        map: Option<TreasureMapId>,
        #[arg(short, long)]
        target: Option<u32>,
        #[arg(long)]
        round_limit: Option<u32>,
        #[arg(long)]
        events: bool,
    },
    /// Run a batch of games in parallel and record ELO
    Tournament {
        #[arg(long, default_value = "classic")]
        mode: Mode,
        #[arg(short, long, default_value_t = 100)]
        games: u32,
        #[arg(short, long, value_delimiter = ',', default_value = "heuristic,random")]
        agents: Vec<AgentKind>,
        #[arg(short, long, default_value_t = 42)]
        seed: u64,
        #[arg(short, long, default_value = "results.db")]
        db: String,
        /// ELO K factor
        #[arg(short, long, default_value_t = 32.0)]
        k: f64,
        #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
        max_steps: usize,
    },
    /// Show the ELO leaderboard
    Leaderboard {
        #[arg(short, long, default_value = "results.db")]
        db: String,
        #[arg(long)]
        mode: Option<Mode>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = match cli.command {
        Commands::Classic { seed, agents, config, rounds, cycle, money, events } => {
            cmd_classic(seed, &agents, config.as_deref(), rounds, cycle, money, events)
        }
        Commands::Treasure { seed, agents, config, map, target, round_limit, events } => {
            cmd_treasure(seed, &agents, config.as_deref(), map, target, round_limit, events)
        }
        Commands::Tournament { mode, games, agents, seed, db, k, max_steps } => {
            cmd_tournament(mode, games, agents, seed, &db, k, max_steps)
        }
        Commands::Leaderboard { db, mode } => cmd_leaderboard(&db, mode),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

fn load_config<T: DeserializeOwned + Default>(path: Option<&str>) -> Result<T, String> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    let text = std::fs::read_to_string(path).map_err(|e| format!("reading {path}: {e}"))?;
    serde_json::from_str(&text).map_err(|e| format!("parsing {path}: {e}"))
}

fn print_event(event: &GameEvent) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => debug!(error = %e, "unserializable event"),
    }
}

fn print_result(result: &GameResult, score_label: &str) {
    println!("Game finished!");
    println!("  Seed: {}", result.seed);
    println!("  Winner: {} ({})", result.winner, result.winner_agent());
    println!("  Rounds played: {}", result.rounds_played);
    println!();
    println!("  Final standings:");
    for pr in &result.player_results {
        println!("    {}. {:10} {:10} -- {}: {}", pr.rank, pr.name, pr.agent_name, score_label, pr.score);
    }
}

fn cmd_classic(
    seed: Option<u64>,
    agents: &[AgentKind],
    config: Option<&str>,
    rounds: Option<u32>,
    cycle: Option<u32>,
    money: Option<i64>,
    events: bool,
) -> Result<(), String> {
    let mut settings: ClassicSettings = load_config(config)?;
    if let Some(r) = rounds {
        settings.total_rounds = r;
    }
    if let Some(c) = cycle {
        settings.cycle_length = c;
    }
    if let Some(m) = money {
        settings.starting_money = m;
    }
    let seed = seed.unwrap_or_else(rand::random);
    info!(seed, seats = agents.len(), rounds = settings.total_rounds, "starting classic game");

    let result = pepe_tournament::run_classic_with(agents, &settings, seed, DEFAULT_MAX_STEPS, |e| {
        if events {
            print_event(e);
        }
    })?;
    print_result(&result, "assets");
    Ok(())
}

fn cmd_treasure(
    seed: Option<u64>,
    agents: &[AgentKind],
    config: Option<&str>,
    map: Option<TreasureMapId>,
    target: Option<u32>,
    round_limit: Option<u32>,
    events: bool,
) -> Result<(), String> {
    let mut settings: TreasureSettings = load_config(config)?;
    if let Some(m) = map {
        settings.map = m;
    }
    if let Some(t) = target {
        settings.target_treasures = t;
    }
    if round_limit.is_some() {
        settings.round_limit = round_limit;
    }
    let seed = seed.unwrap_or_else(rand::random);
    info!(seed, map = %settings.map, target = settings.target_treasures, "starting treasure game");

    let result = pepe_tournament::run_treasure_with(agents, &settings, seed, DEFAULT_MAX_STEPS, |e| {
        if events {
            print_event(e);
        }
    })?;
    print_result(&result, "treasures");
    Ok(())
}

fn cmd_tournament(
    mode: Mode,
    games: u32,
    agents: Vec<AgentKind>,
    seed: u64,
    db_path: &str,
    k: f64,
    max_steps: usize,
) -> Result<(), String> {
    let entrants: Vec<String> = agents.iter().map(|a| a.to_string()).collect();
    println!("=== Tournament: {games} {mode} games, agents={} ===\n", entrants.join(","));

    let db = Database::open(db_path).map_err(|e| e.to_string())?;
    let spec = MatchSpec { max_steps, ..MatchSpec::new(mode, agents) };

    let mut finished = Vec::new();
    let mut errors = 0u32;
    for (g, outcome) in pepe_tournament::run_batch(&spec, games, seed).into_iter().enumerate() {
        match outcome {
            Ok(result) => {
                db.record(&result, k).map_err(|e| e.to_string())?;
                debug!(game = g + 1, seed = result.seed, winner = result.winner_agent(), "stored");
                finished.push(result);
            }
            Err(e) => {
                errors += 1;
                eprintln!("Game {}: ERROR -- {}", g + 1, e);
            }
        }
    }

    println!("--- Summary ({games} games, {errors} errors) ---");
    for (name, w) in pepe_tournament::tally_wins(&spec, &finished) {
        let pct = if games > 0 { w as f64 / games as f64 * 100.0 } else { 0.0 };
        println!("  {name:14}: {w:>4} wins ({pct:.1}%)");
    }
    println!("\nResults saved to: {db_path}");
    println!("Total games in DB: {}", db.game_count().map_err(|e| e.to_string())?);
    Ok(())
}

fn cmd_leaderboard(db_path: &str, mode: Option<Mode>) -> Result<(), String> {
    let db = Database::open(db_path).map_err(|e| e.to_string())?;
    let board = db.leaderboard(mode).map_err(|e| e.to_string())?;
    if board.is_empty() {
        println!("No agents found. Run some tournaments first.");
        return Ok(());
    }
    println!("=== Leaderboard ===\n");
    println!("{:<14} {:<10} {:>8} {:>8} {:>8}", "Agent", "Mode", "ELO", "Games", "Wins");
    println!("{}", "-".repeat(52));
    for s in &board {
        println!("{:<14} {:<10} {:>8.1} {:>8} {:>8}", s.name, s.mode, s.elo, s.games, s.wins);
    }
    Ok(())
}
