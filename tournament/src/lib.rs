pub mod runner;
pub mod database;

mod tests;

pub use runner::{
    batch_seeds, run_batch, run_classic, run_classic_with, run_match, run_treasure, run_treasure_with, GameResult,
    tally_wins, MatchSpec, Mode, PlayerResult, DEFAULT_MAX_STEPS, NPC_AGENT_NAME,
};
pub use database::{Database, Standing};
