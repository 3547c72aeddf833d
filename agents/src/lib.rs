pub mod agent;
pub mod random;
pub mod heuristic;

mod tests;

pub use agent::{Agent, AgentKind, Lineup};
pub use random::RandomAgent;
pub use heuristic::HeuristicAgent;
