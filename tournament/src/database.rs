// ═══════════════════════════════════════════════════════════════════════
// Database — SQLite storage for batch results and per-mode ELO ratings
// ═══════════════════════════════════════════════════════════════════════

use crate::runner::{GameResult, Mode};
use rusqlite::{params, Connection, OptionalExtension, Result};

pub const STARTING_ELO: f64 = 1500.0;

/// One leaderboard line.
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub name: String,
    pub mode: String,
    pub elo: f64,
    pub games: u32,
    pub wins: u32,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path.
    pub fn open(path: &str) -> Result<Self> {
        let db = Database { conn: Connection::open(path)? };
        db.create_schema()?;
        Ok(db)
    }

    pub fn in_memory() -> Result<Self> {
        let db = Database { conn: Connection::open_in_memory()? };
        db.create_schema()?;
        Ok(db)
    }

    fn create_schema(&self) -> Result<()> {
        self.conn.execute_batch("
            CREATE TABLE IF NOT EXISTS agents (
                id          INTEGER PRIMARY KEY,
                name        TEXT NOT NULL,
                mode        TEXT NOT NULL,
                elo         REAL NOT NULL DEFAULT 1500.0,
                games       INTEGER NOT NULL DEFAULT 0,
                wins        INTEGER NOT NULL DEFAULT 0,
                UNIQUE (name, mode)
            );

            CREATE TABLE IF NOT EXISTS games (
                id          INTEGER PRIMARY KEY,
                seed        INTEGER NOT NULL,
                mode        TEXT NOT NULL,
                rounds      INTEGER NOT NULL,
                winner      TEXT NOT NULL,
                standings   TEXT NOT NULL,
                played_at   TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS game_players (
                id          INTEGER PRIMARY KEY,
                game_id     INTEGER NOT NULL REFERENCES games(id),
                agent_id    INTEGER NOT NULL REFERENCES agents(id),
                seat        INTEGER NOT NULL,
                player_name TEXT NOT NULL,
                rank        INTEGER NOT NULL,
                score       INTEGER NOT NULL
            );
        ")
    }

    /// Register an agent for a mode (or return the existing id).
    pub fn register_agent(&self, name: &str, mode: Mode) -> Result<i64> {
        self.conn.execute(
            "INSERT OR IGNORE INTO agents (name, mode) VALUES (?1, ?2)",
            params![name, mode.to_string()],
        )?;
        self.conn.query_row(
            "SELECT id FROM agents WHERE name = ?1 AND mode = ?2",
            params![name, mode.to_string()],
            |row| row.get(0),
        )
    }

    /// Store a completed game and bump games/wins once per distinct agent.
    pub fn store_game(&self, result: &GameResult) -> Result<i64> {
        let standings = serde_json::to_string(&result.player_results)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        self.conn.execute(
            "INSERT INTO games (seed, mode, rounds, winner, standings) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                result.seed as i64,
                result.mode.to_string(),
                result.rounds_played as i64,
                result.winner_agent(),
                standings,
            ],
        )?;
        let game_id = self.conn.last_insert_rowid();

        let mut seen = Vec::new();
        for pr in &result.player_results {
            let agent_id = self.register_agent(&pr.agent_name, result.mode)?;
            self.conn.execute(
                "INSERT INTO game_players (game_id, agent_id, seat, player_name, rank, score)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![game_id, agent_id, pr.seat.0 as i64, pr.name, pr.rank as i64, pr.score],
            )?;
            if !seen.contains(&agent_id) {
                seen.push(agent_id);
            }
        }

        let winner_id = self.register_agent(result.winner_agent(), result.mode)?;
        for agent_id in seen {
            self.conn.execute(
                "UPDATE agents SET games = games + 1, wins = wins + ?1 WHERE id = ?2",
                params![i64::from(agent_id == winner_id), agent_id],
            )?;
        }

        Ok(game_id)
    }

    fn elo_of(&self, agent_id: i64) -> Result<f64> {
        let elo = self
            .conn
            .query_row("SELECT elo FROM agents WHERE id = ?1", params![agent_id], |row| row.get(0))
            .optional()?;
        Ok(elo.unwrap_or(STARTING_ELO))
    }

    /// Simple multiplayer ELO: the winner plays one pairwise match against
    /// each loser. Losers equal to the winner are skipped.
    pub fn update_elo(&self, winner_id: i64, loser_ids: &[i64], k: f64) -> Result<()> {
        let winner_elo = self.elo_of(winner_id)?;

        for &loser_id in loser_ids.iter().filter(|&&id| id != winner_id) {
            let loser_elo = self.elo_of(loser_id)?;

            let expected_winner = 1.0 / (1.0 + 10f64.powf((loser_elo - winner_elo) / 400.0));
            let expected_loser = 1.0 - expected_winner;

            let delta_w = k * (1.0 - expected_winner);
            let delta_l = k * (0.0 - expected_loser);

            self.conn.execute("UPDATE agents SET elo = elo + ?1 WHERE id = ?2", params![delta_w, winner_id])?;
            self.conn.execute("UPDATE agents SET elo = elo + ?1 WHERE id = ?2", params![delta_l, loser_id])?;
        }
        Ok(())
    }

    /// Store a game and apply its ELO update.
    pub fn record(&self, result: &GameResult, k: f64) -> Result<i64> {
        let game_id = self.store_game(result)?;
        let winner_id = self.register_agent(result.winner_agent(), result.mode)?;
        let mut loser_ids = Vec::new();
        for pr in result.player_results.iter().filter(|p| p.seat != result.winner) {
            let id = self.register_agent(&pr.agent_name, result.mode)?;
            if !loser_ids.contains(&id) {
                loser_ids.push(id);
            }
        }
        self.update_elo(winner_id, &loser_ids, k)?;
        Ok(game_id)
    }

    /// ELO leaderboard, optionally restricted to one mode.
    pub fn leaderboard(&self, mode: Option<Mode>) -> Result<Vec<Standing>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, mode, elo, games, wins FROM agents
             WHERE ?1 IS NULL OR mode = ?1
             ORDER BY elo DESC, name",
        )?;
        let rows = stmt.query_map(params![mode.map(|m| m.to_string())], |row| {
            Ok(Standing {
                name: row.get(0)?,
                mode: row.get(1)?,
                elo: row.get(2)?,
                games: row.get(3)?,
                wins: row.get(4)?,
            })
        })?;
        rows.collect()
    }

    /// Total number of games stored.
    pub fn game_count(&self) -> Result<u32> {
        self.conn.query_row("SELECT COUNT(*) FROM games", [], |row| row.get(0))
    }
}
