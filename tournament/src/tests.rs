// ═══════════════════════════════════════════════════════════════════════
// Tournament tests — headless runs, batches, and result storage
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use crate::database::{Database, STARTING_ELO};
    use crate::runner::*;
    use pepe_agents::AgentKind;
    use pepe_engine::*;

    fn quick_classic() -> ClassicSettings {
        ClassicSettings { total_rounds: 8, cycle_length: 4, ..ClassicSettings::default() }
    }

    fn quick_treasure() -> TreasureSettings {
        TreasureSettings { round_limit: Some(40), ..TreasureSettings::default() }
    }

    fn result(mode: Mode, seats: &[(&str, i64)]) -> GameResult {
        GameResult {
            seed: 7,
            mode,
            rounds_played: 3,
            steps: 100,
            winner: PlayerId(0),
            player_results: seats
                .iter()
                .enumerate()
                .map(|(i, &(agent, score))| PlayerResult {
                    seat: PlayerId(i as u8),
                    name: format!("CPU {}", i + 1),
                    agent_name: agent.to_string(),
                    rank: i + 1,
                    score,
                })
                .collect(),
        }
    }

    // ── Runner ───────────────────────────────────────────────────────────

    #[test]
    fn test_classic_game_completes() {
        let kinds = [AgentKind::Heuristic, AgentKind::Random];
        let r = run_classic(&kinds, &quick_classic(), 3, DEFAULT_MAX_STEPS).unwrap();

        assert_eq!(r.mode, Mode::Classic);
        assert_eq!(r.rounds_played, 8);
        assert_eq!(r.player_results.len(), 2);
        assert_eq!(r.player_results[0].seat, r.winner);
        assert_eq!(r.player_results.iter().map(|p| p.rank).collect::<Vec<_>>(), vec![1, 2]);
        assert!(r.player_results[0].score >= r.player_results[1].score);
        let seat0 = r.player_results.iter().find(|p| p.seat == PlayerId(0)).unwrap();
        assert_eq!(seat0.agent_name, "Heuristic");
        assert_eq!(seat0.name, "CPU 1");
    }

    #[test]
    fn test_classic_game_reproducible() {
        let kinds = [AgentKind::Heuristic, AgentKind::Heuristic, AgentKind::Random];
        let a = run_classic(&kinds, &quick_classic(), 11, DEFAULT_MAX_STEPS).unwrap();
        let b = run_classic(&kinds, &quick_classic(), 11, DEFAULT_MAX_STEPS).unwrap();
        assert_eq!(a.winner, b.winner);
        assert_eq!(a.steps, b.steps);
        let scores = |r: &GameResult| r.player_results.iter().map(|p| (p.seat, p.score)).collect::<Vec<_>>();
        assert_eq!(scores(&a), scores(&b));
    }

    #[test]
    fn test_classic_events_reported() {
        let mut events = 0;
        run_classic_with(&[AgentKind::Random; 2], &quick_classic(), 5, DEFAULT_MAX_STEPS, |_| events += 1).unwrap();
        assert!(events > 0);
    }

    #[test]
    fn test_classic_rejects_short_roster() {
        let err = run_classic(&[AgentKind::Heuristic], &quick_classic(), 1, DEFAULT_MAX_STEPS).unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn test_step_budget_stops_runaway_game() {
        let err = run_classic(&[AgentKind::Random; 4], &ClassicSettings::default(), 1, 5).unwrap_err();
        assert!(err.contains("exceeded"), "{err}");
    }

    #[test]
    fn test_treasure_game_fills_empty_seats() {
        let r = run_treasure(&[AgentKind::Random], &quick_treasure(), 9, DEFAULT_MAX_STEPS).unwrap();

        assert_eq!(r.mode, Mode::Treasure);
        assert_eq!(r.player_results.len(), 4);
        let agent_of = |seat: u8| {
            r.player_results.iter().find(|p| p.seat == PlayerId(seat)).map(|p| p.agent_name.clone()).unwrap()
        };
        assert_eq!(agent_of(0), "Random");
        assert_eq!(agent_of(3), NPC_AGENT_NAME);
        for pair in r.player_results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_npc_seats_rated_apart_from_entrants() {
        let r = run_treasure(&[AgentKind::Random], &quick_treasure(), 9, DEFAULT_MAX_STEPS).unwrap();
        let db = Database::in_memory().unwrap();
        db.record(&r, 32.0).unwrap();

        let board = db.leaderboard(Some(Mode::Treasure)).unwrap();
        let names: Vec<&str> = board.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(board.len(), 2);
        assert!(names.contains(&"Random"));
        assert!(names.contains(&NPC_AGENT_NAME));
        assert!(!names.contains(&"Heuristic"));
    }

    #[test]
    fn test_tally_counts_every_win_under_entrant_names() {
        let spec = MatchSpec {
            classic: quick_classic(),
            ..MatchSpec::new(Mode::Classic, vec![AgentKind::Heuristic, AgentKind::Random])
        };
        let results: Vec<GameResult> = run_batch(&spec, 6, 7).into_iter().map(|r| r.unwrap()).collect();
        let wins = tally_wins(&spec, &results);

        let keys: Vec<&str> = wins.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Heuristic", "Random"]);
        assert_eq!(wins.values().sum::<u32>(), 6);
        for r in &results {
            assert!(wins.contains_key(r.winner_agent()));
        }
    }

    #[test]
    fn test_tally_lists_winless_entrants() {
        let spec = MatchSpec::new(Mode::Treasure, vec![AgentKind::Random]);
        let wins = tally_wins(&spec, &[]);
        assert_eq!(wins.get("Random"), Some(&0));
        assert_eq!(wins.len(), 1);
    }

    #[test]
    fn test_batch_rotates_seating() {
        let spec = MatchSpec {
            classic: quick_classic(),
            ..MatchSpec::new(Mode::Classic, vec![AgentKind::Heuristic, AgentKind::Random])
        };
        let results = run_batch(&spec, 4, 42);
        assert_eq!(results.len(), 4);

        let seeds = batch_seeds(42, 4);
        for (g, r) in results.iter().enumerate() {
            let r = r.as_ref().unwrap();
            assert_eq!(r.seed, seeds[g]);
            let seat0 = r.player_results.iter().find(|p| p.seat == PlayerId(0)).unwrap();
            let expected = if g % 2 == 0 { "Heuristic" } else { "Random" };
            assert_eq!(seat0.agent_name, expected);
        }
    }

    #[test]
    fn test_batch_seeds_distinct_and_stable() {
        let seeds = batch_seeds(1, 16);
        assert_eq!(seeds, batch_seeds(1, 16));
        let mut unique = seeds.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 16);
    }

    #[test]
    fn test_mode_names() {
        for mode in [Mode::Classic, Mode::Treasure] {
            assert_eq!(mode.to_string().parse::<Mode>(), Ok(mode));
        }
        assert!("poker".parse::<Mode>().is_err());
    }

    // ── Database ─────────────────────────────────────────────────────────

    #[test]
    fn test_register_agent_per_mode() {
        let db = Database::in_memory().unwrap();
        let a = db.register_agent("Heuristic", Mode::Classic).unwrap();
        assert_eq!(db.register_agent("Heuristic", Mode::Classic).unwrap(), a);
        assert_ne!(db.register_agent("Heuristic", Mode::Treasure).unwrap(), a);
    }

    #[test]
    fn test_equal_ratings_split_k() {
        let db = Database::in_memory().unwrap();
        let w = db.register_agent("Heuristic", Mode::Classic).unwrap();
        let l = db.register_agent("Random", Mode::Classic).unwrap();
        db.update_elo(w, &[l], 32.0).unwrap();

        let board = db.leaderboard(Some(Mode::Classic)).unwrap();
        assert_eq!(board[0].name, "Heuristic");
        assert!((board[0].elo - (STARTING_ELO + 16.0)).abs() < 1e-9);
        assert!((board[1].elo - (STARTING_ELO - 16.0)).abs() < 1e-9);
    }

    #[test]
    fn test_record_updates_stats_and_conserves_elo() {
        let db = Database::in_memory().unwrap();
        let game = result(Mode::Classic, &[("Heuristic", 2000), ("Random", 900), ("Random", 400)]);
        db.record(&game, 32.0).unwrap();
        db.record(&game, 32.0).unwrap();

        assert_eq!(db.game_count().unwrap(), 2);
        let board = db.leaderboard(None).unwrap();
        assert_eq!(board.len(), 2);
        let heuristic = board.iter().find(|s| s.name == "Heuristic").unwrap();
        let random = board.iter().find(|s| s.name == "Random").unwrap();
        assert_eq!((heuristic.games, heuristic.wins), (2, 2));
        assert_eq!((random.games, random.wins), (2, 0));
        assert!(heuristic.elo > STARTING_ELO);
        assert!((heuristic.elo + random.elo - 2.0 * STARTING_ELO).abs() < 1e-9);
    }

    #[test]
    fn test_self_play_leaves_rating() {
        let db = Database::in_memory().unwrap();
        db.record(&result(Mode::Treasure, &[("Heuristic", 10), ("Heuristic", 4)]), 32.0).unwrap();

        let board = db.leaderboard(Some(Mode::Treasure)).unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].elo, STARTING_ELO);
        assert_eq!((board[0].games, board[0].wins), (1, 1));
    }

    #[test]
    fn test_leaderboard_filters_mode() {
        let db = Database::in_memory().unwrap();
        db.record(&result(Mode::Classic, &[("Heuristic", 1), ("Random", 0)]), 32.0).unwrap();
        db.record(&result(Mode::Treasure, &[("Random", 1), ("Heuristic", 0)]), 32.0).unwrap();

        let classic = db.leaderboard(Some(Mode::Classic)).unwrap();
        assert!(classic.iter().all(|s| s.mode == "classic"));
        assert_eq!(classic[0].name, "Heuristic");
        let treasure = db.leaderboard(Some(Mode::Treasure)).unwrap();
        assert_eq!(treasure[0].name, "Random");
        assert_eq!(db.leaderboard(None).unwrap().len(), 4);
    }

    #[test]
    fn test_stored_game_from_real_run() {
        let db = Database::in_memory().unwrap();
        let kinds = [AgentKind::Heuristic, AgentKind::Random];
        let r = run_classic(&kinds, &quick_classic(), 21, DEFAULT_MAX_STEPS).unwrap();
        db.record(&r, 32.0).unwrap();
        assert_eq!(db.game_count().unwrap(), 1);
        let winner = db.leaderboard(None).unwrap().into_iter().find(|s| s.name == r.winner_agent()).unwrap();
        assert_eq!(winner.wins, 1);
    }
}
