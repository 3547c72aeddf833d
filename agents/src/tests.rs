// ═══════════════════════════════════════════════════════════════════════
// Agent tests — decision rules in isolation, then whole CPU games
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use crate::agent::{Agent, AgentKind, Lineup};
    use crate::heuristic::HeuristicAgent;
    use crate::random::RandomAgent;
    use pepe_engine::cards;
    use pepe_engine::map::NodeDef;
    use pepe_engine::policy::{ClassicPolicy, FirstChoice, TreasurePolicy};
    use pepe_engine::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    // ── Helpers ──────────────────────────────────────────────────────────

    /// 0 start ─ 1 ─ 2 ─ 3. Nodes 1 and 2 form group "pair"; node 3 is a
    /// lone, slow-paying property.
    fn market_map() -> GameMap {
        GameMap::new(
            vec![
                NodeDef::new(0, "Start", TileKind::Start, &[1]),
                NodeDef::new(1, "Mill", TileKind::Property, &[2]).with_group("pair").with_property("Mill", 100, 20),
                NodeDef::new(2, "Mine", TileKind::Property, &[3]).with_group("pair").with_property("Mine", 500, 1),
                NodeDef::new(3, "Folly", TileKind::Property, &[]).with_property("Folly", 300, 5),
            ],
            NodeId(0),
        )
    }

    fn classic_state(map: GameMap) -> ClassicState {
        let mut game = ClassicGame::with_map(map, FirstChoice, ChaCha8Rng::seed_from_u64(1));
        let roster = [LobbyPlayer::human("Ann", PlayerColor::Red), LobbyPlayer::human("Ben", PlayerColor::Blue)];
        game.start_game(ClassicSettings::default(), &roster).unwrap();
        game.state().clone()
    }

    fn prop(state: &ClassicState, node: u16) -> Property {
        state.map.node(NodeId(node)).properties[0].clone()
    }

    fn route(id: u32, path: &[u16], distance: Option<u32>) -> Route {
        let path: Vec<NodeId> = path.iter().map(|&n| NodeId(n)).collect();
        let landing = *path.last().unwrap();
        Route { id: RouteId(id), path, landing, distance_to_destination: distance }
    }

    fn line_map(n: u16) -> GameMap {
        let defs = (0..n)
            .map(|i| {
                let next: Vec<u16> = if i + 1 < n { vec![i + 1] } else { vec![] };
                let kind = if i == n - 1 { TileKind::Bonus } else { TileKind::Property };
                NodeDef::new(i, &format!("Site {i}"), kind, &next)
            })
            .collect();
        GameMap::new(defs, NodeId(0))
    }

    /// Four CPU thieves on a line of dig sites ending in a card node.
    fn treasure_state() -> TreasureState {
        let mut game = TreasureGame::with_map(line_map(10), FirstChoice, ChaCha8Rng::seed_from_u64(2));
        let roster: Vec<LobbyPlayer> =
            PlayerColor::ALL.iter().map(|&c| LobbyPlayer::cpu(&format!("cpu-{c}"), c)).collect();
        game.start_game(TreasureSettings::default(), &roster).unwrap();
        let mut state = game.state().clone();
        for (i, p) in state.players.iter_mut().enumerate() {
            p.position = NodeId(i as u16);
            p.treasures = 0;
        }
        state
    }

    fn only(miner: f64, card_lover: f64, stalker: f64) -> Option<Personality> {
        Some(Personality { miner, card_lover, stalker })
    }

    // ═════════════════════════════════════════════════════════════════════
    // CLASSIC DECISIONS
    // ═════════════════════════════════════════════════════════════════════

    #[test]
    fn test_buy_rejects_large_share_of_cash() {
        let mut state = classic_state(market_map());
        state.players[0].money = 160;
        let mut agent = HeuristicAgent::new(1);
        // 100 > 60% of 160
        assert!(!agent.decide_buy(&state, PlayerId(0), &prop(&state, 1)));
        state.players[0].money = 1000;
        assert!(agent.decide_buy(&state, PlayerId(0), &prop(&state, 1)));
    }

    #[test]
    fn test_buy_uses_payback_outside_groups() {
        let state = classic_state(market_map());
        let mut agent = HeuristicAgent::new(1);
        // 300 / 5 = 60 cycles
        assert!(!agent.decide_buy(&state, PlayerId(0), &prop(&state, 3)));
    }

    #[test]
    fn test_buy_completes_group_despite_payback() {
        let mut state = classic_state(market_map());
        let mut agent = HeuristicAgent::new(1);
        let mine = prop(&state, 2);
        // Two group nodes missing: 70% ceiling, 500 ≤ 700, payback ignored
        assert!(agent.decide_buy(&state, PlayerId(0), &mine));

        let mill = prop(&state, 1).id;
        state.players[0].owned.insert(mill);
        state.players[0].money = 800;
        // Last missing node: 90% ceiling, but the 60% cap still applies first
        assert!(!agent.decide_buy(&state, PlayerId(0), &mine));
        state.players[0].money = 850;
        assert!(agent.decide_buy(&state, PlayerId(0), &mine));
    }

    #[test]
    fn test_route_prefers_exact_destination() {
        let state = classic_state(market_map());
        let mut agent = HeuristicAgent::new(5);
        let routes = vec![route(0, &[1], Some(1)), route(1, &[2], Some(0)), route(2, &[3], None)];
        for _ in 0..20 {
            assert_eq!(agent.decide_route(&state, PlayerId(0), &routes), RouteId(1));
        }
    }

    #[test]
    fn test_route_prefers_closest_then_any() {
        let state = classic_state(market_map());
        let mut agent = HeuristicAgent::new(5);
        let routes = vec![route(0, &[1], Some(4)), route(1, &[2], Some(2)), route(2, &[3], Some(2))];
        for _ in 0..20 {
            let pick = agent.decide_route(&state, PlayerId(0), &routes);
            assert!(pick == RouteId(1) || pick == RouteId(2));
        }
        let unknown = vec![route(0, &[1], None), route(1, &[2], None)];
        assert!(agent.decide_route(&state, PlayerId(0), &unknown).0 < 2);
    }

    // ═════════════════════════════════════════════════════════════════════
    // TREASURE DECISIONS
    // ═════════════════════════════════════════════════════════════════════

    #[test]
    fn test_personality_normalised_and_seeded() {
        let mut a = HeuristicAgent::new(9);
        let mut b = HeuristicAgent::new(9);
        for _ in 0..50 {
            let p = a.personality();
            assert_eq!(p, b.personality());
            assert!(p.miner >= 0.0 && p.card_lover >= 0.0 && p.stalker >= 0.0);
            assert!((p.miner + p.card_lover + p.stalker - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_stalker_chases_the_leader() {
        let mut state = treasure_state();
        state.players[0].personality = only(0.0, 0.0, 1.0);
        state.players[1].treasures = 1;
        state.players[2].treasures = 5;
        let mut agent = HeuristicAgent::new(3);
        // Route 0 lands on seat 1; route 1 lands on the leader, seat 2
        let routes = vec![route(0, &[1], None), route(1, &[1, 2], None)];
        for _ in 0..20 {
            assert_eq!(agent.choose_route(&state, PlayerId(0), &routes), RouteId(1));
        }
    }

    #[test]
    fn test_miner_avoids_dug_sites() {
        let mut state = treasure_state();
        state.players[0].personality = only(1.0, 0.0, 0.0);
        state.mined.insert(NodeId(5), MiningRecord { miner: Some(PlayerId(1)), outcome: DigOutcome::Normal });
        let mut agent = HeuristicAgent::new(3);
        // Node 4 is unmined next to a mined site; node 5 is dug out
        let routes = vec![route(0, &[5], None), route(1, &[4], None)];
        for _ in 0..20 {
            assert_eq!(agent.choose_route(&state, PlayerId(0), &routes), RouteId(1));
        }
    }

    #[test]
    fn test_card_lover_heads_for_card_nodes() {
        let mut state = treasure_state();
        state.players[0].personality = only(0.0, 1.0, 0.0);
        let mut agent = HeuristicAgent::new(3);
        let routes = vec![route(0, &[8], None), route(1, &[8, 9], None)];
        assert_eq!(agent.choose_route(&state, PlayerId(0), &routes), RouteId(1));
    }

    #[test]
    fn test_heuristic_cards_target_leader() {
        let mut state = treasure_state();
        state.players[0].personality = only(0.0, 1.0, 0.0);
        state.players[3].treasures = 4;
        state.players[0].cards = vec![Card { id: CardId(50), kind: CardKind::Seal }];
        let mut agent = HeuristicAgent::new(11);
        let plays: Vec<_> = (0..40).filter_map(|_| agent.choose_card_play(&state, PlayerId(0))).collect();
        assert!(!plays.is_empty());
        for play in plays {
            assert_eq!(play.card_id, CardId(50));
            assert_eq!(play.target, Some(PlayerId(3)));
        }
    }

    #[test]
    fn test_heuristic_dice_ten_on_self_and_time_machine_needs_site() {
        let mut state = treasure_state();
        state.players[0].personality = only(0.0, 1.0, 0.0);
        state.players[0].cards = vec![Card { id: CardId(60), kind: CardKind::Dice10 }];
        let mut agent = HeuristicAgent::new(12);
        let play = (0..40).find_map(|_| agent.choose_card_play(&state, PlayerId(0))).unwrap();
        assert_eq!(play.target, Some(PlayerId(0)));

        state.players[0].cards = vec![Card { id: CardId(61), kind: CardKind::TimeMachine }];
        assert!((0..40).all(|_| agent.choose_card_play(&state, PlayerId(0)).is_none()));
        state.mined.insert(NodeId(6), MiningRecord { miner: Some(PlayerId(0)), outcome: DigOutcome::Rare });
        let play = (0..40).find_map(|_| agent.choose_card_play(&state, PlayerId(0))).unwrap();
        assert_eq!(play.node, Some(NodeId(6)));
    }

    #[test]
    fn test_passive_cards_never_played() {
        let mut state = treasure_state();
        state.players[0].personality = only(0.0, 1.0, 0.0);
        state.players[0].cards = vec![
            Card { id: CardId(70), kind: CardKind::PowerUp },
            Card { id: CardId(71), kind: CardKind::Substitute },
        ];
        let mut heuristic = HeuristicAgent::new(1);
        let mut random = RandomAgent::new(1);
        for _ in 0..30 {
            assert!(heuristic.choose_card_play(&state, PlayerId(0)).is_none());
            assert!(random.choose_card_play(&state, PlayerId(0)).is_none());
        }
    }

    #[test]
    fn test_random_card_targets_are_legal() {
        let mut state = treasure_state();
        let mut agent = RandomAgent::new(4);
        for kind in CardKind::ALL.into_iter().filter(|k| !k.is_passive()) {
            state.players[0].cards = vec![Card { id: CardId(80), kind }];
            for _ in 0..20 {
                if let Some(play) = agent.choose_card_play(&state, PlayerId(0)) {
                    let resolved = cards::resolve_target(kind, PlayerId(0), play.target, state.players.len());
                    assert!(resolved.is_some(), "{kind} aimed at {:?}", play.target);
                }
            }
        }
    }

    // ═════════════════════════════════════════════════════════════════════
    // LINEUP
    // ═════════════════════════════════════════════════════════════════════

    #[test]
    fn test_agent_kind_names() {
        for kind in AgentKind::ALL {
            assert_eq!(kind.to_string().parse::<AgentKind>(), Ok(kind));
        }
        assert!("greedy".parse::<AgentKind>().is_err());
        assert_eq!(AgentKind::Heuristic.build(0).name(), "Heuristic");
        for kind in AgentKind::ALL {
            assert_eq!(kind.build(3).name(), kind.agent_name());
        }
    }

    #[test]
    fn test_lineup_routes_by_seat() {
        let state = classic_state(market_map());
        let mut lineup = Lineup::from_kinds(&[AgentKind::Heuristic], 0);
        assert_eq!(lineup.names(), vec!["Heuristic".to_string()]);
        // Seat 1 has no agent: never buys, takes the first route
        assert!(!lineup.decide_buy(&state, PlayerId(1), &prop(&state, 1)));
        let routes = vec![route(4, &[1], Some(3)), route(5, &[2], Some(0))];
        assert_eq!(ClassicPolicy::decide_route(&mut lineup, &state, PlayerId(1), &routes), RouteId(4));
        assert_eq!(ClassicPolicy::decide_route(&mut lineup, &state, PlayerId(0), &routes), RouteId(5));
        assert_eq!(TreasurePolicy::personality(&mut lineup, PlayerId(3)), Personality::default());
    }

    #[test]
    fn test_mixed_classic_game_finishes() {
        let kinds = [AgentKind::Heuristic, AgentKind::Random, AgentKind::Heuristic, AgentKind::Random];
        let roster: Vec<LobbyPlayer> =
            PlayerColor::ALL.iter().map(|&c| LobbyPlayer::cpu(&format!("cpu-{c}"), c)).collect();
        let mut game = ClassicGame::new(Lineup::from_kinds(&kinds, 17), 17);
        game.start_game(ClassicSettings { total_rounds: 12, ..Default::default() }, &roster).unwrap();
        game.run_until_idle();

        let s = game.state();
        assert_eq!(s.phase, ClassicPhase::GameOver);
        assert_eq!(s.settlements.len(), 3);
        for p in &s.players {
            assert!(p.money >= 0);
            assert_eq!(p.total_assets, pepe_engine::economy::total_assets(p, &s.map));
        }
    }

    #[test]
    fn test_heuristic_treasure_game_finishes() {
        let kinds = [AgentKind::Heuristic; 4];
        let mut game = TreasureGame::new(Lineup::from_kinds(&kinds, 23), 23);
        let roster = [LobbyPlayer::cpu("Solo", PlayerColor::Green)];
        let settings = TreasureSettings { round_limit: Some(150), ..Default::default() };
        game.start_game(settings, &roster).unwrap();
        game.run_until_idle();

        let s = game.state();
        assert_eq!(s.phase, TreasurePhase::GameOver);
        assert!(s.players.iter().all(|p| p.personality.is_some()));
        assert_eq!(s.winner(), s.standings.first().copied());
    }
}
