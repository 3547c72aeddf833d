//! Property-based tests for the rules that must hold whatever the dice say:
//! steal resolution, dig odds, and Classic bookkeeping over whole games.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use pepe_engine::combat::{resolve_with_rolls, success_chance, StealContext};
use pepe_engine::economy;
use pepe_engine::mining::outcome_for;
use pepe_engine::policy::FirstChoice;
use pepe_engine::{
    Card, CardId, CardKind, ClassicGame, ClassicPhase, ClassicSettings, DigOutcome, LobbyPlayer, NodeId,
    PlayerColor, PlayerId, TreasurePlayer,
};
use std::collections::BTreeSet;

fn thief(id: u8, treasures: u32, power_ups: usize, substitute: bool) -> TreasurePlayer {
    let mut cards: Vec<Card> =
        (0..power_ups).map(|i| Card { id: CardId(i as u32), kind: CardKind::PowerUp }).collect();
    if substitute {
        cards.push(Card { id: CardId(99), kind: CardKind::Substitute });
    }
    TreasurePlayer {
        id: PlayerId(id),
        name: format!("t{id}"),
        color: PlayerColor::ALL[id as usize],
        position: NodeId(0),
        is_human: false,
        treasures,
        cards,
        active_effects: Vec::new(),
        personality: None,
    }
}

fn context() -> impl Strategy<Value = StealContext> {
    prop_oneof![Just(StealContext::PassBy), Just(StealContext::SameNode)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// At most one of success / counter / blocked, and a transfer happens
    /// exactly when one of the first two does.
    #[test]
    fn prop_steal_outcomes_exclusive(
        ctx in context(),
        power_ups in 0usize..8,
        substitute in any::<bool>(),
        roll in 0.0f64..1.0,
        counter_roll in 0.0f64..1.0,
        attacker_treasures in 0u32..3,
        defender_treasures in 0u32..3,
    ) {
        let attacker = thief(0, attacker_treasures, power_ups, false);
        let defender = thief(1, defender_treasures, 0, substitute);
        let outcome = resolve_with_rolls(&attacker, &defender, ctx, roll, counter_roll);

        let flags = [outcome.success, outcome.is_counter, outcome.blocked];
        prop_assert!(flags.iter().filter(|&&f| f).count() <= 1);
        prop_assert_eq!(outcome.blocked, substitute);
        prop_assert_eq!(outcome.transfer().is_some(), outcome.success || outcome.is_counter);
        if !substitute {
            let hit = roll <= success_chance(ctx, power_ups);
            prop_assert_eq!(outcome.success, hit && defender_treasures > 0);
        }
        if outcome.is_counter {
            prop_assert!(attacker_treasures > 0);
        }
    }

    /// A failed roll never yields treasure; a successful one always does.
    #[test]
    fn prop_dig_outcome_matches_roll(chance in 0.25f64..=1.0, roll in 0.0f64..1.0, sub in 0.0f64..1.0) {
        let outcome = outcome_for(chance, roll, sub);
        prop_assert_ne!(outcome, DigOutcome::Empty);
        prop_assert_eq!(outcome == DigOutcome::Fail, roll > chance);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Over a whole headless game: money never goes negative, cached assets
    /// match money plus holdings, and no property has two owners.
    #[test]
    fn prop_classic_bookkeeping(seed in any::<u64>(), seats in 2usize..=4, rounds in 1u32..9) {
        let roster: Vec<LobbyPlayer> = PlayerColor::ALL[..seats]
            .iter()
            .enumerate()
            .map(|(i, &c)| LobbyPlayer::cpu(&format!("cpu{i}"), c))
            .collect();
        let settings = ClassicSettings { total_rounds: rounds, cycle_length: 2, ..Default::default() };
        let mut game = ClassicGame::new(FirstChoice, seed);
        game.start_game(settings, &roster).unwrap();
        game.run_until_idle();

        let s = game.state();
        prop_assert_eq!(s.phase, ClassicPhase::GameOver);
        prop_assert_eq!(s.round, rounds + 1);
        prop_assert_eq!(s.settlements.len() as u32, rounds / 2);

        let mut owned = BTreeSet::new();
        for p in &s.players {
            prop_assert!(p.money >= 0);
            prop_assert_eq!(p.total_assets, economy::total_assets(p, &s.map));
            for id in &p.owned {
                prop_assert!(owned.insert(*id), "{} owned twice", id);
            }
        }
    }
}
