//! Property-based tests for map canonicalization and route enumeration.
//!
//! Random graphs are built from arbitrary forward-edge lists; the
//! canonical map must be symmetric and every enumerated route must obey
//! the walking rules.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use pepe_engine::map::{GameMap, NodeDef};
use pepe_engine::navigation::{all_distances_from, enumerate_routes, shortest_distance};
use pepe_engine::{NodeId, TileKind};

/// `n` nodes, forward edges taken modulo `n` with self-links dropped.
fn build_map(n: u16, edges: &[(u16, u16)]) -> GameMap {
    let defs = (0..n)
        .map(|i| {
            let next: Vec<u16> = edges
                .iter()
                .filter(|(a, _)| a % n == i)
                .map(|(_, b)| b % n)
                .filter(|&b| b != i)
                .collect();
            let kind = if i == 0 { TileKind::Start } else { TileKind::Property };
            NodeDef::new(i, &format!("n{i}"), kind, &next)
        })
        .collect();
    GameMap::try_new(defs, NodeId(0)).unwrap()
}

fn graph() -> impl Strategy<Value = (u16, Vec<(u16, u16)>)> {
    (2u16..12).prop_flat_map(|n| (Just(n), prop::collection::vec((0..n, 0..n), 0..30)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Every edge exists in both directions and adjacency has no duplicates.
    #[test]
    fn prop_adjacency_symmetric((n, edges) in graph()) {
        let map = build_map(n, &edges);
        for node in map.nodes() {
            let mut seen = node.adjacent.clone();
            seen.sort();
            seen.dedup();
            prop_assert_eq!(seen.len(), node.adjacent.len());
            for &adj in &node.adjacent {
                prop_assert!(adj != node.id);
                prop_assert!(map.neighbors(adj).contains(&node.id));
            }
        }
        let degree_sum: usize = map.nodes().iter().map(|n| n.adjacent.len()).sum();
        prop_assert_eq!(map.edges().len() * 2, degree_sum);
    }

    /// One BFS from the target agrees with per-pair shortest distance.
    #[test]
    fn prop_distance_table_matches_pairwise((n, edges) in graph(), target in 0u16..12) {
        let map = build_map(n, &edges);
        let target = NodeId(target % n);
        let table = all_distances_from(&map, target);
        for id in map.node_ids() {
            prop_assert_eq!(table.get(&id).copied(), shortest_distance(&map, id, target));
        }
    }

    /// Routes walk real edges, have exactly `steps` nodes, and never turn
    /// back unless the walker is at a dead end.
    #[test]
    fn prop_routes_follow_walking_rules((n, edges) in graph(), start in 0u16..12, steps in 1u32..6) {
        let map = build_map(n, &edges);
        let start = NodeId(start % n);
        let routes = enumerate_routes(&map, start, steps, None);
        if !map.neighbors(start).is_empty() {
            prop_assert!(!routes.is_empty());
        }
        for (i, route) in routes.iter().enumerate() {
            prop_assert_eq!(route.id.0 as usize, i);
            prop_assert_eq!(route.path.len(), steps as usize);
            prop_assert_eq!(Some(&route.landing), route.path.last());

            let mut walk = vec![start];
            walk.extend(route.path.iter().copied());
            for w in walk.windows(2) {
                prop_assert!(map.neighbors(w[0]).contains(&w[1]));
            }
            for w in walk.windows(3) {
                if w[2] == w[0] {
                    prop_assert_eq!(map.neighbors(w[1]).len(), 1, "U-turn away from a dead end");
                }
            }
        }
    }
}
