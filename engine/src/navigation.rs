// ═══════════════════════════════════════════════════════════════════════
// Navigation — BFS distances and dice-route enumeration
// ═══════════════════════════════════════════════════════════════════════

use crate::map::GameMap;
use crate::types::NodeId;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct RouteId(pub u32);

/// One way to spend a dice roll. Recomputed on every roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    /// Every node entered, in order; `path.len()` equals the dice value.
    pub path: Vec<NodeId>,
    pub landing: NodeId,
    /// Steps from the landing node to the active destination, if any and
    /// reachable.
    pub distance_to_destination: Option<u32>,
}

/// One six-sided die.
pub fn roll_die<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    ((rng.gen::<f64>() * 6.0).floor() as u8 + 1).min(6)
}

/// Unweighted shortest path length. `None` when unreachable.
pub fn shortest_distance(map: &GameMap, from: NodeId, to: NodeId) -> Option<u32> {
    if from == to {
        return Some(0);
    }
    let mut visited = vec![false; map.len()];
    let mut queue: VecDeque<(NodeId, u32)> = VecDeque::new();
    visited[from.0 as usize] = true;
    queue.push_back((from, 0));

    while let Some((current, dist)) = queue.pop_front() {
        for &adj in map.neighbors(current) {
            if adj == to {
                return Some(dist + 1);
            }
            if !visited[adj.0 as usize] {
                visited[adj.0 as usize] = true;
                queue.push_back((adj, dist + 1));
            }
        }
    }
    None
}

/// Distances from `target` to every node reachable from it, in one BFS.
pub fn all_distances_from(map: &GameMap, target: NodeId) -> HashMap<NodeId, u32> {
    let mut distances: HashMap<NodeId, u32> = HashMap::with_capacity(map.len());
    let mut queue: VecDeque<NodeId> = VecDeque::new();
    distances.insert(target, 0);
    queue.push_back(target);

    while let Some(current) = queue.pop_front() {
        let dist = distances[&current];
        for &adj in map.neighbors(current) {
            if !distances.contains_key(&adj) {
                distances.insert(adj, dist + 1);
                queue.push_back(adj);
            }
        }
    }
    distances
}

/// More than one way out of this node.
pub fn has_branch(map: &GameMap, node: NodeId) -> bool {
    map.neighbors(node).len() > 1
}

/// Neighbours a walker may step to next: everything but the node it just
/// came from, unless that leaves nothing (dead end), in which case it may
/// turn back.
fn next_steps(map: &GameMap, current: NodeId, previous: Option<NodeId>) -> Vec<NodeId> {
    let all = map.neighbors(current);
    let forward: Vec<NodeId> = all.iter().copied().filter(|&n| Some(n) != previous).collect();
    if forward.is_empty() {
        all.to_vec()
    } else {
        forward
    }
}

/// Every walk of exactly `steps` edges from `start` that never U-turns
/// except out of a dead end. Routes come out in branch-exploration order.
/// The count is combinatorial in the branching factor.
pub fn enumerate_routes(
    map: &GameMap,
    start: NodeId,
    steps: u32,
    destination: Option<NodeId>,
) -> Vec<Route> {
    if steps == 0 {
        return Vec::new();
    }

    let mut paths: Vec<Vec<NodeId>> = vec![Vec::new()];
    for _ in 0..steps {
        let mut extended: Vec<Vec<NodeId>> = Vec::with_capacity(paths.len() * 2);
        for path in &paths {
            let current = path.last().copied().unwrap_or(start);
            let previous = match path.len() {
                0 => None,
                1 => Some(start),
                n => Some(path[n - 2]),
            };
            for next in next_steps(map, current, previous) {
                let mut p = path.clone();
                p.push(next);
                extended.push(p);
            }
        }
        paths = extended;
    }

    let distances = destination.map(|d| all_distances_from(map, d));
    paths
        .into_iter()
        .filter(|p| p.len() == steps as usize)
        .enumerate()
        .map(|(i, path)| {
            let landing = path[path.len() - 1];
            let distance_to_destination = distances
                .as_ref()
                .and_then(|d| d.get(&landing).copied());
            Route { id: RouteId(i as u32), path, landing, distance_to_destination }
        })
        .collect()
}
