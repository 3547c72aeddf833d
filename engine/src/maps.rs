// ═══════════════════════════════════════════════════════════════════════
// Built-in maps — the Classic Japan board and the Treasure Hunt islands
// ═══════════════════════════════════════════════════════════════════════

use crate::map::{GameMap, NodeDef};
use crate::types::{NodeId, TileKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rent and income multiplier when the owner holds a whole group.
pub const GROUP_BONUS_MULTIPLIER: f64 = 1.5;

/// Default cash for bonus tiles without an explicit amount.
pub const DEFAULT_BONUS_AMOUNT: i64 = 100;
/// Default cash for penalty tiles without an explicit amount.
pub const DEFAULT_PENALTY_AMOUNT: i64 = -100;

// ── Classic ────────────────────────────────────────────────────────────

/// A property node carries three buildings at 20% / 30% / 50% of the
/// city's price and income.
fn city(id: u16, name: &str, next: &[u16], price: i64, income: i64, group: &str) -> NodeDef {
    NodeDef::new(id, name, TileKind::Property, next)
        .with_group(group)
        .with_property(&format!("{name} Stall"), price * 2 / 10, income * 2 / 10)
        .with_property(&format!("{name} Shop"), price * 3 / 10, income * 3 / 10)
        .with_property(&format!("{name} Tower"), price * 5 / 10, income * 5 / 10)
}

fn tile(id: u16, name: &str, kind: TileKind, next: &[u16], amount: i64) -> NodeDef {
    NodeDef::new(id, name, kind, next).with_amount(amount)
}

/// The 34-node Classic board.
pub fn classic_map() -> GameMap {
    use TileKind::{Bonus, Penalty};
    let defs = vec![
        NodeDef::new(0, "Start", TileKind::Start, &[7, 8]),
        // Hokkaido
        city(1, "Sapporo", &[2], 400, 40, "hokkaido"),
        city(2, "Hakodate", &[3], 300, 30, "hokkaido"),
        // Tohoku
        city(3, "Aomori", &[4, 5], 250, 25, "tohoku"),
        city(4, "Sendai", &[5, 6], 350, 35, "tohoku"),
        tile(5, "Yamagata", Bonus, &[6, 17], 150),
        city(6, "Fukushima", &[11, 17], 280, 28, "tohoku"),
        // Kanto
        city(7, "Tokyo", &[8], 600, 60, "kanto"),
        city(8, "Yokohama", &[14], 550, 55, "kanto"),
        tile(9, "Chiba", Penalty, &[7, 10], -150),
        city(10, "Saitama", &[7, 11, 12], 400, 40, "kanto"),
        city(11, "Utsunomiya", &[], 320, 32, "kanto"),
        tile(12, "Maebashi", Bonus, &[16], 200),
        // Chubu
        city(13, "Nagoya", &[19, 21], 500, 50, "chubu"),
        city(14, "Shizuoka", &[13], 380, 38, "chubu"),
        city(15, "Kanazawa", &[19], 360, 36, "chubu"),
        tile(16, "Nagano", Penalty, &[13, 15, 17], -200),
        city(17, "Niigata", &[15], 300, 30, "chubu"),
        // Kinki
        city(18, "Osaka", &[20, 21, 22], 580, 58, "kinki"),
        city(19, "Kyoto", &[18, 20, 32], 520, 52, "kinki"),
        city(20, "Kobe", &[23, 24], 460, 46, "kinki"),
        tile(21, "Nara", Bonus, &[22], 100),
        city(22, "Wakayama", &[], 280, 28, "kinki"),
        // Chugoku / Shikoku
        city(23, "Hiroshima", &[25, 33], 420, 42, "chugoku_shikoku"),
        city(24, "Takamatsu", &[25, 26], 320, 32, "chugoku_shikoku"),
        tile(25, "Matsuyama", Penalty, &[], -100),
        city(26, "Kochi", &[25], 280, 28, "chugoku_shikoku"),
        // Kyushu / Okinawa
        city(27, "Fukuoka", &[28], 480, 48, "kyushu"),
        city(28, "Kumamoto", &[29], 350, 35, "kyushu"),
        tile(29, "Kagoshima", Bonus, &[30], 200),
        city(30, "Naha", &[], 380, 38, "kyushu"),
        // Extra branch nodes
        city(31, "Matsue", &[33], 260, 26, "chugoku_shikoku"),
        tile(32, "Tottori", Bonus, &[31], 150),
        city(33, "Yamaguchi", &[27], 300, 30, "chugoku_shikoku"),
    ];
    GameMap::new(defs, NodeId(0))
}

/// Nodes eligible as a Classic destination.
pub fn destination_candidates(map: &GameMap) -> Vec<NodeId> {
    map.nodes()
        .iter()
        .filter(|n| n.kind == TileKind::Property)
        .map(|n| n.id)
        .collect()
}

// ── Treasure ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreasureMapId {
    #[default]
    FiveIslands,
    TwinContinents,
    RingOfFire,
}

impl TreasureMapId {
    pub const ALL: [TreasureMapId; 3] = [
        TreasureMapId::FiveIslands,
        TreasureMapId::TwinContinents,
        TreasureMapId::RingOfFire,
    ];

    pub fn build(self) -> GameMap {
        match self {
            TreasureMapId::FiveIslands => five_islands(),
            TreasureMapId::TwinContinents => twin_continents(),
            TreasureMapId::RingOfFire => ring_of_fire(),
        }
    }
}

impl fmt::Display for TreasureMapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreasureMapId::FiveIslands => write!(f, "five_islands"),
            TreasureMapId::TwinContinents => write!(f, "twin_continents"),
            TreasureMapId::RingOfFire => write!(f, "ring_of_fire"),
        }
    }
}

impl FromStr for TreasureMapId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TreasureMapId::ALL
            .into_iter()
            .find(|m| m.to_string() == s)
            .ok_or_else(|| format!("unknown map '{s}'"))
    }
}

/// Grid links inside a 3×3 cluster, by slot (row-major).
const CLUSTER_LINKS: [(u16, u16); 12] = [
    (0, 1), (1, 2),
    (3, 4), (4, 5),
    (6, 7), (7, 8),
    (0, 3), (1, 4), (2, 5),
    (3, 6), (4, 7), (5, 8),
];

/// Slot of the cluster centre, which is a card node.
const CLUSTER_CENTRE: u16 = 4;

/// Append a 3×3 cluster starting at `first`. Centre is a card node, the
/// rest are dig sites.
fn push_cluster(defs: &mut Vec<NodeDef>, first: u16, name: &str) {
    for slot in 0..9u16 {
        let kind = if slot == CLUSTER_CENTRE { TileKind::Bonus } else { TileKind::Property };
        let next: Vec<u16> = CLUSTER_LINKS
            .iter()
            .filter(|(a, _)| *a == slot)
            .map(|(_, b)| first + b)
            .collect();
        defs.push(NodeDef::new(first + slot, &format!("{name}-{}", slot + 1), kind, &next));
    }
}

/// Append a corridor node joining `a` and `b`.
fn push_corridor(defs: &mut Vec<NodeDef>, a: u16, b: u16, name: &str, is_card: bool) {
    let id = defs.len() as u16;
    let kind = if is_card { TileKind::Bonus } else { TileKind::Property };
    defs.push(NodeDef::new(id, name, kind, &[a, b]));
}

fn build_islands(defs: Vec<NodeDef>) -> GameMap {
    GameMap::new(defs, NodeId(0))
}

/// Four corner islands and a centre island, joined by eight roads.
fn five_islands() -> GameMap {
    let mut defs = Vec::new();
    let (nw, ne, centre, sw, se) = (0u16, 9u16, 18u16, 27u16, 36u16);
    push_cluster(&mut defs, nw, "Northwest");
    push_cluster(&mut defs, ne, "Northeast");
    push_cluster(&mut defs, centre, "Centre");
    push_cluster(&mut defs, sw, "Southwest");
    push_cluster(&mut defs, se, "Southeast");

    push_corridor(&mut defs, nw + 8, centre, "Northwest Road", true);
    push_corridor(&mut defs, ne + 6, centre + 2, "Northeast Road", false);
    push_corridor(&mut defs, sw + 2, centre + 6, "Southwest Road", false);
    push_corridor(&mut defs, se, centre + 8, "Southeast Road", true);
    push_corridor(&mut defs, nw + 2, ne, "North Road", true);
    push_corridor(&mut defs, sw + 8, se + 6, "South Road", true);
    push_corridor(&mut defs, nw + 6, sw, "West Road", false);
    push_corridor(&mut defs, ne + 8, se + 2, "East Road", false);
    build_islands(defs)
}

/// Two continents of two clusters each, joined by two bridges.
fn twin_continents() -> GameMap {
    let mut defs = Vec::new();
    let (left_top, left_bottom, right_top, right_bottom) = (0u16, 9u16, 18u16, 27u16);
    push_cluster(&mut defs, left_top, "Upper Left");
    push_cluster(&mut defs, left_bottom, "Lower Left");
    push_cluster(&mut defs, right_top, "Upper Right");
    push_cluster(&mut defs, right_bottom, "Lower Right");

    push_corridor(&mut defs, left_top + 7, left_bottom + 1, "West Pass", false);
    push_corridor(&mut defs, right_top + 7, right_bottom + 1, "East Pass", false);
    push_corridor(&mut defs, left_top + 5, right_top + 3, "North Bridge", true);
    push_corridor(&mut defs, left_bottom + 5, right_bottom + 3, "South Bridge", true);
    build_islands(defs)
}

/// Six clusters in a ring. Each pair of neighbours is linked from the
/// slot facing the next island to the slot facing back.
fn ring_of_fire() -> GameMap {
    const NAMES: [&str; 6] = ["Volcano", "Coral", "Jungle", "Glacier", "Desert", "Mine"];
    const FACING: [(u16, u16); 6] = [(2, 6), (2, 6), (8, 0), (6, 2), (6, 2), (0, 8)];

    let mut defs = Vec::new();
    for (i, name) in NAMES.iter().enumerate() {
        push_cluster(&mut defs, i as u16 * 9, name);
    }
    for i in 0..6usize {
        let next = (i + 1) % 6;
        let (from_slot, to_slot) = FACING[i];
        push_corridor(
            &mut defs,
            i as u16 * 9 + from_slot,
            next as u16 * 9 + to_slot,
            &format!("{} Strait", NAMES[i]),
            i % 2 == 0,
        );
    }
    build_islands(defs)
}
