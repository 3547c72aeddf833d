// ═══════════════════════════════════════════════════════════════════════
// Core types — ids, tiles, players, cards and effects shared by both modes
// ═══════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ── Identifiers ────────────────────────────────────────────────────────
// Compact, copyable ids. NodeId indexes the map's node vector, PlayerId
// indexes the seat list.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct NodeId(pub u16);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct PlayerId(pub u8);

impl PlayerId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player_{}", self.0)
    }
}

/// A property is the `slot`-th building on a node. The node is part of the
/// id, so the owning node is known without scanning the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct PropertyId {
    pub node: NodeId,
    pub slot: u8,
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.node.0, self.slot)
    }
}

// ── Enums ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    Start,
    Property,
    /// Cash bonus in Classic, card node in Treasure.
    Bonus,
    Penalty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerColor {
    Red,
    Blue,
    Green,
    Yellow,
}

impl PlayerColor {
    pub const ALL: [PlayerColor; 4] = [
        PlayerColor::Red,
        PlayerColor::Blue,
        PlayerColor::Green,
        PlayerColor::Yellow,
    ];
}

impl fmt::Display for PlayerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerColor::Red => write!(f, "red"),
            PlayerColor::Blue => write!(f, "blue"),
            PlayerColor::Green => write!(f, "green"),
            PlayerColor::Yellow => write!(f, "yellow"),
        }
    }
}

// ── Property ───────────────────────────────────────────────────────────

/// A purchasable building. Ownership lives on the player, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub name: String,
    pub price: i64,
    pub base_income: i64,
}

// ── Classic player ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassicPlayer {
    pub id: PlayerId,
    pub name: String,
    pub color: PlayerColor,
    pub position: NodeId,
    pub money: i64,
    pub owned: BTreeSet<PropertyId>,
    /// Cached `money + Σ price(owned)`. Rewritten by every mutation that
    /// touches money or ownership.
    pub total_assets: i64,
    pub is_human: bool,
    pub laps_completed: u32,
}

impl ClassicPlayer {
    pub fn owns(&self, id: &PropertyId) -> bool {
        self.owned.contains(id)
    }
}

// ── Cards ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    PowerUp,
    Substitute,
    Seal,
    BlowAway,
    Paralysis,
    PhoneFraud,
    Dice1,
    Dice10,
    TimeMachine,
}

impl CardKind {
    pub const ALL: [CardKind; 9] = [
        CardKind::PowerUp,
        CardKind::Substitute,
        CardKind::Seal,
        CardKind::BlowAway,
        CardKind::Paralysis,
        CardKind::PhoneFraud,
        CardKind::Dice1,
        CardKind::Dice10,
        CardKind::TimeMachine,
    ];

    /// Passive cards are read by the resolvers and never played.
    pub fn is_passive(self) -> bool {
        matches!(self, CardKind::PowerUp | CardKind::Substitute)
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CardKind::PowerUp => "power_up",
            CardKind::Substitute => "substitute",
            CardKind::Seal => "seal",
            CardKind::BlowAway => "blow_away",
            CardKind::Paralysis => "paralysis",
            CardKind::PhoneFraud => "phone_fraud",
            CardKind::Dice1 => "dice_1",
            CardKind::Dice10 => "dice_10",
            CardKind::TimeMachine => "time_machine",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct CardId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub kind: CardKind,
}

impl Card {
    pub fn is_passive(&self) -> bool {
        self.kind.is_passive()
    }
}

// ── Effects ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Sealed,
    Paralyzed,
    DiceOne,
    DiceTen,
}

impl EffectKind {
    /// Dice value this effect forces, if any.
    pub fn forced_dice(self) -> Option<u8> {
        match self {
            EffectKind::DiceOne => Some(1),
            EffectKind::DiceTen => Some(10),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    pub remaining_turns: u8,
}

// ── Treasure player ────────────────────────────────────────────────────

/// CPU play-style weights. Always sums to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    pub miner: f64,
    pub card_lover: f64,
    pub stalker: f64,
}

impl Default for Personality {
    fn default() -> Self {
        Personality { miner: 1.0 / 3.0, card_lover: 1.0 / 3.0, stalker: 1.0 / 3.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreasurePlayer {
    pub id: PlayerId,
    pub name: String,
    pub color: PlayerColor,
    pub position: NodeId,
    pub is_human: bool,
    pub treasures: u32,
    pub cards: Vec<Card>,
    pub active_effects: Vec<Effect>,
    pub personality: Option<Personality>,
}

impl TreasurePlayer {
    pub fn count_cards(&self, kind: CardKind) -> usize {
        self.cards.iter().filter(|c| c.kind == kind).count()
    }

    pub fn has_card(&self, kind: CardKind) -> bool {
        self.cards.iter().any(|c| c.kind == kind)
    }

    pub fn has_effect(&self, kind: EffectKind) -> bool {
        self.active_effects.iter().any(|e| e.kind == kind)
    }

    /// Remove the first card of `kind` from hand. Returns whether one was held.
    pub fn discard_first(&mut self, kind: CardKind) -> bool {
        match self.cards.iter().position(|c| c.kind == kind) {
            Some(pos) => {
                self.cards.remove(pos);
                true
            }
            None => false,
        }
    }
}

// ── Mining ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigOutcome {
    Normal,
    Rare,
    Trap,
    /// Roll above the chance; the node stays open.
    Fail,
    /// Node was already mined.
    Empty,
}

impl DigOutcome {
    /// Whether this outcome marks the node permanently mined.
    pub fn consumes_node(self) -> bool {
        matches!(self, DigOutcome::Normal | DigOutcome::Rare | DigOutcome::Trap)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningRecord {
    pub miner: Option<PlayerId>,
    pub outcome: DigOutcome,
}
