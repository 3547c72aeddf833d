// ═══════════════════════════════════════════════════════════════════════
// Map graph — declarative node list canonicalized into a symmetric graph
// Node data never changes once the map is built.
// ═══════════════════════════════════════════════════════════════════════

use crate::types::{NodeId, Property, PropertyId, TileKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Building as written in map data; ids are assigned at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    pub price: i64,
    pub base_income: i64,
}

/// Node as written in map data. `next` is the forward adjacency; missing
/// reverse edges are filled in when the map is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDef {
    pub id: NodeId,
    pub name: String,
    pub kind: TileKind,
    pub next: Vec<NodeId>,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
}

impl NodeDef {
    pub fn new(id: u16, name: &str, kind: TileKind, next: &[u16]) -> Self {
        NodeDef {
            id: NodeId(id),
            name: name.to_string(),
            kind,
            next: next.iter().map(|&n| NodeId(n)).collect(),
            properties: Vec::new(),
            group: None,
            amount: None,
        }
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    pub fn with_amount(mut self, amount: i64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_property(mut self, name: &str, price: i64, base_income: i64) -> Self {
        self.properties.push(PropertyDef { name: name.to_string(), price, base_income });
        self
    }
}

/// Static description of a node after canonicalization.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub kind: TileKind,
    pub adjacent: Vec<NodeId>,
    pub properties: Vec<Property>,
    pub group: Option<String>,
    pub amount: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("map has no nodes")]
    Empty,
    #[error("node at position {position} has id {found}; ids must be dense and ordered from 0")]
    IdOutOfOrder { position: usize, found: NodeId },
    #[error("node {from} links to unknown node {to}")]
    UnknownNode { from: NodeId, to: NodeId },
    #[error("node {0} links to itself")]
    SelfLoop(NodeId),
    #[error("node {0} has more properties than slot ids 1-255 allow")]
    TooManyProperties(NodeId),
    #[error("start node {0} does not exist")]
    UnknownStart(NodeId),
    #[error("invalid map json: {0}")]
    Json(String),
}

/// Map file layout: node list plus the start node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapFile {
    pub start: NodeId,
    pub nodes: Vec<NodeDef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameMap {
    nodes: Vec<Node>,
    start: NodeId,
    /// group id → member nodes, in node order.
    groups: HashMap<String, Vec<NodeId>>,
}

impl GameMap {
    /// Build a map from data, completing every reverse edge.
    pub fn try_new(defs: Vec<NodeDef>, start: NodeId) -> Result<Self, MapError> {
        if defs.is_empty() {
            return Err(MapError::Empty);
        }
        for (position, def) in defs.iter().enumerate() {
            if def.id.0 as usize != position {
                return Err(MapError::IdOutOfOrder { position, found: def.id });
            }
            if def.properties.len() > u8::MAX as usize {
                return Err(MapError::TooManyProperties(def.id));
            }
        }
        if start.0 as usize >= defs.len() {
            return Err(MapError::UnknownStart(start));
        }

        let mut adjacency: Vec<Vec<NodeId>> = Vec::with_capacity(defs.len());
        for def in &defs {
            let mut list: Vec<NodeId> = Vec::with_capacity(def.next.len());
            for &to in &def.next {
                if to.0 as usize >= defs.len() {
                    return Err(MapError::UnknownNode { from: def.id, to });
                }
                if to == def.id {
                    return Err(MapError::SelfLoop(def.id));
                }
                if !list.contains(&to) {
                    list.push(to);
                }
            }
            adjacency.push(list);
        }
        for def in &defs {
            for &to in &def.next {
                let back = &mut adjacency[to.0 as usize];
                if !back.contains(&def.id) {
                    back.push(def.id);
                }
            }
        }

        let mut groups: HashMap<String, Vec<NodeId>> = HashMap::new();
        let nodes: Vec<Node> = defs
            .into_iter()
            .zip(adjacency)
            .map(|(def, adjacent)| {
                if let Some(g) = &def.group {
                    groups.entry(g.clone()).or_default().push(def.id);
                }
                let properties = def
                    .properties
                    .into_iter()
                    .enumerate()
                    .map(|(i, p)| Property {
                        id: PropertyId { node: def.id, slot: (i + 1) as u8 },
                        name: p.name,
                        price: p.price,
                        base_income: p.base_income,
                    })
                    .collect();
                Node {
                    id: def.id,
                    name: def.name,
                    kind: def.kind,
                    adjacent,
                    properties,
                    group: def.group,
                    amount: def.amount,
                }
            })
            .collect();

        Ok(GameMap { nodes, start, groups })
    }

    /// Parse and canonicalize a JSON map file.
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        let file: MapFile = serde_json::from_str(json).map_err(|e| MapError::Json(e.to_string()))?;
        Self::try_new(file.nodes, file.start)
    }

    /// Build a map from data that is known to be valid. Broken static data
    /// is unrecoverable, so this panics on error.
    pub fn new(defs: Vec<NodeDef>, start: NodeId) -> Self {
        match Self::try_new(defs, start) {
            Ok(map) => map,
            Err(e) => panic!("corrupt map data: {e}"),
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    pub fn neighbors(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).adjacent
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|n| n.id)
    }

    /// Nodes tagged with `group`; empty for an unknown group.
    pub fn group_nodes(&self, group: &str) -> &[NodeId] {
        self.groups.get(group).map_or(&[], |v| v.as_slice())
    }

    pub fn property(&self, id: &PropertyId) -> Option<&Property> {
        self.get(id.node)?.properties.iter().find(|p| p.id == *id)
    }

    /// Undirected edge list, each edge once with the smaller id first.
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        let mut edges = Vec::new();
        for node in &self.nodes {
            for &to in &node.adjacent {
                if node.id < to {
                    edges.push((node.id, to));
                }
            }
        }
        edges
    }
}
