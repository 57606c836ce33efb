mod load;
mod parse;

use serde::Deserialize;

pub use load::{list_datasets, load_dataset};

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NodeRecord {
    pub node_idx: u32,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct EdgeRecord {
    pub edge_idx: u32,
    pub source: u32,
    pub target: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

impl GraphData {
    pub fn node(&self, node_idx: u32) -> Option<&NodeRecord> {
        self.nodes.iter().find(|node| node.node_idx == node_idx)
    }
}

/// Per-node numeric vector drawn by the vector plot pane.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NodeVector {
    pub node_idx: u32,
    #[serde(default)]
    pub values: Vec<f64>,
}

/// One dataset as handed to the panes. Each sub-resource is independently
/// optional; a `None` makes the matching pane show its empty state.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    pub id: String,
    pub graph: Option<GraphData>,
    pub vectors: Option<Vec<NodeVector>>,
}

impl Dataset {
    pub fn node_count(&self) -> usize {
        self.graph.as_ref().map_or(0, |graph| graph.nodes.len())
    }

    pub fn edge_count(&self) -> usize {
        self.graph.as_ref().map_or(0, |graph| graph.edges.len())
    }
}
