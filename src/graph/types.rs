use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Direction in which ranks are laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankDir {
    #[default]
    #[serde(rename = "TB", alias = "TD")]
    TopBottom,
    #[serde(rename = "BT")]
    BottomTop,
    #[serde(rename = "LR")]
    LeftRight,
    #[serde(rename = "RL")]
    RightLeft,
}

impl RankDir {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopBottom => "TB",
            Self::BottomTop => "BT",
            Self::LeftRight => "LR",
            Self::RightLeft => "RL",
        }
    }
}

/// Graph-wide layout hints. Distances are in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphOptions {
    pub nodesep: f64,
    pub ranksep: f64,
    pub rankdir: RankDir,
    pub marginx: f64,
    pub marginy: f64,
    /// How node labels are drawn
    pub labels: LabelType,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            nodesep: 50.0,
            ranksep: 20.0,
            rankdir: RankDir::TopBottom,
            marginx: 20.0,
            marginy: 20.0,
            labels: LabelType::Html,
        }
    }
}

/// `Html` draws the rich label markup; `Text` draws the plain-text fallback for
/// viewers without `foreignObject` support.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelType {
    #[default]
    Html,
    Text,
}

/// A job as the layout engine sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    /// Rich label markup
    pub label: String,
    /// Plain-text fallback of `label`
    pub text: String,
    pub label_type: LabelType,
    /// Corner radii
    pub rx: f64,
    pub ry: f64,
    pub padding: f64,
    /// Space-separated status classifiers
    pub class: String,
}

/// Upstream job -> downstream job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    /// Width hint reserved along the edge
    pub width: f64,
}

/// Layout-ready graph derived from one snapshot.
///
/// Nodes and edges are kept in registration order. Re-registering a key replaces the
/// value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Graph {
    pub options: GraphOptions,
    #[serde(serialize_with = "values_only")]
    nodes: IndexMap<String, Node>,
    #[serde(serialize_with = "values_only")]
    edges: IndexMap<(String, String), Edge>,
}

fn values_only<K, V, S>(map: &IndexMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
where
    V: Serialize,
    S: serde::Serializer,
{
    serializer.collect_seq(map.values())
}

impl Graph {
    pub fn new(options: GraphOptions) -> Self {
        Self {
            options,
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
        }
    }

    pub fn set_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn set_edge(&mut self, edge: Edge) {
        self.edges
            .insert((edge.from.clone(), edge.to.clone()), edge);
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
