mod graphviz;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::Graph;

pub use graphviz::GraphvizLayout;

/// Computes node and edge geometry for a graph.
pub trait LayoutEngine {
    fn layout(&self, graph: &Graph) -> Result<Layout>;
}

/// Centre point and size of a laid-out node, in screen coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeGeometry {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeGeometry {
    pub from: String,
    pub to: String,
    pub points: Vec<(f64, f64)>,
}

/// Result of a layout run. `width` and `height` include the graph margins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub width: f64,
    pub height: f64,
    pub nodes: Vec<NodeGeometry>,
    pub edges: Vec<EdgeGeometry>,
}

impl Layout {
    pub fn node(&self, id: &str) -> Option<&NodeGeometry> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
