mod builder;
mod types;

pub use builder::{build_graph, build_graph_with, render_label, render_text, status_class};
pub use types::{Edge, Graph, GraphOptions, LabelType, Node, RankDir};
