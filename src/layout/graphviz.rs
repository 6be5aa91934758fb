use std::collections::HashSet;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::debug;
use serde::Deserialize;

use crate::error::{FlowmapError, Result};
use crate::graph::Graph;

use super::{EdgeGeometry, Layout, LayoutEngine, NodeGeometry};

const POINTS_PER_INCH: f64 = 72.0;

/// Lays out graphs with the Graphviz `dot` program.
///
/// The graph is piped to `dot -Tjson` and the returned geometry is converted to
/// screen coordinates (origin top-left, y growing downwards) offset by the graph
/// margins.
pub struct GraphvizLayout {
    program: PathBuf,
}

impl GraphvizLayout {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, dot: &str) -> Result<Vec<u8>> {
        let program = self.program.display();
        let mut child = Command::new(&self.program)
            .arg("-Tjson")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| FlowmapError::Layout(format!("Failed to start {program}: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(dot.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(FlowmapError::Layout(format!(
                "{program} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(output.stdout)
    }
}

impl Default for GraphvizLayout {
    fn default() -> Self {
        Self::new("dot")
    }
}

impl LayoutEngine for GraphvizLayout {
    fn layout(&self, graph: &Graph) -> Result<Layout> {
        check_edges(graph)?;

        let dot = to_dot(graph);
        debug!(
            "Laying out {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        let stdout = self.run(&dot)?;
        parse_layout(&stdout, graph)
    }
}

/// `dot` would invent nodes for dangling edge ends; refuse them instead.
fn check_edges(graph: &Graph) -> Result<()> {
    let ids: HashSet<&str> = graph.nodes().map(|n| n.id.as_str()).collect();

    match graph
        .edges()
        .find(|e| !ids.contains(e.from.as_str()) || !ids.contains(e.to.as_str()))
    {
        Some(edge) => Err(FlowmapError::Layout(format!(
            "edge {} -> {} references a job missing from the snapshot",
            edge.from, edge.to
        ))),
        None => Ok(()),
    }
}

fn quote(raw: &str) -> String {
    format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
}

fn to_inches(px: f64) -> f64 {
    px / POINTS_PER_INCH
}

pub(crate) fn to_dot(graph: &Graph) -> String {
    let opts = &graph.options;
    let mut dot = String::from("digraph flow {\n");

    let _ = writeln!(
        dot,
        "  graph [rankdir={}, nodesep={:.3}, ranksep={:.3}];",
        opts.rankdir.as_str(),
        to_inches(opts.nodesep),
        to_inches(opts.ranksep)
    );
    let _ = writeln!(dot, "  node [shape=box, style=rounded, margin=0];");

    for node in graph.nodes() {
        let _ = writeln!(
            dot,
            "  {} [label={}, class={}];",
            quote(&node.id),
            quote(&node.text),
            quote(&node.class)
        );
    }

    for edge in graph.edges() {
        let _ = writeln!(dot, "  {} -> {};", quote(&edge.from), quote(&edge.to));
    }

    dot.push_str("}\n");
    dot
}

#[derive(Deserialize)]
struct DotOutput {
    bb: String,
    #[serde(default)]
    objects: Vec<DotObject>,
    #[serde(default)]
    edges: Vec<DotEdge>,
}

#[derive(Deserialize)]
struct DotObject {
    #[serde(rename = "_gvid")]
    gvid: usize,
    name: String,
    pos: Option<String>,
    width: Option<String>,
    height: Option<String>,
}

#[derive(Deserialize)]
struct DotEdge {
    tail: usize,
    head: usize,
    pos: Option<String>,
}

fn parse_pair(raw: &str) -> Result<(f64, f64)> {
    let invalid = || FlowmapError::Layout(format!("Invalid coordinate pair: {raw}"));
    let (x, y) = raw.split_once(',').ok_or_else(invalid)?;
    Ok((
        x.trim().parse().map_err(|_| invalid())?,
        y.trim().parse().map_err(|_| invalid())?,
    ))
}

fn parse_number(raw: Option<&String>) -> Result<f64> {
    raw.map_or(Ok(0.0), |s| {
        s.parse()
            .map_err(|_| FlowmapError::Layout(format!("Invalid number: {s}")))
    })
}

/// Spline points from an edge `pos`, start point first and arrow tip last.
fn parse_spline(pos: &str) -> Result<Vec<(f64, f64)>> {
    let mut start = None;
    let mut end = None;
    let mut points = Vec::new();

    for token in pos.split_whitespace() {
        if let Some(rest) = token.strip_prefix("s,") {
            start = Some(parse_pair(rest)?);
        } else if let Some(rest) = token.strip_prefix("e,") {
            end = Some(parse_pair(rest)?);
        } else {
            points.push(parse_pair(token)?);
        }
    }

    Ok(start.into_iter().chain(points).chain(end).collect())
}

pub(crate) fn parse_layout(raw: &[u8], graph: &Graph) -> Result<Layout> {
    let output: DotOutput = serde_json::from_slice(raw)?;

    let bb: Vec<f64> = output
        .bb
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| FlowmapError::Layout(format!("Invalid bounding box: {}", output.bb)))?;
    let [llx, lly, urx, ury] = bb[..] else {
        return Err(FlowmapError::Layout(format!(
            "Invalid bounding box: {}",
            output.bb
        )));
    };

    let (mx, my) = (graph.options.marginx, graph.options.marginy);
    let to_screen = |(x, y): (f64, f64)| (x - llx + mx, ury - y + my);

    let mut names = vec![""; output.objects.len()];
    let mut nodes = Vec::with_capacity(output.objects.len());
    for object in &output.objects {
        if let Some(slot) = names.get_mut(object.gvid) {
            *slot = object.name.as_str();
        }
        let Some(pos) = &object.pos else {
            continue;
        };
        let (x, y) = to_screen(parse_pair(pos)?);
        nodes.push(NodeGeometry {
            id: object.name.clone(),
            x,
            y,
            width: parse_number(object.width.as_ref())? * POINTS_PER_INCH,
            height: parse_number(object.height.as_ref())? * POINTS_PER_INCH,
        });
    }

    let mut edges = Vec::with_capacity(output.edges.len());
    for edge in &output.edges {
        let (Some(from), Some(to)) = (names.get(edge.tail), names.get(edge.head)) else {
            return Err(FlowmapError::Layout(format!(
                "Edge references unknown object {} -> {}",
                edge.tail, edge.head
            )));
        };
        let points = match &edge.pos {
            Some(pos) => parse_spline(pos)?.into_iter().map(to_screen).collect(),
            None => Vec::new(),
        };
        edges.push(EdgeGeometry {
            from: (*from).to_string(),
            to: (*to).to_string(),
            points,
        });
    }

    Ok(Layout {
        width: (urx - llx) + 2.0 * mx,
        height: (ury - lly) + 2.0 * my,
        nodes,
        edges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use crate::model::fixtures::job;
    use crate::model::{Job, Snapshot};

    fn two_job_graph() -> Graph {
        let b = Job {
            previous: vec!["a".to_string()],
            ..job("b")
        };
        let snapshot: Snapshot = [job("a"), b].into_iter().collect();
        build_graph(&snapshot)
    }

    const DOT_JSON: &str = r#"{
        "name": "flow",
        "bb": "0,0,54,108",
        "objects": [
            {"_gvid": 0, "name": "a", "pos": "27,90", "width": "0.75", "height": "0.5"},
            {"_gvid": 1, "name": "b", "pos": "27,18", "width": "0.75", "height": "0.5"}
        ],
        "edges": [
            {"_gvid": 0, "tail": 0, "head": 1, "pos": "e,27,36.104 27,71.697 27,63.983 27,54.712 27,46.112"}
        ]
    }"#;

    #[test]
    fn test_to_dot() {
        let dot = to_dot(&two_job_graph());
        assert!(dot.starts_with("digraph flow {\n"));
        assert!(dot.contains("rankdir=TB, nodesep=0.694, ranksep=0.278"));
        assert!(dot.contains("\"a\" [label=\"a\", class=\"stopped\"];"));
        assert!(dot.contains("\"a\" -> \"b\";"));
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote(r#"say "hi" \o/"#), r#""say \"hi\" \\o/""#);
    }

    #[test]
    fn test_parse_layout_flips_y_and_adds_margins() {
        let layout = parse_layout(DOT_JSON.as_bytes(), &two_job_graph()).unwrap();

        assert_eq!(layout.width, 94.0);
        assert_eq!(layout.height, 148.0);

        let a = layout.node("a").unwrap();
        assert_eq!((a.x, a.y), (47.0, 38.0));
        assert_eq!((a.width, a.height), (54.0, 36.0));
        let b = layout.node("b").unwrap();
        assert!(b.y > a.y);
    }

    #[test]
    fn test_parse_layout_edge_points_end_at_arrow_tip() {
        let layout = parse_layout(DOT_JSON.as_bytes(), &two_job_graph()).unwrap();
        let edge = &layout.edges[0];

        assert_eq!((edge.from.as_str(), edge.to.as_str()), ("a", "b"));
        assert_eq!(edge.points.len(), 5);
        let tip = edge.points[4];
        assert!((tip.1 - (108.0 - 36.104 + 20.0)).abs() < 1e-9);
    }

    #[test]
    fn test_parse_layout_without_objects() {
        let layout = parse_layout(br#"{"bb": "0,0,8,8"}"#, &Graph::default()).unwrap();
        assert!(layout.nodes.is_empty());
        assert_eq!((layout.width, layout.height), (48.0, 48.0));
    }

    #[test]
    fn test_parse_layout_rejects_bad_bounding_box() {
        let err = parse_layout(br#"{"bb": "0,0,8"}"#, &Graph::default()).unwrap_err();
        assert!(err.to_string().contains("bounding box"));
    }

    #[test]
    fn test_missing_predecessor_fails_before_running_dot() {
        let b = Job {
            previous: vec!["ghost".to_string()],
            ..job("b")
        };
        let snapshot: Snapshot = [b].into_iter().collect();
        let engine = GraphvizLayout::new("/nonexistent/dot");

        let err = engine.layout(&build_graph(&snapshot)).unwrap_err();
        assert!(matches!(err, FlowmapError::Layout(_)));
        assert!(err.to_string().contains("ghost -> b"));
    }

    #[test]
    fn test_missing_program_is_a_layout_error() {
        let engine = GraphvizLayout::new("/nonexistent/dot");
        let err = engine.layout(&two_job_graph()).unwrap_err();
        assert!(err.to_string().contains("Failed to start"));
    }
}
