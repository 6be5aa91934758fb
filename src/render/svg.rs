use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{FlowmapError, Result};
use crate::format::escape_html;
use crate::graph::{Graph, LabelType};
use crate::layout::Layout;
use crate::viewport::{Transform, Viewport};

use super::Surface;

const STYLE: &str = r#"
    svg { background: #fafafa; font: 14px sans-serif; }
    .node rect { stroke: #666; stroke-width: 1.5px; fill: #fff; }
    .node .status { display: inline-block; width: 10px; height: 10px; border-radius: 5px; margin-right: 6px; background: #bbb; }
    .node .buildurl { margin-left: 6px; color: #555; }
    .node.stopped rect { fill: #eee; }
    .node.running rect { fill: #fff7d6; }
    .node.running .status { background: #f0ad4e; }
    .node.warn rect { stroke: #f0ad4e; stroke-width: 3px; }
    .node.success .status { background: #5cb85c; }
    .node.failure .status { background: #d9534f; }
    .node.failure rect { stroke: #d9534f; }
    .node.aborted .status { background: #777; }
    .edgePath path { stroke: #333; stroke-width: 1.5px; fill: none; }
"#;

/// Renders the graph into a standalone SVG file, rewritten on every transform change.
pub struct SvgSurface {
    path: PathBuf,
    viewport: Viewport,
    content: String,
    transform: Transform,
}

impl SvgSurface {
    pub fn new(path: impl Into<PathBuf>, viewport: Viewport) -> Self {
        Self {
            path: path.into(),
            viewport,
            content: String::new(),
            transform: Transform::IDENTITY,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full SVG document for the current content and transform.
    pub fn document(&self) -> String {
        let Viewport { width, height } = self.viewport;
        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
        );
        let _ = writeln!(svg, "<style>{STYLE}</style>");
        svg.push_str(concat!(
            r#"<defs><marker id="arrowhead" viewBox="0 0 10 10" refX="9" refY="5" "#,
            r#"markerWidth="8" markerHeight="6" orient="auto">"#,
            r#"<path d="M 0 0 L 10 5 L 0 10 z"/></marker></defs>"#,
            "\n"
        ));
        let _ = writeln!(svg, r#"<g transform="{}">"#, self.transform);
        svg.push_str(&self.content);
        svg.push_str("</g>\n</svg>\n");
        svg
    }

    fn flush(&self) -> Result<()> {
        // Write next to the target and rename so readers never see a partial file.
        let tmp = self.path.with_extension("svg.tmp");
        fs::write(&tmp, self.document())?;
        fs::rename(&tmp, &self.path)?;
        debug!("Wrote {}", self.path.display());
        Ok(())
    }
}

impl Surface for SvgSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn render(&mut self, graph: &Graph, layout: &Layout) -> Result<()> {
        let mut content = String::new();

        for edge in &layout.edges {
            let Some(((x0, y0), rest)) = edge.points.split_first() else {
                continue;
            };
            let mut d = format!("M{x0},{y0}");
            for (x, y) in rest {
                let _ = write!(d, " L{x},{y}");
            }
            let _ = writeln!(
                content,
                r#"<g class="edgePath"><path d="{d}" marker-end="url(#arrowhead)"/></g>"#
            );
        }

        for node in graph.nodes() {
            let geometry = layout.node(&node.id).ok_or_else(|| {
                FlowmapError::Render(format!("No geometry for node {}", node.id))
            })?;
            let (w, h) = (geometry.width, geometry.height);
            let (left, top) = (-w / 2.0, -h / 2.0);
            let _ = write!(
                content,
                concat!(
                    r#"<g class="node {class}" transform="translate({x},{y})">"#,
                    r#"<rect rx="{rx}" ry="{ry}" x="{left}" y="{top}" width="{w}" height="{h}"/>"#,
                ),
                class = escape_html(&node.class),
                x = geometry.x,
                y = geometry.y,
                rx = node.rx,
                ry = node.ry,
                left = left,
                top = top,
                w = w,
                h = h,
            );
            let _ = match node.label_type {
                LabelType::Html => writeln!(
                    content,
                    concat!(
                        r#"<foreignObject x="{left}" y="{top}" width="{w}" height="{h}">"#,
                        r#"<div xmlns="http://www.w3.org/1999/xhtml">{label}</div>"#,
                        r#"</foreignObject></g>"#
                    ),
                    left = left,
                    top = top,
                    w = w,
                    h = h,
                    label = node.label,
                ),
                LabelType::Text => writeln!(
                    content,
                    r#"<text text-anchor="middle" dominant-baseline="central">{}</text></g>"#,
                    escape_html(&node.text)
                ),
            };
        }

        self.content = content;
        Ok(())
    }

    fn apply_transform(&mut self, transform: Transform) -> Result<()> {
        self.transform = transform;
        self.flush()
    }
}
