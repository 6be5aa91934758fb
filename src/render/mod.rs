mod svg;

use crate::error::Result;
use crate::graph::Graph;
use crate::layout::Layout;
use crate::viewport::{Transform, Viewport};

pub use svg::SvgSurface;

/// Drawing target for laid-out graphs.
pub trait Surface {
    /// Current size of the visible area.
    fn viewport(&self) -> Viewport;

    /// Replaces the drawn content with `graph` placed according to `layout`.
    fn render(&mut self, graph: &Graph, layout: &Layout) -> Result<()>;

    /// Sets translate and scale of the content group in one step.
    fn apply_transform(&mut self, transform: Transform) -> Result<()>;
}
