use std::fmt;

use serde::{Deserialize, Serialize};

use crate::layout::Layout;

/// Extra room around the laid-out graph when fitting it to the viewport.
const EXTENT_MARGIN_WIDTH: f64 = 80.0;
const EXTENT_MARGIN_HEIGHT: f64 = 40.0;

const MIN_SCALE: f64 = 0.05;
const MAX_SCALE: f64 = 20.0;

/// Visible drawing area in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Size of the rendered graph, margin allowance included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub width: f64,
    pub height: f64,
}

impl Extent {
    pub fn from_layout(layout: &Layout) -> Self {
        Self {
            width: layout.width + EXTENT_MARGIN_WIDTH,
            height: layout.height + EXTENT_MARGIN_HEIGHT,
        }
    }
}

/// Translate followed by a uniform scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translate: (f64, f64),
    pub scale: f64,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translate: (0.0, 0.0),
        scale: 1.0,
    };
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Renders as an SVG `transform` attribute value.
impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "translate({},{})scale({})",
            self.translate.0, self.translate.1, self.scale
        )
    }
}

/// Largest uniform scale that shows the whole extent, centred in the viewport.
///
/// Small graphs are scaled up as well as large graphs scaled down.
pub fn fit(extent: Extent, viewport: Viewport) -> Transform {
    let scale = (viewport.width / extent.width).min(viewport.height / extent.height);
    Transform {
        translate: (
            viewport.width / 2.0 - extent.width * scale / 2.0,
            viewport.height / 2.0 - extent.height * scale / 2.0,
        ),
        scale,
    }
}

/// Pan/zoom state layered on top of the last auto-fit.
///
/// Every redraw calls [`ZoomController::reset`], so manual adjustments only last until
/// the next snapshot change.
#[derive(Debug, Clone)]
pub struct ZoomController {
    current: Transform,
    scale_extent: (f64, f64),
}

impl Default for ZoomController {
    fn default() -> Self {
        Self {
            current: Transform::IDENTITY,
            scale_extent: (MIN_SCALE, MAX_SCALE),
        }
    }
}

impl ZoomController {
    pub fn current(&self) -> Transform {
        self.current
    }

    /// Overwrites the baseline, discarding any manual pan or zoom.
    pub fn reset(&mut self, baseline: Transform) {
        self.current = baseline;
    }

    pub fn pan(&mut self, dx: f64, dy: f64) -> Transform {
        self.current.translate.0 += dx;
        self.current.translate.1 += dy;
        self.current
    }

    /// Multiplies the scale by `factor`, keeping the screen point `(px, py)` fixed.
    pub fn zoom_at(&mut self, factor: f64, (px, py): (f64, f64)) -> Transform {
        let (min, max) = self.scale_extent;
        let old = self.current;
        let scale = (old.scale * factor).clamp(min, max);

        // Graph-space point under the cursor before zooming.
        let gx = (px - old.translate.0) / old.scale;
        let gy = (py - old.translate.1) / old.scale;

        self.current = Transform {
            translate: (px - gx * scale, py - gy * scale),
            scale,
        };
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_fit_centres_when_dimensions_tie() {
        let t = fit(
            Extent {
                width: 400.0,
                height: 200.0,
            },
            Viewport {
                width: 800.0,
                height: 400.0,
            },
        );
        assert_close(t.scale, 2.0);
        assert_close(t.translate.0, 0.0);
        assert_close(t.translate.1, 0.0);
    }

    #[test]
    fn test_fit_identity_scale() {
        let t = fit(
            Extent {
                width: 400.0,
                height: 200.0,
            },
            Viewport {
                width: 400.0,
                height: 400.0,
            },
        );
        assert_close(t.scale, 1.0);
        assert_close(t.translate.0, 0.0);
        assert_close(t.translate.1, 100.0);
    }

    #[test]
    fn test_fit_shrinks_large_graph() {
        let t = fit(
            Extent {
                width: 2000.0,
                height: 1000.0,
            },
            Viewport {
                width: 800.0,
                height: 400.0,
            },
        );
        assert_close(t.scale, 0.4);
        assert_close(t.translate.0, 0.0);
        assert_close(t.translate.1, 0.0);
    }

    #[test]
    fn test_fit_limited_by_width() {
        let t = fit(
            Extent {
                width: 1600.0,
                height: 200.0,
            },
            Viewport {
                width: 800.0,
                height: 400.0,
            },
        );
        assert_close(t.scale, 0.5);
        assert_close(t.translate.0, 0.0);
        assert_close(t.translate.1, 150.0);
    }

    #[test]
    fn test_extent_adds_margin_allowance() {
        let layout = Layout {
            width: 320.0,
            height: 160.0,
            ..Layout::default()
        };
        assert_eq!(
            Extent::from_layout(&layout),
            Extent {
                width: 400.0,
                height: 200.0
            }
        );
    }

    #[test]
    fn test_transform_attribute() {
        let t = Transform {
            translate: (200.0, 100.5),
            scale: 0.4,
        };
        assert_eq!(t.to_string(), "translate(200,100.5)scale(0.4)");
    }

    #[test]
    fn test_pan_composes_with_baseline() {
        let mut zoom = ZoomController::default();
        zoom.reset(Transform {
            translate: (10.0, 20.0),
            scale: 2.0,
        });
        let t = zoom.pan(5.0, -5.0);
        assert_eq!(t.translate, (15.0, 15.0));
        assert_eq!(t.scale, 2.0);
    }

    #[test]
    fn test_zoom_keeps_point_fixed() {
        let mut zoom = ZoomController::default();
        zoom.reset(Transform {
            translate: (100.0, 50.0),
            scale: 1.0,
        });
        let t = zoom.zoom_at(2.0, (200.0, 150.0));
        assert_close(t.scale, 2.0);
        // Graph point (100, 100) stays under screen point (200, 150).
        assert_close(100.0 * t.scale + t.translate.0, 200.0);
        assert_close(100.0 * t.scale + t.translate.1, 150.0);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut zoom = ZoomController::default();
        let t = zoom.zoom_at(1000.0, (0.0, 0.0));
        assert_close(t.scale, MAX_SCALE);
    }

    #[test]
    fn test_reset_discards_manual_adjustments() {
        let mut zoom = ZoomController::default();
        let baseline = Transform {
            translate: (1.0, 2.0),
            scale: 0.5,
        };
        zoom.reset(baseline);
        zoom.pan(40.0, 40.0);
        zoom.zoom_at(3.0, (0.0, 0.0));
        zoom.reset(baseline);
        assert_eq!(zoom.current(), baseline);
    }
}
