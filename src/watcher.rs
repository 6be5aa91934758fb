use std::time::Duration;

use chrono::{DateTime, Local};
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::error::Result;
use crate::graph::{build_graph_with, GraphOptions};
use crate::layout::LayoutEngine;
use crate::model::Snapshot;
use crate::render::Surface;
use crate::status::SnapshotSource;
use crate::viewport::{fit, Extent, Transform, ZoomController};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// What to do when a poll is due while the previous fetch has not answered yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PollMode {
    /// Skip the poll.
    #[default]
    Serialized,
    /// Fetch anyway; responses are applied in the order they arrive.
    Overlapping,
}

/// State that lives as long as the view.
#[derive(Debug, Default)]
pub struct AppState {
    pub snapshot: Snapshot,
    pub zoom: ZoomController,
    pub redraws: u64,
    pub last_redraw: Option<DateTime<Local>>,
    /// Whether `snapshot` is what the surface currently shows
    pub drawn: bool,
}

/// Outcome of one completed fetch, reported to the watcher's observer.
#[derive(Debug)]
pub enum PollOutcome<'a> {
    Redrawn(&'a AppState),
    Unchanged,
    Failed(String),
}

/// Owns the drawing pipeline: snapshot -> graph -> layout -> surface -> auto-fit.
pub struct FlowView<L, S> {
    layout: L,
    surface: S,
    options: GraphOptions,
    state: AppState,
}

impl<L: LayoutEngine, S: Surface> FlowView<L, S> {
    pub fn new(layout: L, surface: S, initial: Snapshot) -> Self {
        Self {
            layout,
            surface,
            options: GraphOptions::default(),
            state: AppState {
                snapshot: initial,
                ..AppState::default()
            },
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: GraphOptions) -> Self {
        self.options = options;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Rebuilds the graph from the held snapshot and fits it to the viewport.
    ///
    /// Any manual pan or zoom is replaced by the new fit.
    pub fn draw(&mut self) -> Result<Transform> {
        self.state.drawn = false;
        let graph = build_graph_with(&self.state.snapshot, self.options.clone());
        let layout = self.layout.layout(&graph)?;
        self.surface.render(&graph, &layout)?;

        let transform = fit(Extent::from_layout(&layout), self.surface.viewport());
        self.surface.apply_transform(transform)?;
        self.state.zoom.reset(transform);

        self.state.drawn = true;
        self.state.redraws += 1;
        self.state.last_redraw = Some(Local::now());
        info!(
            "Drew {} jobs, {} edges (scale {:.3})",
            graph.node_count(),
            graph.edge_count(),
            transform.scale
        );

        Ok(transform)
    }

    /// Replaces the held snapshot and redraws, unless it matches what is already drawn.
    ///
    /// Returns whether a redraw happened. After a failed draw the next update redraws
    /// even when the data is the same.
    pub fn update(&mut self, snapshot: Snapshot) -> Result<bool> {
        if self.state.drawn && snapshot == self.state.snapshot {
            debug!("Flow status unchanged, skipping redraw");
            return Ok(false);
        }

        self.state.snapshot = snapshot;
        self.draw()?;
        Ok(true)
    }

    pub fn pan(&mut self, dx: f64, dy: f64) -> Result<()> {
        let transform = self.state.zoom.pan(dx, dy);
        self.surface.apply_transform(transform)
    }

    pub fn zoom_at(&mut self, factor: f64, point: (f64, f64)) -> Result<()> {
        let transform = self.state.zoom.zoom_at(factor, point);
        self.surface.apply_transform(transform)
    }
}

type Observer = Box<dyn FnMut(&PollOutcome<'_>)>;

/// Polls a snapshot source on a fixed period and keeps a [`FlowView`] current.
pub struct FlowWatcher<Src, L, S> {
    source: Src,
    view: FlowView<L, S>,
    period: Duration,
    mode: PollMode,
    observer: Observer,
}

impl<Src, L, S> FlowWatcher<Src, L, S>
where
    Src: SnapshotSource,
    L: LayoutEngine,
    S: Surface,
{
    pub fn new(source: Src, view: FlowView<L, S>) -> Self {
        Self {
            source,
            view,
            period: DEFAULT_POLL_INTERVAL,
            mode: PollMode::default(),
            observer: Box::new(|_| {}),
        }
    }

    #[must_use]
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: PollMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: impl FnMut(&PollOutcome<'_>) + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn view(&self) -> &FlowView<L, S> {
        &self.view
    }

    /// Draws immediately, then polls every period.
    ///
    /// Runs until `limit` fetches have completed, or forever when `limit` is `None`.
    /// Failed fetches and failed redraws are logged and polling continues.
    pub async fn run(&mut self, limit: Option<usize>) {
        let Self {
            source,
            view,
            period,
            mode,
            observer,
        } = self;

        if let Err(e) = view.draw() {
            warn!("Initial draw failed: {e}");
        }

        let mut ticker = interval_at(Instant::now() + *period, *period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut pending = FuturesUnordered::new();
        let mut completed = 0usize;

        while limit.map_or(true, |limit| completed < limit) {
            tokio::select! {
                _ = ticker.tick() => {
                    if *mode == PollMode::Serialized && !pending.is_empty() {
                        debug!("Previous fetch still in flight, skipping poll");
                        continue;
                    }
                    pending.push(source.fetch());
                }
                Some(result) = pending.next(), if !pending.is_empty() => {
                    completed += 1;
                    let outcome = match result {
                        Ok(snapshot) => match view.update(snapshot) {
                            Ok(true) => PollOutcome::Redrawn(&view.state),
                            Ok(false) => PollOutcome::Unchanged,
                            Err(e) => {
                                warn!("Redraw failed: {e}");
                                PollOutcome::Failed(e.to_string())
                            }
                        },
                        Err(e) => {
                            warn!("Failed to fetch flow status: {e}");
                            PollOutcome::Failed(e.to_string())
                        }
                    };
                    observer(&outcome);
                }
            }
        }
    }
}
