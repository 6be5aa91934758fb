use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use crate::config::Config;
use crate::graph::build_graph_with;
use crate::layout::GraphvizLayout;
use crate::output::{print_status, WatchProgress};
use crate::render::SvgSurface;
use crate::status::{SnapshotSource, StatusClient};
use crate::viewport::Viewport;
use crate::watcher::{FlowView, FlowWatcher, PollMode, PollOutcome};

#[derive(Parser)]
#[command(name = "flowmap")]
#[command(author, version, about = "Live build flow status graph", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./flowmap.{toml,json,yaml,yml})
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct EndpointArgs {
    /// Root URL of the status service
    #[arg(short, long, env = "FLOWMAP_URL")]
    url: Option<String>,

    /// CI server name
    #[arg(short, long)]
    server: Option<String>,

    /// Flow name
    #[arg(short, long)]
    flow: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the flow and keep an SVG drawing of it up to date
    Watch {
        #[command(flatten)]
        endpoint: EndpointArgs,

        /// Seconds between polls
        #[arg(short, long)]
        interval: Option<u64>,

        /// What to do when a poll is due while a fetch is still running
        #[arg(long, value_enum)]
        poll_mode: Option<PollMode>,

        /// SVG file to write
        #[arg(long)]
        svg: Option<PathBuf>,

        /// Viewport width in pixels
        #[arg(long)]
        width: Option<f64>,

        /// Viewport height in pixels
        #[arg(long)]
        height: Option<f64>,

        /// Graphviz program used for layout
        #[arg(long)]
        dot: Option<PathBuf>,

        /// Stop after this many polls
        #[arg(long)]
        polls: Option<usize>,
    },

    /// Fetch the flow once and print its graph model as JSON
    Graph {
        #[command(flatten)]
        endpoint: EndpointArgs,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, default_value_t = false)]
        pretty: bool,
    },

    /// Fetch the flow once and print a job status table
    Status {
        #[command(flatten)]
        endpoint: EndpointArgs,
    },

    /// Write a configuration file filled with the defaults
    Init {
        /// Target file; the extension picks toml, json or yaml
        #[arg(short, long, default_value = "flowmap.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

/// Endpoint after merging flags over the configuration file.
struct Endpoint {
    url: String,
    server: String,
    flow: String,
}

impl EndpointArgs {
    fn resolve(&self, config: &Config) -> Result<Endpoint> {
        let server = self
            .server
            .clone()
            .or_else(|| config.status.server.clone())
            .context("No server configured; pass --server or set status.server")?;
        let flow = self
            .flow
            .clone()
            .or_else(|| config.status.flow.clone())
            .context("No flow configured; pass --flow or set status.flow")?;

        Ok(Endpoint {
            url: self.url.clone().unwrap_or_else(|| config.status.url.clone()),
            server,
            flow,
        })
    }
}

impl Endpoint {
    fn client(&self) -> Result<StatusClient> {
        StatusClient::new(&self.url, &self.server, &self.flow)
            .with_context(|| format!("Cannot poll flow {}", self.flow))
    }
}

impl Cli {
    async fn execute_watch(
        &self,
        config: &Config,
        endpoint: &EndpointArgs,
        overrides: WatchOverrides,
    ) -> Result<()> {
        let endpoint = endpoint.resolve(config)?;
        let client = endpoint.client()?;
        info!("Watching flow {} at {}", endpoint.flow, client.endpoint());

        let initial = client
            .fetch()
            .await
            .with_context(|| format!("Failed to fetch flow {}", endpoint.flow))?;

        let svg = overrides.svg.unwrap_or_else(|| config.output.svg.clone());
        let configured = config.viewport.viewport();
        let viewport = Viewport {
            width: overrides.width.unwrap_or(configured.width),
            height: overrides.height.unwrap_or(configured.height),
        };
        let program = overrides.dot.unwrap_or_else(|| config.layout.program.clone());
        let period = overrides
            .interval
            .map_or_else(|| config.status.poll_interval(), |secs| Duration::from_secs(secs.max(1)));
        let mode = overrides.poll_mode.unwrap_or(config.status.poll_mode);

        let progress = Rc::new(WatchProgress::start(
            &endpoint.flow,
            &svg.display().to_string(),
        ));
        let observer_progress = Rc::clone(&progress);

        let view = FlowView::new(
            GraphvizLayout::new(program),
            SvgSurface::new(svg, viewport),
            initial,
        )
        .with_options(config.layout.graph_options());
        let mut watcher = FlowWatcher::new(client, view)
            .with_period(period)
            .with_mode(mode)
            .with_observer(move |outcome| match outcome {
                PollOutcome::Redrawn(state) => observer_progress.redrawn(
                    state.snapshot.len(),
                    state.redraws,
                    state.last_redraw,
                ),
                PollOutcome::Unchanged => {}
                PollOutcome::Failed(reason) => observer_progress.failed(reason),
            });

        tokio::select! {
            () = watcher.run(overrides.polls) => {}
            _ = tokio::signal::ctrl_c() => info!("Interrupted"),
        }

        progress.finish();
        Ok(())
    }

    async fn execute_graph(
        &self,
        config: &Config,
        endpoint: &EndpointArgs,
        output: Option<&PathBuf>,
        pretty: bool,
    ) -> Result<()> {
        let endpoint = endpoint.resolve(config)?;
        info!("Building graph for flow: {}", endpoint.flow);

        let snapshot = endpoint.client()?.fetch().await?;
        let graph = build_graph_with(&snapshot, config.layout.graph_options());

        let json_output = if pretty || config.output.pretty {
            serde_json::to_string_pretty(&graph)?
        } else {
            serde_json::to_string(&graph)?
        };

        if let Some(output_path) = output {
            std::fs::write(output_path, json_output)?;
            info!("Graph written to: {}", output_path.display());
        } else {
            println!("{}", json_output);
        }

        Ok(())
    }

    async fn execute_status(&self, config: &Config, endpoint: &EndpointArgs) -> Result<()> {
        let endpoint = endpoint.resolve(config)?;
        let snapshot = endpoint.client()?.fetch().await?;
        print_status(&endpoint.flow, &snapshot);
        Ok(())
    }

    fn execute_init(&self, output: &Path, force: bool) -> Result<()> {
        if output.exists() && !force {
            bail!(
                "{} already exists; pass --force to overwrite it",
                output.display()
            );
        }

        Config::default().save(output)?;
        info!("Configuration written to: {}", output.display());
        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        if let Commands::Init { output, force } = &self.command {
            return self.execute_init(output, *force);
        }

        let config = Config::load(self.config.as_deref())?;

        match &self.command {
            Commands::Watch {
                endpoint,
                interval,
                poll_mode,
                svg,
                width,
                height,
                dot,
                polls,
            } => {
                let overrides = WatchOverrides {
                    interval: *interval,
                    poll_mode: *poll_mode,
                    svg: svg.clone(),
                    width: *width,
                    height: *height,
                    dot: dot.clone(),
                    polls: *polls,
                };
                self.execute_watch(&config, endpoint, overrides).await
            }
            Commands::Graph {
                endpoint,
                output,
                pretty,
            } => {
                self.execute_graph(&config, endpoint, output.as_ref(), *pretty)
                    .await
            }
            Commands::Status { endpoint } => self.execute_status(&config, endpoint).await,
            Commands::Init { output, force } => self.execute_init(output, *force),
        }
    }
}

/// `watch` flags that override configuration values.
struct WatchOverrides {
    interval: Option<u64>,
    poll_mode: Option<PollMode>,
    svg: Option<PathBuf>,
    width: Option<f64>,
    height: Option<f64>,
    dot: Option<PathBuf>,
    polls: Option<usize>,
}
