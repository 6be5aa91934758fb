use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::graph::{GraphOptions, LabelType, RankDir};
use crate::viewport::Viewport;
use crate::watcher::PollMode;

/// Configuration file structure for flowmap.
///
/// Holds the status endpoint to watch, the layout program and the output target so a
/// watch can be started without repeating flags. Command line flags override it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Status endpoint settings
    #[serde(default)]
    pub status: StatusConfig,

    /// Layout engine settings
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Drawing area
    #[serde(default)]
    pub viewport: ViewportConfig,

    /// Output preferences
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StatusConfig {
    /// Root URL of the status service
    #[serde(default = "default_status_url")]
    pub url: String,

    /// CI server name as known to the status service
    pub server: Option<String>,

    /// Flow to watch
    pub flow: Option<String>,

    /// Seconds between polls
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Behaviour when a poll is due while the previous fetch is still running
    #[serde(default)]
    pub poll_mode: PollMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LayoutConfig {
    /// Graphviz executable used for layout
    #[serde(default = "default_layout_program")]
    pub program: PathBuf,

    /// Rank direction (TB, BT, LR or RL)
    #[serde(default)]
    pub rankdir: RankDir,

    /// Node labels: "html" or "text"
    #[serde(default)]
    pub labels: LabelType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ViewportConfig {
    #[serde(default = "default_viewport_width")]
    pub width: f64,

    #[serde(default = "default_viewport_height")]
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// SVG file rewritten on every redraw
    #[serde(default = "default_svg_path")]
    pub svg: PathBuf,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            url: default_status_url(),
            server: None,
            flow: None,
            poll_interval_secs: default_poll_interval_secs(),
            poll_mode: PollMode::default(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            program: default_layout_program(),
            rankdir: RankDir::default(),
            labels: LabelType::default(),
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: default_viewport_width(),
            height: default_viewport_height(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            svg: default_svg_path(),
            pretty: false,
        }
    }
}

fn default_status_url() -> String {
    "http://localhost:5000/".to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_layout_program() -> PathBuf {
    PathBuf::from("dot")
}

fn default_viewport_width() -> f64 {
    1280.0
}

fn default_viewport_height() -> f64 {
    800.0
}

fn default_svg_path() -> PathBuf {
    PathBuf::from("flowmap.svg")
}

impl StatusConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

impl LayoutConfig {
    pub fn graph_options(&self) -> GraphOptions {
        GraphOptions {
            rankdir: self.rankdir,
            labels: self.labels,
            ..GraphOptions::default()
        }
    }
}

impl ViewportConfig {
    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.width,
            height: self.height,
        }
    }
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./flowmap.toml
    /// 3. ./flowmap.json
    /// 4. ./flowmap.yaml
    /// 5. ./flowmap.yml
    /// 6. `<user config dir>/flowmap/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            if !path.exists() {
                log::warn!("Config file {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            return Self::load_from_path(path);
        }

        let candidates = ["flowmap.toml", "flowmap.json", "flowmap.yaml", "flowmap.yml"];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        if let Some(path) = dirs::config_dir().map(|dir| dir.join("flowmap").join("config.toml")) {
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        log::debug!("Loading config from {}", path.display());
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("yaml") | Some("yml") => serde_yaml::to_string(self)?,
            _ => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}
