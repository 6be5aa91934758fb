use chrono::{DateTime, Local};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright, bright_green, bright_red, bright_yellow, cyan, dim};

/// Status line shown while watching a flow
pub struct WatchProgress {
    pb: ProgressBar,
    flow: String,
}

impl WatchProgress {
    pub fn start(flow: &str, target: &str) -> Self {
        eprintln!("{}  {}", bright("👀"), bright("Watching").underlined());
        let pb = create_spinner(format!(
            "{} {} {}",
            bright_yellow(format!("Flow {flow}:")),
            dim("drawing to"),
            cyan(target)
        ));
        Self {
            pb,
            flow: flow.to_string(),
        }
    }

    pub fn redrawn(&self, jobs: usize, redraws: u64, at: Option<DateTime<Local>>) {
        let at = at.map_or_else(String::new, |at| at.format("%H:%M:%S").to_string());
        self.pb.set_message(format!(
            "{} {} {}",
            bright_green(format!("Flow {}: {jobs} jobs ✓", self.flow)),
            dim(format!("redraw #{redraws}")),
            dim(at)
        ));
    }

    pub fn failed(&self, reason: &str) {
        self.pb.set_message(format!(
            "{} {}",
            bright_red(format!("Flow {}: poll failed", self.flow)),
            dim(reason)
        ));
    }

    pub fn finish(&self) {
        self.pb.finish_with_message(
            bright_green(format!("Flow {}: stopped watching", self.flow)).to_string(),
        );
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner}")
            .unwrap(),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
