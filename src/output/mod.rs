mod progress;
mod styling;
mod summary;
mod tables;

pub use progress::WatchProgress;
pub use styling::{dim, magenta_bold};
pub use summary::print_status;

/// Prints the `flowmap` banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🗺  flowmap"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Live build flow status graph")
    );
}
