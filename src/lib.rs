pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod graph;
pub mod layout;
pub mod model;
pub mod output;
pub mod render;
pub mod status;
pub mod viewport;
pub mod watcher;
