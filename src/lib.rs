pub mod config;
pub mod diagnostics;
pub mod fixture;
pub mod logging;
pub mod options;
pub mod watcher;
