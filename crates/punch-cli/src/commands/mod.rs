//! CLI subcommand implementations.

pub mod consolidate;
pub mod delete;
pub mod indicators;
pub mod list;
pub mod stats;
pub mod upload;
pub mod util;
