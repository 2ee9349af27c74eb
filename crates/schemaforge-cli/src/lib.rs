//! schemaforge CLI library.
//!
//! This module exposes internal types for testing purposes.
//! The main entry point is the `schemaforge` binary.

pub mod cli;
pub mod config;
pub mod database;
pub mod input;
pub mod output;
pub mod plan;

// Re-export commonly used types
pub use cli::Args;
pub use plan::{apply_plan, build_plan, ApplyOptions, ApplyReport, Plan};
