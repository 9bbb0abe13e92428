/// Subcommands and their execution.
pub mod cli;

/// Application starting arguments and configuration.
pub mod config;

/// Walkthrough of every strategy and backend on a built-in sample document.
pub mod demo;

/// Error types.
pub mod error;

pub use ragprep_chunk as chunk;
pub use ragprep_embedders as embedders;
