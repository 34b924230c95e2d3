//! cascade CLI library
//!
//! Exposes the CLI entry point so wrappers can bundle the binary.

mod cli;

pub use cli::run;
