//! pkgbump - release an npm package from a git branch
//!
//! The release workflow itself lives in [`pkgbump_release`]. This crate is the
//! command-line layer on top of it: argument parsing, log setup, the terminal
//! confirmation prompt and error rendering.

/// Argument parsing, exit codes and output rendering.
pub mod cli;
pub mod prompt;
pub mod tracing;
