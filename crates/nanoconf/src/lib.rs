//! nanoconf command-line toolchain
//!
//! Each subcommand lives in its own module with an `Args` struct and a `run`
//! entry point; `cli` ties them together.

pub mod check;
pub mod cli;
pub mod diff;
pub mod estimate;
pub mod format;
pub mod preset;
pub mod resolve;
pub mod schedule;
