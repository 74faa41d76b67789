//! # CLI Behavior
//!
//! One client of the contentkit library. This is the only place that knows
//! about terminal I/O, exit codes and output formatting.
//!
//! ## Module Structure
//!
//! - `setup`: Argument parsing via clap
//! - `commands`: Context setup and per-command handlers
//! - `print`: Colored terminal output

mod commands;
mod print;
pub mod setup;

pub use commands::run;
