//! Command-line interface for serpwatch.

mod commands;

pub use commands::{is_verbose, run};
