//! Command-line interface.

mod parser;

pub use parser::{Cli, Commands};
