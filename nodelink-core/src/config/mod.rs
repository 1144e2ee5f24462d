//! Configuration
//!
//! Node configuration types and the parser for the embedded `node.toml`.

pub mod parse;
pub mod types;

pub use parse::{parse_config, ParseError};
pub use types::*;
