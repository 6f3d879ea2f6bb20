//! Subprocess execution and output parsing for platform tools.

pub mod executor;
pub mod parser;
