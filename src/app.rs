//! CLI definitions and logging setup for the platform utility.

pub mod cli;
pub mod logging;
