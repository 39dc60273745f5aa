//! CLI command handling module
//!
//! Handles all CLI subcommands and argument parsing.

mod commands;
mod version;

pub use commands::{Command, handle_command, parse_resource_ref};
pub use version::display_version;
