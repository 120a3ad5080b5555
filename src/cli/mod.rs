//! Command-line interface for Shelter.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{
    CheckArgs, Cli, Commands, CompletionsArgs, FilterArgs, ImagesArgs, ListArgs, PullArgs,
    RunArgs, SetupArgs, ShowArgs, UpdateArgs,
};
pub use commands::{Command, CommandDispatcher, CommandResult};
