//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait and is routed by
//! [`CommandDispatcher`]. Commands that reach the network expose a `run`
//! method taking the [`RemoteSource`](crate::fetch::RemoteSource) to use.

pub mod check;
pub mod completions;
pub mod dispatcher;
pub mod display;
pub mod images;
pub mod list;
pub mod pull;
pub mod run;
pub mod setup;
pub mod show;
pub mod update;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
