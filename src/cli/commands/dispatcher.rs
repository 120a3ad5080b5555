//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use crate::cli::args::{Cli, Commands};
use crate::config::Settings;
use crate::error::Result;
use crate::ui::UserInterface;

/// Trait for command implementations.
pub trait Command {
    /// Execute the command.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }

    /// Result carrying a child process exit code.
    pub fn from_exit_code(exit_code: i32) -> Self {
        if exit_code == 0 {
            Self::success()
        } else {
            Self::failure(exit_code)
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    settings: Settings,
}

impl CommandDispatcher {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Dispatch and execute a command.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = &self.settings;
        match &cli.command {
            Commands::List(args) => super::list::ListCommand::new(settings, args.clone()).execute(ui),
            Commands::Show(args) => super::show::ShowCommand::new(settings, args.clone()).execute(ui),
            Commands::Images(args) => {
                super::images::ImagesCommand::new(settings, args.clone()).execute(ui)
            }
            Commands::Check(args) => {
                super::check::CheckCommand::new(settings, args.clone()).execute(ui)
            }
            Commands::Update(args) => {
                super::update::UpdateCommand::new(settings, args.clone()).execute(ui)
            }
            Commands::Pull(args) => super::pull::PullCommand::new(settings, args.clone()).execute(ui),
            Commands::Setup(args) => {
                super::setup::SetupCommand::new(settings, args.clone()).execute(ui)
            }
            Commands::Run(args) => super::run::RunCommand::new(settings, args.clone()).execute(ui),
            Commands::Completions(args) => {
                super::completions::CompletionsCommand::new(args.clone()).execute(ui)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn command_result_success() {
        let result = CommandResult::success();
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn command_result_failure() {
        let result = CommandResult::failure(1);
        assert!(!result.success);
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn child_exit_code_is_kept() {
        assert_eq!(CommandResult::from_exit_code(0), CommandResult::success());
        assert_eq!(CommandResult::from_exit_code(3).exit_code, 3);
    }

    #[test]
    fn dispatches_to_list() {
        let temp = TempDir::new().unwrap();
        let dispatcher = CommandDispatcher::new(Settings::new(temp.path()));
        let cli = Cli::try_parse_from(["shelter", "list"]).unwrap();
        let mut ui = MockUI::new();

        let result = dispatcher.dispatch(&cli, &mut ui).unwrap();

        assert!(result.success);
        assert!(ui.has_text("No environment"));
    }
}
