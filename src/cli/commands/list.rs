//! List command implementation.
//!
//! The `shelter list` command lists environments matching the filters.

use serde_json::Value;

use crate::cli::args::ListArgs;
use crate::config::Settings;
use crate::environment::EnvironmentCatalog;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::display::environment_table;

/// The list command implementation.
pub struct ListCommand {
    settings: Settings,
    args: ListArgs,
}

impl ListCommand {
    pub fn new(settings: &Settings, args: ListArgs) -> Self {
        Self {
            settings: settings.clone(),
            args,
        }
    }
}

impl Command for ListCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let filter = self.args.filter.to_filter();
        let environments = EnvironmentCatalog::new(&self.settings).enumerate(&filter)?;

        if self.args.json {
            let list: Vec<Value> = environments.iter().map(|e| e.to_display_json()).collect();
            ui.output(&serde_json::to_string_pretty(&list)?);
            return Ok(CommandResult::success());
        }

        if environments.is_empty() {
            ui.message(&format!(
                "No environment matches {} in {}",
                filter.describe(),
                self.settings.base_directory.display()
            ));
            return Ok(CommandResult::success());
        }

        ui.show_table(&environment_table(&environments));
        Ok(CommandResult::success())
    }
}
