//! Show command implementation.
//!
//! `shelter show` prints the merged configuration of one environment,
//! with its directory and the files that contributed to it.

use crate::cli::args::ShowArgs;
use crate::config::Settings;
use crate::environment::EnvironmentCatalog;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

pub struct ShowCommand {
    settings: Settings,
    args: ShowArgs,
}

impl ShowCommand {
    pub fn new(settings: &Settings, args: ShowArgs) -> Self {
        Self {
            settings: settings.clone(),
            args,
        }
    }
}

impl Command for ShowCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let environment =
            EnvironmentCatalog::new(&self.settings).select_one(&self.args.filter.to_filter())?;
        ui.output(&serde_json::to_string_pretty(&environment.to_display_json())?);
        Ok(CommandResult::success())
    }
}
