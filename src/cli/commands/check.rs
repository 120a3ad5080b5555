//! Check command implementation.
//!
//! `shelter check` verifies that each selected environment has its image
//! installed and that the image can serve it.

use crate::cli::args::CheckArgs;
use crate::config::Settings;
use crate::environment::EnvironmentCatalog;
use crate::error::Result;
use crate::ui::UserInterface;
use crate::update::check_environment;

use super::dispatcher::{Command, CommandResult};
use super::display::show_image_status;

pub struct CheckCommand {
    settings: Settings,
    args: CheckArgs,
}

impl CheckCommand {
    pub fn new(settings: &Settings, args: CheckArgs) -> Self {
        Self {
            settings: settings.clone(),
            args,
        }
    }
}

impl Command for CheckCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let environments =
            EnvironmentCatalog::new(&self.settings).enumerate(&self.args.filter.to_filter())?;

        let mut failures = 0;
        for env in &environments {
            match check_environment(&self.settings, env) {
                Ok(status) => {
                    if !show_image_status(ui, env.name(), &status) {
                        failures += 1;
                    }
                }
                Err(e) => {
                    ui.error(&format!("{}: {}", env.name(), e));
                    failures += 1;
                }
            }
        }

        if failures == 0 {
            Ok(CommandResult::success())
        } else {
            tracing::debug!("{} of {} environment(s) failed", failures, environments.len());
            Ok(CommandResult::failure(1))
        }
    }
}
