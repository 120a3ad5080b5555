//! Update command implementation.
//!
//! `shelter update` installs the newest compatible build of the image of
//! each selected environment.

use crate::cli::args::UpdateArgs;
use crate::config::Settings;
use crate::environment::EnvironmentCatalog;
use crate::error::Result;
use crate::fetch::{HttpSource, RemoteSource};
use crate::ui::UserInterface;
use crate::update::update_environment;

use super::dispatcher::{Command, CommandResult};
use super::display::show_update_report;

pub struct UpdateCommand {
    settings: Settings,
    args: UpdateArgs,
}

impl UpdateCommand {
    pub fn new(settings: &Settings, args: UpdateArgs) -> Self {
        Self {
            settings: settings.clone(),
            args,
        }
    }

    /// Update every selected environment through `source`.
    ///
    /// A failing environment does not stop the others.
    pub fn run(
        &self,
        ui: &mut dyn UserInterface,
        source: &dyn RemoteSource,
    ) -> Result<CommandResult> {
        let environments =
            EnvironmentCatalog::new(&self.settings).enumerate(&self.args.filter.to_filter())?;
        if environments.is_empty() {
            ui.message(&format!(
                "No environment matches {}",
                self.args.filter.to_filter().describe()
            ));
            return Ok(CommandResult::success());
        }

        let mut failures = 0;
        for mut env in environments {
            let name = env.name().to_string();
            ui.message(&format!("Updating {}", name));
            let label = env.config.image.clone().unwrap_or_else(|| name.clone());
            let mut progress = ui.download_progress(&label);

            match update_environment(
                &self.settings,
                source,
                &mut env,
                self.args.force,
                progress.as_mut(),
            ) {
                Ok(report) => show_update_report(ui, &name, &report),
                Err(e) => {
                    ui.error(&format!("{}: {}", name, e));
                    failures += 1;
                }
            }
        }

        if failures == 0 {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(1))
        }
    }
}

impl Command for UpdateCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let source = HttpSource::new()?;
        self.run(ui, &source)
    }
}
