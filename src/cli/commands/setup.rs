//! Setup command implementation.
//!
//! `shelter setup <name>` creates a new environment directory in the base
//! directory.

use crate::cli::args::SetupArgs;
use crate::config::Settings;
use crate::environment::{create_environment, SetupRequest};
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

pub struct SetupCommand {
    settings: Settings,
    args: SetupArgs,
}

impl SetupCommand {
    pub fn new(settings: &Settings, args: SetupArgs) -> Self {
        Self {
            settings: settings.clone(),
            args,
        }
    }

    fn request(&self) -> Result<SetupRequest> {
        let args = &self.args;
        let mut request = SetupRequest::new(&args.name, args.container_type.parse()?);
        request.kind = args.kind.parse()?;
        request.distro = args.distro.clone();
        request.branch = args.branch.clone();
        request.system = args.system.clone();
        request.image = args.image.clone();
        request.template = args.template.clone();
        request.directory = args.directory.clone();
        request.force = args.force;
        Ok(request)
    }
}

impl Command for SetupCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let environment = create_environment(&self.settings, &self.request()?)?;

        ui.success(&format!(
            "Created environment {} in {}",
            environment.name(),
            environment.directory.display()
        ));
        if environment.config.image.is_none() {
            ui.message("No image configured; set \"image\" in the descriptor and run `shelter update`");
        }
        Ok(CommandResult::success())
    }
}
