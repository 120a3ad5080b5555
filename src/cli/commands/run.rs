//! Run command implementation.
//!
//! `shelter run -n <name> -- <command>` runs a command inside the
//! environment's container after checking its image.

use crate::cli::args::RunArgs;
use crate::config::Settings;
use crate::container::backend_for_environment;
use crate::environment::EnvironmentCatalog;
use crate::error::{Result, ShelterError};
use crate::ui::UserInterface;
use crate::update::{check_environment, ImageStatus};

use super::dispatcher::{Command, CommandResult};

pub struct RunCommand {
    settings: Settings,
    args: RunArgs,
}

impl RunCommand {
    pub fn new(settings: &Settings, args: RunArgs) -> Self {
        Self {
            settings: settings.clone(),
            args,
        }
    }
}

impl Command for RunCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let environment =
            EnvironmentCatalog::new(&self.settings).select_one(&self.args.filter.to_filter())?;
        let backend = backend_for_environment(&environment)?;

        let image = match check_environment(&self.settings, &environment)? {
            ImageStatus::Usable { image, .. } => image,
            ImageStatus::NotConfigured => {
                return Err(ShelterError::Launch {
                    environment: environment.name().to_string(),
                    message: "no image configured".to_string(),
                })
            }
            ImageStatus::Missing { path } => {
                return Err(ShelterError::Launch {
                    environment: environment.name().to_string(),
                    message: format!(
                        "image {} is not installed, run `shelter update`",
                        path.display()
                    ),
                })
            }
        };

        if ui.output_mode().shows_details() {
            ui.message(&format!(
                "Running in {} with {}",
                environment.name(),
                image.path.display()
            ));
        }

        let code = backend
            .launcher()
            .launch(&environment, &image.path, &self.args.command)?;
        Ok(CommandResult::from_exit_code(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::FilterArgs;
    use crate::config::{CONF_DIR, DESCRIPTOR_FILE};
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_image_cannot_run() {
        let temp = TempDir::new().unwrap();
        let conf = temp.path().join("dev").join(CONF_DIR);
        fs::create_dir_all(&conf).unwrap();
        fs::write(
            conf.join(DESCRIPTOR_FILE),
            r#"{"name": "dev", "image": "casa-dev-5.0.sif"}"#,
        )
        .unwrap();

        let result = RunCommand::new(
            &Settings::new(temp.path()),
            RunArgs {
                filter: FilterArgs::named("dev"),
                command: vec!["true".to_string()],
            },
        )
        .execute(&mut MockUI::new());

        match result {
            Err(ShelterError::Launch { message, .. }) => assert!(message.contains("not installed")),
            other => panic!("expected launch error, got {:?}", other),
        }
    }
}
