//! Pull command implementation.
//!
//! `shelter pull <pattern>` downloads the one published image whose name
//! matches the pattern into the base directory.

use crate::cli::args::PullArgs;
use crate::config::Settings;
use crate::container::ContainerType;
use crate::error::Result;
use crate::fetch::{HttpSource, RemoteSource};
use crate::ui::UserInterface;
use crate::update::download_image;

use super::dispatcher::{Command, CommandResult};

pub struct PullCommand {
    settings: Settings,
    args: PullArgs,
}

impl PullCommand {
    pub fn new(settings: &Settings, args: PullArgs) -> Self {
        Self {
            settings: settings.clone(),
            args,
        }
    }

    pub fn run(&self, ui: &mut dyn UserInterface, source: &dyn RemoteSource) -> Result<CommandResult> {
        let container_type: ContainerType = self.args.container_type.parse()?;
        let mut progress = ui.download_progress(&self.args.pattern);

        let (path, outcome) = download_image(
            &self.settings,
            source,
            container_type,
            &self.args.pattern,
            self.args.force,
            progress.as_mut(),
        )?;

        if outcome.updated {
            ui.success(&format!("Downloaded {}", path.display()));
        } else {
            ui.success(&format!("{} is up to date", path.display()));
        }
        Ok(CommandResult::success())
    }
}

impl Command for PullCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let source = HttpSource::new()?;
        self.run(ui, &source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShelterError;
    use crate::fetch::RemoteBody;
    use crate::ui::MockUI;
    use anyhow::bail;
    use tempfile::TempDir;

    struct Listing;

    impl RemoteSource for Listing {
        fn list(&self, _url: &str) -> anyhow::Result<Vec<String>> {
            Ok(vec!["casa-dev-5.0.sif.json".to_string()])
        }
        fn fetch_text(&self, url: &str) -> anyhow::Result<String> {
            bail!("not served: {}", url)
        }
        fn open(&self, url: &str, _offset: u64) -> anyhow::Result<RemoteBody> {
            bail!("not served: {}", url)
        }
    }

    fn args(pattern: &str) -> PullArgs {
        PullArgs {
            pattern: pattern.to_string(),
            container_type: "singularity".to_string(),
            force: false,
        }
    }

    #[test]
    fn unknown_image_is_reported() {
        let temp = TempDir::new().unwrap();
        let result = PullCommand::new(&Settings::new(temp.path()), args("casa-run-*"))
            .run(&mut MockUI::new(), &Listing);
        assert!(matches!(result, Err(ShelterError::NoMatch { .. })));
    }

    #[test]
    fn metadata_failure_is_a_transfer_error() {
        let temp = TempDir::new().unwrap();
        let result = PullCommand::new(&Settings::new(temp.path()), args("casa-dev-*"))
            .run(&mut MockUI::new(), &Listing);
        assert!(matches!(result, Err(ShelterError::Transfer { .. })));
    }
}
