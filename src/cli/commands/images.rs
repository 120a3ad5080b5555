//! Images command implementation.
//!
//! `shelter images` lists installed images; with `--remote` it lists the
//! images published at the download URL instead.

use serde_json::{json, Value};

use crate::cli::args::ImagesArgs;
use crate::config::Settings;
use crate::container::ContainerType;
use crate::error::Result;
use crate::fetch::{HttpSource, RemoteSource};
use crate::image::{LocalImageCatalog, RemoteCatalog};
use crate::ui::{Table, UserInterface};

use super::dispatcher::{Command, CommandResult};
use super::display::image_table;

pub struct ImagesCommand {
    settings: Settings,
    args: ImagesArgs,
}

impl ImagesCommand {
    pub fn new(settings: &Settings, args: ImagesArgs) -> Self {
        Self {
            settings: settings.clone(),
            args,
        }
    }

    fn list_local(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let catalog = LocalImageCatalog::new(&self.settings.base_directory);
        let images = match &self.args.pattern {
            Some(pattern) => catalog.find(pattern)?,
            None => catalog.scan()?,
        };

        if self.args.json {
            let list: Vec<Value> = images
                .iter()
                .map(|image| {
                    json!({
                        "path": image.path.display().to_string(),
                        "metadata": image.metadata,
                    })
                })
                .collect();
            ui.output(&serde_json::to_string_pretty(&list)?);
        } else if images.is_empty() {
            ui.message(&format!(
                "No image installed in {}",
                catalog.directory().display()
            ));
        } else {
            ui.show_table(&image_table(&images));
        }
        Ok(CommandResult::success())
    }

    /// List published images through `source`.
    pub fn list_remote(
        &self,
        ui: &mut dyn UserInterface,
        source: &dyn RemoteSource,
    ) -> Result<CommandResult> {
        let container_type: ContainerType = self.args.container_type.parse()?;
        let url = self.settings.download_url_for(container_type.as_str());
        let artifacts = RemoteCatalog::new(source, url.as_str())
            .artifacts(container_type.image_extension(), self.args.pattern.as_deref())?;

        if self.args.json {
            let list: Vec<Value> = artifacts
                .iter()
                .map(|a| json!({"name": a.name, "url": a.url, "metadata_url": a.metadata_url}))
                .collect();
            ui.output(&serde_json::to_string_pretty(&list)?);
        } else if artifacts.is_empty() {
            ui.message(&format!("No image published at {}", url));
        } else {
            let mut table = Table::new(&["IMAGE", "URL"]);
            for artifact in artifacts {
                table.add_row(vec![artifact.name, artifact.url]);
            }
            ui.show_table(&table);
        }
        Ok(CommandResult::success())
    }
}

impl Command for ImagesCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        if self.args.remote {
            let source = HttpSource::new()?;
            self.list_remote(ui, &source)
        } else {
            self.list_local(ui)
        }
    }
}
