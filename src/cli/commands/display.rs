//! Shared display helpers.
//!
//! Used by `check`, `update` and `images` to render image state the same
//! way everywhere.

use crate::environment::Environment;
use crate::image::{format_size, LocalImage};
use crate::ui::{Table, UserInterface};
use crate::update::{ImageStatus, UpdateReport};

/// Print the state of an environment's installed image.
///
/// Returns whether the environment is usable.
pub fn show_image_status(ui: &mut dyn UserInterface, name: &str, status: &ImageStatus) -> bool {
    match status {
        ImageStatus::NotConfigured => {
            ui.warning(&format!("{}: no image configured", name));
            false
        }
        ImageStatus::Missing { path } => {
            ui.error(&format!("{}: image {} is not installed", name, path.display()));
            false
        }
        ImageStatus::Usable { image, binding } => {
            ui.success(&format!(
                "{}: {} ({:?})",
                name,
                image.file_name(),
                binding
            ));
            true
        }
    }
}

/// Print the outcome of an update.
pub fn show_update_report(ui: &mut dyn UserInterface, name: &str, report: &UpdateReport) {
    match report {
        UpdateReport::NoCandidate => {
            ui.warning(&format!("{}: no compatible update available", name))
        }
        UpdateReport::UpToDate { image } => {
            ui.success(&format!("{}: {} is up to date", name, image.display()))
        }
        UpdateReport::Updated {
            image,
            metadata,
            outcome,
        } => {
            let mut line = format!("{}: installed {}", name, image.display());
            let summary = metadata.summary();
            if !summary.is_empty() {
                line.push_str(&format!(" ({})", summary));
            }
            if outcome.resumed_from > 0 {
                line.push_str(&format!(", resumed at {}", format_size(outcome.resumed_from)));
            }
            ui.success(&line);
        }
    }
}

/// Table of environments.
pub fn environment_table(environments: &[Environment]) -> Table {
    let mut table = Table::new(&["NAME", "TYPE", "BRANCH", "SYSTEM", "CONTAINER", "IMAGE", "DIRECTORY"]);
    for env in environments {
        let field = |f: &str| env.field(f).unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            env.name().to_string(),
            field("type"),
            field("branch"),
            field("system"),
            field("container_type"),
            field("image"),
            env.directory.display().to_string(),
        ]);
    }
    table
}

/// Table of installed images.
pub fn image_table(images: &[LocalImage]) -> Table {
    let mut table = Table::new(&["IMAGE", "VERSION", "ID", "BUILD", "CREATED", "SIZE"]);
    for image in images {
        let meta = &image.metadata;
        table.add_row(vec![
            image.file_name(),
            meta.image_version.clone().unwrap_or_else(|| "-".to_string()),
            meta.image_id.clone().unwrap_or_else(|| "-".to_string()),
            meta.build_number.to_string(),
            meta.created_at()
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string()),
            meta.size.map(format_size).unwrap_or_else(|| "-".to_string()),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindingMatch;
    use crate::image::{ImageMetadata, SyncOutcome};
    use crate::ui::MockUI;
    use std::path::PathBuf;

    #[test]
    fn status_uses_matching_ui_method() {
        let mut ui = MockUI::new();

        assert!(!show_image_status(&mut ui, "a", &ImageStatus::NotConfigured));
        assert!(!show_image_status(
            &mut ui,
            "b",
            &ImageStatus::Missing {
                path: PathBuf::from("/base/x.sif")
            }
        ));
        assert!(show_image_status(
            &mut ui,
            "c",
            &ImageStatus::Usable {
                image: LocalImage {
                    path: PathBuf::from("/base/casa-dev-5.0.sif"),
                    metadata: ImageMetadata::default(),
                },
                binding: BindingMatch::Exact,
            }
        ));

        assert_eq!(ui.warnings(), ["a: no image configured"]);
        assert_eq!(ui.errors(), ["b: image /base/x.sif is not installed"]);
        assert_eq!(ui.successes(), ["c: casa-dev-5.0.sif (Exact)"]);
    }

    #[test]
    fn update_report_mentions_resume() {
        let mut ui = MockUI::new();
        show_update_report(
            &mut ui,
            "dev",
            &UpdateReport::Updated {
                image: PathBuf::from("/base/casa-dev-5.0.sif"),
                metadata: ImageMetadata {
                    image_version: Some("5.0".to_string()),
                    ..Default::default()
                },
                outcome: SyncOutcome {
                    updated: true,
                    resumed_from: 2048,
                    transferred: 10,
                },
            },
        );
        assert_eq!(
            ui.successes(),
            ["dev: installed /base/casa-dev-5.0.sif (version 5.0), resumed at 2.0 KiB"]
        );

        show_update_report(&mut ui, "run", &UpdateReport::NoCandidate);
        assert_eq!(ui.warnings(), ["run: no compatible update available"]);
    }
}
