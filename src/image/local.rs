//! Images installed in the base directory.

use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::metadata::ImageMetadata;
use crate::error::{Result, ShelterError};

/// An installed image with valid metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalImage {
    pub path: PathBuf,
    pub metadata: ImageMetadata,
}

impl LocalImage {
    /// Load the image at `path` with its sidecar.
    ///
    /// Returns `None` when the artifact or its sidecar is missing, or when
    /// the sidecar cannot be parsed.
    pub fn load(path: &Path) -> Option<Self> {
        if !path.is_file() {
            return None;
        }
        match ImageMetadata::load_for(path) {
            Ok(metadata) => Some(Self {
                path: path.to_path_buf(),
                metadata,
            }),
            Err(e) => {
                tracing::debug!("Ignoring image {}: {}", path.display(), e);
                None
            }
        }
    }

    /// File name of the artifact.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Installed images of one directory.
#[derive(Debug, Clone)]
pub struct LocalImageCatalog {
    directory: PathBuf,
}

impl LocalImageCatalog {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Every valid image, ordered by file name.
    ///
    /// Hidden files (temporary downloads included) and `.json` files are
    /// skipped, as are artifacts without a readable sidecar.
    pub fn scan(&self) -> Result<Vec<LocalImage>> {
        if !self.directory.is_dir() {
            return Ok(Vec::new());
        }

        let mut images = Vec::new();
        for entry in WalkDir::new(&self.directory)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| ShelterError::Other(e.into()))?;
            let name = entry.file_name().to_string_lossy();
            if !entry.file_type().is_file() || name.starts_with('.') || name.ends_with(".json") {
                continue;
            }
            if let Some(image) = LocalImage::load(entry.path()) {
                images.push(image);
            }
        }
        Ok(images)
    }

    /// The image at `path`, if installed and valid.
    pub fn get(&self, path: &Path) -> Option<LocalImage> {
        LocalImage::load(path)
    }

    /// Images whose file name matches the glob `pattern`.
    pub fn find(&self, pattern: &str) -> Result<Vec<LocalImage>> {
        let pattern = compile(pattern)?;
        Ok(self
            .scan()?
            .into_iter()
            .filter(|image| pattern.matches(&image.file_name()))
            .collect())
    }

    /// The single image matching `pattern`.
    pub fn select_one(&self, pattern: &str) -> Result<LocalImage> {
        let mut found = self.find(pattern)?;
        match found.len() {
            0 => Err(ShelterError::NoMatch {
                what: "image".to_string(),
                filter: pattern.to_string(),
            }),
            1 => Ok(found.remove(0)),
            _ => Err(ShelterError::Ambiguous {
                what: "images".to_string(),
                matches: found.iter().map(LocalImage::file_name).collect(),
            }),
        }
    }
}

pub(crate) fn compile(pattern: &str) -> Result<Pattern> {
    Pattern::new(pattern).map_err(|e| ShelterError::ConfigValidationError {
        message: format!("Invalid pattern '{}': {}", pattern, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn install(dir: &Path, name: &str, sidecar: Option<&str>) {
        fs::write(dir.join(name), "payload").unwrap();
        if let Some(json) = sidecar {
            fs::write(dir.join(format!("{}.json", name)), json).unwrap();
        }
    }

    fn catalog() -> (TempDir, LocalImageCatalog) {
        let temp = TempDir::new().unwrap();
        install(temp.path(), "casa-dev-5.0.sif", Some(r#"{"image_id": "A"}"#));
        install(temp.path(), "casa-run-5.0.sif", Some(r#"{"image_id": "B"}"#));
        install(temp.path(), "broken.sif", Some("{not json"));
        install(temp.path(), "orphan.sif", None);
        install(temp.path(), ".casa-dev-5.1.sif.part", None);
        fs::create_dir(temp.path().join("dev")).unwrap();
        let catalog = LocalImageCatalog::new(temp.path());
        (temp, catalog)
    }

    #[test]
    fn scan_keeps_only_images_with_valid_sidecars() {
        let (_temp, catalog) = catalog();
        let names: Vec<String> = catalog.scan().unwrap().iter().map(LocalImage::file_name).collect();
        assert_eq!(names, vec!["casa-dev-5.0.sif", "casa-run-5.0.sif"]);
    }

    #[test]
    fn missing_directory_is_empty() {
        let temp = TempDir::new().unwrap();
        let catalog = LocalImageCatalog::new(temp.path().join("none"));
        assert!(catalog.scan().unwrap().is_empty());
    }

    #[test]
    fn get_by_path() {
        let (temp, catalog) = catalog();
        let image = catalog.get(&temp.path().join("casa-dev-5.0.sif")).unwrap();
        assert_eq!(image.metadata.image_id.as_deref(), Some("A"));
        assert!(catalog.get(&temp.path().join("orphan.sif")).is_none());
    }

    #[test]
    fn select_one_reports_ambiguity_and_absence() {
        let (_temp, catalog) = catalog();

        let image = catalog.select_one("casa-run-*").unwrap();
        assert_eq!(image.file_name(), "casa-run-5.0.sif");

        match catalog.select_one("casa-*") {
            Err(ShelterError::Ambiguous { matches, .. }) => assert_eq!(matches.len(), 2),
            other => panic!("expected ambiguity, got {:?}", other),
        }
        assert!(matches!(
            catalog.select_one("*.vdi"),
            Err(ShelterError::NoMatch { .. })
        ));
    }
}
