//! Bringing environments' images up to date.
//!
//! An update looks up the builds published for the environment's image,
//! picks the newest acceptable one, installs it and records the new
//! binding in the environment's instance config.

use std::path::{Path, PathBuf};

use crate::binding::BindingMatch;
use crate::config::Settings;
use crate::container::{backend_for_environment, backend_of, ContainerBackend, ContainerType};
use crate::environment::{Environment, ImageBinding};
use crate::error::{Result, ShelterError};
use crate::fetch::RemoteSource;
use crate::image::{
    negotiate, Candidate, ImageMetadata, LocalImage, ProgressSink, RemoteCatalog, SyncOutcome,
};

/// Result of updating one environment.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateReport {
    /// No published build qualifies; the installed image is kept.
    NoCandidate,
    /// The installed image already is the selected build.
    UpToDate { image: PathBuf },
    /// A new build was installed.
    Updated {
        image: PathBuf,
        metadata: ImageMetadata,
        outcome: SyncOutcome,
    },
}

/// State of an environment's installed image.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageStatus {
    /// The descriptor names no image.
    NotConfigured,
    /// The image is not installed, or its metadata is unreadable.
    Missing { path: PathBuf },
    /// The image is installed and can serve the environment.
    Usable {
        image: LocalImage,
        binding: BindingMatch,
    },
}

fn image_reference(environment: &Environment) -> Result<&str> {
    environment
        .config
        .image
        .as_deref()
        .ok_or_else(|| ShelterError::ConfigValidationError {
            message: format!("environment '{}' does not name an image", environment.name()),
        })
}

/// Base name under which builds of `artifact` are published.
///
/// `casa-dev-5.0.sif` is published as `casa-dev-5.0[-N].sif`.
pub fn remote_base_name(artifact: &Path, extension: &str) -> String {
    let file_name = artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.strip_suffix(&format!(".{}", extension)) {
        Some(base) => base.to_string(),
        None => artifact
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(file_name),
    }
}

/// Check the installed image of `environment`.
///
/// # Errors
///
/// Returns `Incompatible` when the installed image cannot serve the
/// environment.
pub fn check_environment(settings: &Settings, environment: &Environment) -> Result<ImageStatus> {
    let Some(image) = environment.config.image.as_deref() else {
        return Ok(ImageStatus::NotConfigured);
    };
    let backend = backend_for_environment(environment)?;
    let path = settings.image_path(image);

    match LocalImage::load(&path) {
        Some(image) => {
            let binding = backend.check_binding(environment, &image.metadata)?;
            Ok(ImageStatus::Usable { image, binding })
        }
        None => Ok(ImageStatus::Missing { path }),
    }
}

/// Install the newest acceptable build of `environment`'s image.
///
/// Builds are looked up under the configured download URL. When the
/// environment pins an `image_version`, only builds of that version are
/// considered. A listing failure is reported as [`UpdateReport::NoCandidate`].
///
/// # Errors
///
/// Returns `Incompatible` when the selected build cannot serve the
/// environment (nothing is transferred), and transfer errors from the
/// synchronization.
pub fn update_environment(
    settings: &Settings,
    source: &dyn RemoteSource,
    environment: &mut Environment,
    force: bool,
    progress: &mut dyn ProgressSink,
) -> Result<UpdateReport> {
    let backend = backend_for_environment(environment)?;
    let reference = image_reference(environment)?.to_string();
    let path = settings.image_path(&reference);
    let extension = backend.image_extension();
    let base = remote_base_name(&path, extension);
    let url = settings.download_url_for(backend.container_type().as_str());

    let candidates = match RemoteCatalog::new(source, url.as_str()).candidates(&base, extension) {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::warn!("Cannot list builds of {}: {}", base, e);
            return Ok(UpdateReport::NoCandidate);
        }
    };

    let pinned = environment.config.image_version.clone();
    let Some(candidate) = negotiate(source, &candidates, pinned.as_deref())? else {
        tracing::info!("No build of {}.{} qualifies at {}", base, extension, url);
        return Ok(UpdateReport::NoCandidate);
    };

    backend.check_binding(environment, &candidate.metadata)?;
    let outcome = backend.sync(source, &candidate, &path, force, progress)?;

    let installed = ImageMetadata::load_for(&path)?;
    backend.check_binding(environment, &installed)?;

    let binding = ImageBinding {
        image: reference,
        image_id: installed.image_id.clone(),
        image_version: installed.image_version.clone(),
    };
    if needs_rebind(environment, &binding) {
        environment.rebind(&binding)?;
    }

    if outcome.updated {
        Ok(UpdateReport::Updated {
            image: path,
            metadata: installed,
            outcome,
        })
    } else {
        Ok(UpdateReport::UpToDate { image: path })
    }
}

fn needs_rebind(environment: &Environment, binding: &ImageBinding) -> bool {
    let config = &environment.config;
    config.image.as_deref() != Some(binding.image.as_str())
        || (binding.image_id.is_some() && config.image_id != binding.image_id)
        || (binding.image_version.is_some() && config.image_version != binding.image_version)
}

/// Download the single published image matching `pattern` into the base
/// directory.
///
/// # Errors
///
/// Returns `NoMatch` or `Ambiguous` unless exactly one artifact matches.
pub fn download_image(
    settings: &Settings,
    source: &dyn RemoteSource,
    container_type: ContainerType,
    pattern: &str,
    force: bool,
    progress: &mut dyn ProgressSink,
) -> Result<(PathBuf, SyncOutcome)> {
    let backend: Box<dyn ContainerBackend> = backend_of(container_type);
    let url = settings.download_url_for(container_type.as_str());

    let mut artifacts = RemoteCatalog::new(source, url.as_str())
        .artifacts(backend.image_extension(), Some(pattern))?;
    let artifact = match artifacts.len() {
        0 => {
            return Err(ShelterError::NoMatch {
                what: "published image".to_string(),
                filter: pattern.to_string(),
            })
        }
        1 => artifacts.remove(0),
        _ => {
            return Err(ShelterError::Ambiguous {
                what: "published images".to_string(),
                matches: artifacts.into_iter().map(|a| a.name).collect(),
            })
        }
    };

    let content = source
        .fetch_text(&artifact.metadata_url)
        .map_err(|e| ShelterError::Transfer {
            url: artifact.metadata_url.clone(),
            message: format!("{:#}", e),
        })?;
    let candidate = Candidate {
        suffix: 0,
        metadata: ImageMetadata::parse(&content, Path::new(&artifact.metadata_url))?,
        metadata_url: artifact.metadata_url,
    };

    let path = settings.base_directory.join(&artifact.name);
    let outcome = backend.sync(source, &candidate, &path, force, progress)?;
    Ok((path, outcome))
}
