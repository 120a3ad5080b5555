//! Container technologies.
//!
//! Each supported technology is a [`ContainerBackend`], chosen once from
//! an environment's `container_type` with [`backend_for`]. Back-ends share
//! the transfer and binding rules and differ in image format and launch.

pub mod launch;

pub use launch::{Launcher, SingularityLauncher, VirtualBoxLauncher, SINGULARITY_ENV_PREFIX};

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::binding::{check_binding, BindingMatch};
use crate::environment::Environment;
use crate::error::{Result, ShelterError};
use crate::fetch::RemoteSource;
use crate::image::{Candidate, ImageMetadata, ProgressSink, SyncOutcome, Synchronizer};

/// Container type assumed when a descriptor does not name one.
pub const DEFAULT_CONTAINER_TYPE: ContainerType = ContainerType::Singularity;

/// Supported container technologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerType {
    Singularity,
    VirtualBox,
}

impl ContainerType {
    /// Name used in descriptors and download URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerType::Singularity => "singularity",
            ContainerType::VirtualBox => "vbox",
        }
    }

    /// Extension of image files.
    pub fn image_extension(&self) -> &'static str {
        match self {
            ContainerType::Singularity => "sif",
            ContainerType::VirtualBox => "vdi",
        }
    }
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerType {
    type Err = ShelterError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "singularity" => Ok(ContainerType::Singularity),
            "vbox" | "virtualbox" => Ok(ContainerType::VirtualBox),
            other => Err(ShelterError::UnsupportedContainerType {
                name: other.to_string(),
            }),
        }
    }
}

/// Operations that depend on the container technology.
pub trait ContainerBackend {
    fn container_type(&self) -> ContainerType;

    fn image_extension(&self) -> &'static str {
        self.container_type().image_extension()
    }

    /// Install `candidate` at `artifact`.
    fn sync(
        &self,
        source: &dyn RemoteSource,
        candidate: &Candidate,
        artifact: &Path,
        force: bool,
        progress: &mut dyn ProgressSink,
    ) -> Result<SyncOutcome> {
        Synchronizer::new(source)
            .with_force(force)
            .sync(candidate, artifact, progress)
    }

    /// Check that `installed` can serve `environment`.
    fn check_binding(
        &self,
        environment: &Environment,
        installed: &ImageMetadata,
    ) -> Result<BindingMatch> {
        check_binding(environment, installed)
    }

    fn launcher(&self) -> Box<dyn Launcher>;
}

/// Singularity images (`.sif`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Singularity;

impl ContainerBackend for Singularity {
    fn container_type(&self) -> ContainerType {
        ContainerType::Singularity
    }

    fn launcher(&self) -> Box<dyn Launcher> {
        Box::new(SingularityLauncher::new())
    }
}

/// VirtualBox disk images (`.vdi`).
#[derive(Debug, Clone, Copy, Default)]
pub struct VirtualBox;

impl ContainerBackend for VirtualBox {
    fn container_type(&self) -> ContainerType {
        ContainerType::VirtualBox
    }

    fn launcher(&self) -> Box<dyn Launcher> {
        Box::new(VirtualBoxLauncher)
    }
}

/// Back-end of a container type name.
///
/// # Errors
///
/// Returns `UnsupportedContainerType` for unknown names, `docker` included.
pub fn backend_for(name: &str) -> Result<Box<dyn ContainerBackend>> {
    Ok(backend_of(name.parse()?))
}

/// Back-end of a known container type.
pub fn backend_of(container_type: ContainerType) -> Box<dyn ContainerBackend> {
    match container_type {
        ContainerType::Singularity => Box::new(Singularity),
        ContainerType::VirtualBox => Box::new(VirtualBox),
    }
}

/// Back-end of an environment, Singularity when none is declared.
pub fn backend_for_environment(environment: &Environment) -> Result<Box<dyn ContainerBackend>> {
    match environment.config.container_type.as_deref() {
        Some(name) => backend_for(name),
        None => Ok(backend_of(DEFAULT_CONTAINER_TYPE)),
    }
}
