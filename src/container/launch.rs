//! Starting a command inside an environment's container.

use std::path::Path;
use std::process::Command;

use crate::environment::{Environment, CONTAINER_HOST_DIR};
use crate::error::{Result, ShelterError};

/// Prefix under which Singularity forwards variables into the container.
pub const SINGULARITY_ENV_PREFIX: &str = "SINGULARITYENV_";

/// Builds and runs container commands.
pub trait Launcher {
    /// The host command that runs `command` in `environment` using `image`.
    fn command(&self, environment: &Environment, image: &Path, command: &[String])
        -> Result<Command>;

    /// Run `command` and wait for it, returning its exit code.
    fn launch(&self, environment: &Environment, image: &Path, command: &[String]) -> Result<i32> {
        let mut cmd = self.command(environment, image, command)?;
        tracing::debug!("Running {:?}", cmd);

        let status = cmd.status().map_err(|e| ShelterError::Launch {
            environment: environment.name().to_string(),
            message: format!("{:?}: {}", cmd.get_program(), e),
        })?;
        // Killed by a signal.
        Ok(status.code().unwrap_or(1))
    }
}

/// Runs commands with `singularity run`.
#[derive(Debug, Clone)]
pub struct SingularityLauncher {
    program: String,
}

impl SingularityLauncher {
    pub fn new() -> Self {
        Self::with_program("singularity")
    }

    /// Use another executable, such as `apptainer`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SingularityLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl Launcher for SingularityLauncher {
    fn command(
        &self,
        environment: &Environment,
        image: &Path,
        command: &[String],
    ) -> Result<Command> {
        let variables = environment.resolved_env()?;
        let home = variables
            .iter()
            .find(|(name, _)| name == "HOME")
            .map(|(_, value)| value.clone())
            .unwrap_or_else(|| format!("{}/home", CONTAINER_HOST_DIR));

        let mut cmd = Command::new(&self.program);
        cmd.arg("run").arg("--cleanenv").arg("--home").arg(&home);
        cmd.args(environment.string_list("container_options"));

        for (container, host) in environment.resolved_mounts()? {
            cmd.arg("--bind").arg(format!("{}:{}", host, container));
        }

        // HOME is set through --home.
        for (name, value) in variables.iter().filter(|(name, _)| name != "HOME") {
            cmd.env(format!("{}{}", SINGULARITY_ENV_PREFIX, name), value);
        }

        cmd.arg(image);
        cmd.args(command);
        Ok(cmd)
    }
}

/// VirtualBox machines are started from VirtualBox itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct VirtualBoxLauncher;

impl Launcher for VirtualBoxLauncher {
    fn command(
        &self,
        environment: &Environment,
        _image: &Path,
        _command: &[String],
    ) -> Result<Command> {
        Err(ShelterError::Launch {
            environment: environment.name().to_string(),
            message: "running commands in a VirtualBox environment is not supported, \
                      start the virtual machine from VirtualBox"
                .to_string(),
        })
    }
}
