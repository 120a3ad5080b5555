//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::config::{BASE_DIRECTORY_ENV, DOWNLOAD_URL_ENV};
use crate::environment::EnvironmentFilter;

/// Shelter - container environments and their images.
#[derive(Debug, Parser)]
#[command(name = "shelter")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding environments and images [default: ~/shelter]
    #[arg(long, global = true, env = BASE_DIRECTORY_ENV, value_name = "DIR")]
    pub base_directory: Option<PathBuf>,

    /// Remote image directory; `{container_type}` is replaced
    #[arg(long, global = true, env = DOWNLOAD_URL_ENV)]
    pub url: Option<String>,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List environments
    List(ListArgs),

    /// Show the merged configuration of one environment
    Show(ShowArgs),

    /// List installed or published images
    Images(ImagesArgs),

    /// Check that environments' images are installed and compatible
    Check(CheckArgs),

    /// Install the newest compatible image of environments
    Update(UpdateArgs),

    /// Download a published image into the base directory
    Pull(PullArgs),

    /// Create a new environment
    Setup(SetupArgs),

    /// Run a command in an environment
    Run(RunArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Environment selection shared by several commands.
///
/// Every value is a shell-style pattern.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct FilterArgs {
    /// Environment name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Environment type (dev, run, user)
    #[arg(long = "type", value_name = "TYPE")]
    pub kind: Option<String>,

    #[arg(long)]
    pub distro: Option<String>,

    #[arg(long)]
    pub branch: Option<String>,

    #[arg(long)]
    pub system: Option<String>,

    #[arg(long)]
    pub container_type: Option<String>,

    /// Image file
    #[arg(long)]
    pub image: Option<String>,

    #[arg(long)]
    pub image_version: Option<String>,
}

impl FilterArgs {
    /// Selection by name only.
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn to_filter(&self) -> EnvironmentFilter {
        EnvironmentFilter::new()
            .with("name", self.name.clone())
            .with("type", self.kind.clone())
            .with("distro", self.distro.clone())
            .with("branch", self.branch.clone())
            .with("system", self.system.clone())
            .with("container_type", self.container_type.clone())
            .with("image", self.image.clone())
            .with("image_version", self.image_version.clone())
    }
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `show` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
}

/// Arguments for the `images` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ImagesArgs {
    /// Shell-style pattern on image file names
    pub pattern: Option<String>,

    /// List images published at the download URL
    #[arg(long)]
    pub remote: bool,

    /// Container type of remote images
    #[arg(long, default_value = "singularity")]
    pub container_type: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `check` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
}

/// Arguments for the `update` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Transfer even when the installed image is current
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the `pull` command.
#[derive(Debug, Clone, clap::Args)]
pub struct PullArgs {
    /// Shell-style pattern selecting exactly one published image
    pub pattern: String,

    #[arg(long, default_value = "singularity")]
    pub container_type: String,

    /// Transfer even when the installed image is current
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the `setup` command.
#[derive(Debug, Clone, clap::Args)]
pub struct SetupArgs {
    /// Environment name
    pub name: String,

    #[arg(long = "type", default_value = "dev", value_name = "TYPE")]
    pub kind: String,

    #[arg(long, default_value = "opensource")]
    pub distro: String,

    #[arg(long, default_value = "master")]
    pub branch: String,

    #[arg(long, default_value = "ubuntu-20.04")]
    pub system: String,

    #[arg(long, default_value = "singularity")]
    pub container_type: String,

    /// Image file, relative to the base directory
    #[arg(long)]
    pub image: Option<String>,

    /// Directory copied into the environment's host directory
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Environment directory [default: <base>/<name>]
    #[arg(long)]
    pub directory: Option<PathBuf>,

    /// Overwrite an existing environment
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Command and arguments run in the container
    #[arg(last = true)]
    pub command: Vec<String>,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_filters_and_globals() {
        let cli = Cli::try_parse_from([
            "shelter",
            "--base-directory",
            "/tmp/base",
            "list",
            "--type",
            "dev",
            "--system",
            "ubuntu-*",
        ])
        .unwrap();

        assert_eq!(cli.base_directory, Some(PathBuf::from("/tmp/base")));
        let Commands::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(
            args.filter.to_filter().describe(),
            "type=dev system=ubuntu-*"
        );
    }

    #[test]
    fn run_takes_trailing_command() {
        let cli =
            Cli::try_parse_from(["shelter", "run", "-n", "dev", "--", "bv_maker", "-j4"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.filter.name.as_deref(), Some("dev"));
        assert_eq!(args.command, vec!["bv_maker", "-j4"]);
    }

    #[test]
    fn setup_defaults() {
        let cli = Cli::try_parse_from(["shelter", "setup", "dev"]).unwrap();
        let Commands::Setup(args) = cli.command else {
            panic!("expected setup");
        };
        assert_eq!(args.kind, "dev");
        assert_eq!(args.container_type, "singularity");
        assert!(!args.force);
    }
}
