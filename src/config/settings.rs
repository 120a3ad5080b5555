//! Process-wide settings, resolved once and passed explicitly.
//!
//! The base directory holds every environment and installed image. It is
//! taken from, in order:
//! 1. The `--base-directory` flag
//! 2. `SHELTER_BASE_DIRECTORY`
//! 3. `~/shelter`

use std::path::{Path, PathBuf};

/// Environment variable naming the base directory.
pub const BASE_DIRECTORY_ENV: &str = "SHELTER_BASE_DIRECTORY";

/// Environment variable naming the remote image directory.
pub const DOWNLOAD_URL_ENV: &str = "SHELTER_DOWNLOAD_URL";

/// Remote image directory; `{container_type}` is substituted per back-end.
pub const DEFAULT_DOWNLOAD_URL: &str = "https://brainvisa.info/download/{container_type}";

/// Resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Root holding environments and images.
    pub base_directory: PathBuf,
    /// Remote image directory URL template.
    pub download_url: String,
    /// User-level override layer applied to every environment, if present.
    pub user_override: Option<PathBuf>,
}

impl Settings {
    /// Settings rooted at `base_directory` with default remote and no user override.
    pub fn new(base_directory: impl Into<PathBuf>) -> Self {
        Self {
            base_directory: base_directory.into(),
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
            user_override: None,
        }
    }

    /// Resolve settings from explicit values, falling back to the process
    /// environment and then to defaults.
    pub fn resolve(base_directory: Option<PathBuf>, download_url: Option<String>) -> Self {
        let base_directory = base_directory
            .or_else(|| {
                std::env::var_os(BASE_DIRECTORY_ENV)
                    .filter(|v| !v.is_empty())
                    .map(PathBuf::from)
            })
            .unwrap_or_else(default_base_directory);

        let download_url = download_url
            .or_else(|| std::env::var(DOWNLOAD_URL_ENV).ok().filter(|v| !v.is_empty()))
            .unwrap_or_else(|| DEFAULT_DOWNLOAD_URL.to_string());

        tracing::debug!(
            "Base directory {} (remote {})",
            base_directory.display(),
            download_url
        );

        Self {
            base_directory,
            download_url,
            user_override: default_user_override(),
        }
    }

    /// Use a different remote image directory.
    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = url.into();
        self
    }

    /// Use a different user-level override file (or none).
    pub fn with_user_override(mut self, path: Option<PathBuf>) -> Self {
        self.user_override = path;
        self
    }

    /// Remote directory URL for one container type.
    pub fn download_url_for(&self, container_type: &str) -> String {
        self.download_url
            .replace("{container_type}", container_type)
    }

    /// Resolve an image reference from a descriptor to a local path.
    ///
    /// Relative references live in the base directory; a leading `~/` is
    /// expanded to the home directory.
    pub fn image_path(&self, image: &str) -> PathBuf {
        let path = match image.strip_prefix("~/") {
            Some(rest) => match dirs::home_dir() {
                Some(home) => home.join(rest),
                None => PathBuf::from(image),
            },
            None => PathBuf::from(image),
        };

        if path.is_absolute() {
            path
        } else {
            self.base_directory.join(path)
        }
    }

    /// Base directory as a path.
    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }
}

fn default_base_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shelter")
}

fn default_user_override() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("shelter").join("override.json"))
}
