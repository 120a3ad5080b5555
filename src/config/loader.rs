//! Configuration layer discovery and loading.
//!
//! This module finds the layers that make up one environment and loads
//! each as a raw JSON mapping, ready for merging.

use crate::error::{Result, ShelterError};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory, relative to an environment root, holding its config files.
pub const CONF_DIR: &str = "host/conf";

/// Primary descriptor file name.
pub const DESCRIPTOR_FILE: &str = "shelter.json";

/// Environment-local override file name.
pub const LOCAL_OVERRIDE_FILE: &str = "shelter.local.json";

/// Paths to the config layers of one environment, in priority order
/// (later overrides earlier).
///
/// Merge order:
/// 1. Instance config (`host/conf/shelter.json`)
/// 2. User-level override (`~/.config/shelter/override.json`)
/// 3. Environment-local override (`host/conf/shelter.local.json`)
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Instance config; always required.
    pub instance: PathBuf,

    /// User-level override shared by every environment.
    pub user_override: Option<PathBuf>,

    /// Override specific to this environment.
    pub local_override: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover the layers of the environment rooted at `directory`.
    ///
    /// Optional layers that do not exist are left out.
    pub fn discover(directory: &Path, user_override: Option<&Path>) -> Self {
        let conf = directory.join(CONF_DIR);
        let local = conf.join(LOCAL_OVERRIDE_FILE);

        Self {
            instance: conf.join(DESCRIPTOR_FILE),
            user_override: user_override.filter(|p| p.is_file()).map(Path::to_path_buf),
            local_override: local.is_file().then_some(local),
        }
    }

    /// Returns all existing layer paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        let mut paths = vec![&self.instance];

        if let Some(p) = &self.user_override {
            paths.push(p);
        }

        if let Some(p) = &self.local_override {
            paths.push(p);
        }

        paths
    }

    /// Derive an environment root from its instance config path.
    pub fn directory_of(instance: &Path) -> Option<PathBuf> {
        instance
            .parent()
            .and_then(Path::parent)
            .and_then(Path::parent)
            .map(Path::to_path_buf)
    }
}

/// Load one layer as a raw JSON mapping.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist,
/// `ConfigParseError` if it is not valid JSON, and
/// `InvalidLayer` if its top level is not an object.
pub fn load_layer(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ShelterError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ShelterError::Io(e)
        }
    })?;

    let value = parse_layer(&content, path)?;
    if !value.is_object() {
        return Err(ShelterError::InvalidLayer {
            source_name: path.display().to_string(),
        });
    }
    Ok(value)
}

/// Parse JSON content.
///
/// # Arguments
///
/// * `content` - The JSON content to parse
/// * `source_path` - Path for error reporting
pub fn parse_layer(content: &str, source_path: &Path) -> Result<Value> {
    serde_json::from_str(content).map_err(|e| ShelterError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load every existing layer, returning the values with their paths.
pub fn load_layers(paths: &ConfigPaths) -> Result<(Vec<Value>, Vec<PathBuf>)> {
    let mut values = Vec::new();
    let mut sources = Vec::new();

    for path in paths.all_existing() {
        tracing::debug!("Loading config layer {}", path.display());
        values.push(load_layer(path)?);
        sources.push(path.clone());
    }

    Ok((values, sources))
}

/// Write a mapping as pretty JSON, creating parent directories.
pub fn write_json(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env_dir(temp: &TempDir) -> PathBuf {
        let dir = temp.path().join("dev");
        fs::create_dir_all(dir.join(CONF_DIR)).unwrap();
        dir
    }

    #[test]
    fn discover_skips_missing_optional_layers() {
        let temp = TempDir::new().unwrap();
        let dir = env_dir(&temp);

        let paths = ConfigPaths::discover(&dir, Some(&temp.path().join("none.json")));

        assert!(paths.user_override.is_none());
        assert!(paths.local_override.is_none());
        assert_eq!(paths.all_existing().len(), 1);
    }

    #[test]
    fn discover_orders_layers() {
        let temp = TempDir::new().unwrap();
        let dir = env_dir(&temp);
        let user = temp.path().join("override.json");
        fs::write(&user, "{}").unwrap();
        fs::write(dir.join(CONF_DIR).join(LOCAL_OVERRIDE_FILE), "{}").unwrap();

        let paths = ConfigPaths::discover(&dir, Some(&user));
        let all = paths.all_existing();

        assert_eq!(all.len(), 3);
        assert!(all[0].ends_with("host/conf/shelter.json"));
        assert_eq!(all[1], &user);
        assert!(all[2].ends_with("shelter.local.json"));
    }

    #[test]
    fn directory_of_strips_conf_path() {
        let dir = ConfigPaths::directory_of(Path::new("/base/dev/host/conf/shelter.json"));
        assert_eq!(dir, Some(PathBuf::from("/base/dev")));
    }

    #[test]
    fn load_layer_missing_is_not_found() {
        let temp = TempDir::new().unwrap();
        let result = load_layer(&temp.path().join("missing.json"));
        assert!(matches!(result, Err(ShelterError::ConfigNotFound { .. })));
    }

    #[test]
    fn load_layer_invalid_json_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();

        let result = load_layer(&path);
        assert!(matches!(result, Err(ShelterError::ConfigParseError { .. })));
    }

    #[test]
    fn load_layer_rejects_non_object() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("list.json");
        fs::write(&path, "[1, 2]").unwrap();

        let result = load_layer(&path);
        assert!(matches!(result, Err(ShelterError::InvalidLayer { .. })));
    }

    #[test]
    fn write_json_round_trips() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a").join("b.json");
        write_json(&path, &serde_json::json!({"name": "dev"})).unwrap();

        let value = load_layer(&path).unwrap();
        assert_eq!(value["name"], "dev");
    }
}
