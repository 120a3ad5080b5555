//! Environment descriptors.
//!
//! An [`Environment`] is the effective, merged view of one environment's
//! config layers. Its `directory` is derived from where the instance
//! config lives and is never read from or written to the file.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::{
    expand, load_layer, load_layers, resolve, write_json, ConfigPaths, CONF_DIR, DESCRIPTOR_FILE,
};
use crate::error::{Result, ShelterError};

/// Keys that are derived at load time and never persisted.
const DERIVED_KEYS: [&str; 2] = ["directory", "config_files"];

/// What an environment is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentType {
    /// Developer environment with build tools.
    Dev,
    /// Runtime environment for released software.
    Run,
    /// Minimal user environment.
    User,
}

impl EnvironmentType {
    /// The descriptor spelling of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Run => "run",
            Self::User => "user",
        }
    }
}

impl fmt::Display for EnvironmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvironmentType {
    type Err = ShelterError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dev" => Ok(Self::Dev),
            "run" => Ok(Self::Run),
            "user" => Ok(Self::User),
            other => Err(ShelterError::ConfigValidationError {
                message: format!("unknown environment type '{}' (expected dev, run or user)", other),
            }),
        }
    }
}

/// Typed view of a descriptor file.
///
/// Unknown keys are kept in `extra` so that rewriting a descriptor never
/// drops settings this version does not understand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Unique name within the base directory.
    pub name: String,

    /// Environment type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EnvironmentType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distro: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Container technology (`singularity`, `vbox`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_type: Option<String>,

    /// Image path, absolute or relative to the base directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Content fingerprint of the image this environment is bound to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,

    /// Image version this environment is pinned to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_version: Option<String>,

    /// Container path to host path, in declaration order.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub mounts: Map<String, Value>,

    /// Environment variables passed into the container.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub env: Map<String, Value>,

    /// Every other key.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// New image binding written back after an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBinding {
    pub image: String,
    pub image_id: Option<String>,
    pub image_version: Option<String>,
}

/// An environment resolved from its config layers.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Typed descriptor fields.
    pub config: EnvironmentConfig,
    /// Environment root, derived from the instance config location.
    pub directory: PathBuf,
    /// Files that contributed layers, in merge order.
    pub config_files: Vec<PathBuf>,
    effective: Value,
}

impl Environment {
    /// Load and merge every layer of the environment rooted at `directory`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if the instance config is missing, and parse
    /// errors for malformed layers.
    pub fn load(directory: &Path, user_override: Option<&Path>) -> Result<Self> {
        let paths = ConfigPaths::discover(directory, user_override);
        let (layers, config_files) = load_layers(&paths)?;

        let (instance, rest) = layers
            .split_first()
            .ok_or_else(|| ShelterError::ConfigNotFound {
                path: paths.instance.clone(),
            })?;
        let effective = resolve(instance, rest)?;

        Self::from_value(effective, directory.to_path_buf(), config_files)
    }

    /// Build an environment from an already merged mapping.
    pub fn from_value(
        mut effective: Value,
        directory: PathBuf,
        config_files: Vec<PathBuf>,
    ) -> Result<Self> {
        if let Value::Object(map) = &mut effective {
            for key in DERIVED_KEYS {
                map.remove(key);
            }
        }

        let source = config_files
            .first()
            .cloned()
            .unwrap_or_else(|| directory.join(CONF_DIR).join(DESCRIPTOR_FILE));
        let config: EnvironmentConfig =
            serde_json::from_value(effective.clone()).map_err(|e| {
                ShelterError::ConfigParseError {
                    path: source,
                    message: e.to_string(),
                }
            })?;

        if config.name.is_empty() {
            return Err(ShelterError::ConfigValidationError {
                message: format!("environment in {} has an empty name", directory.display()),
            });
        }

        Ok(Self {
            config,
            directory,
            config_files,
            effective,
        })
    }

    /// Environment name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Path of the instance config file.
    pub fn instance_config(&self) -> PathBuf {
        self.directory.join(CONF_DIR).join(DESCRIPTOR_FILE)
    }

    /// The merged descriptor mapping.
    pub fn effective(&self) -> &Value {
        &self.effective
    }

    /// Value of a top-level field as text, for filtering and placeholders.
    ///
    /// `directory` is always available. Mappings, sequences and nulls have
    /// no text value.
    pub fn field(&self, field: &str) -> Option<String> {
        if field == "directory" {
            return Some(self.directory.display().to_string());
        }
        scalar_text(self.effective.get(field)?)
    }

    /// Fields usable as `{placeholder}` in `env` and `mounts`.
    pub fn placeholder_fields(&self) -> HashMap<String, String> {
        let mut fields: HashMap<String, String> = self
            .effective
            .as_object()
            .into_iter()
            .flatten()
            .filter_map(|(k, v)| scalar_text(v).map(|t| (k.clone(), t)))
            .collect();
        fields.insert(
            "directory".to_string(),
            self.directory.display().to_string(),
        );
        fields
    }

    /// `env` with placeholders expanded, in declaration order.
    pub fn resolved_env(&self) -> Result<Vec<(String, String)>> {
        let fields = self.placeholder_fields();
        self.config
            .env
            .iter()
            .map(|(name, value)| {
                let text = mapping_text(self.name(), "env", name, value)?;
                Ok((name.clone(), expand(&text, &fields)?))
            })
            .collect()
    }

    /// `mounts` as (container path, host path) with placeholders expanded.
    pub fn resolved_mounts(&self) -> Result<Vec<(String, String)>> {
        let fields = self.placeholder_fields();
        self.config
            .mounts
            .iter()
            .map(|(container, host)| {
                let text = mapping_text(self.name(), "mounts", container, host)?;
                Ok((expand(container, &fields)?, expand(&text, &fields)?))
            })
            .collect()
    }

    /// Extra string list stored under `key`, such as `container_options`.
    pub fn string_list(&self, key: &str) -> Vec<String> {
        self.effective
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(scalar_text).collect())
            .unwrap_or_default()
    }

    /// Descriptor as shown to users: the merged mapping plus derived keys.
    pub fn to_display_json(&self) -> Value {
        let mut value = self.effective.clone();
        if let Value::Object(map) = &mut value {
            map.insert(
                "directory".to_string(),
                Value::String(self.directory.display().to_string()),
            );
            map.insert(
                "config_files".to_string(),
                Value::Array(
                    self.config_files
                        .iter()
                        .map(|p| Value::String(p.display().to_string()))
                        .collect(),
                ),
            );
        }
        value
    }

    /// Persist a new image binding into the instance config.
    ///
    /// Only `image`, `image_id` and `image_version` are touched, and only
    /// in the instance file; override layers are left alone.
    pub fn rebind(&mut self, binding: &ImageBinding) -> Result<()> {
        let path = self.instance_config();
        let mut instance = load_layer(&path)?;

        if let Value::Object(map) = &mut instance {
            set_binding(map, binding);
        }
        write_json(&path, &instance)?;

        if let Value::Object(map) = &mut self.effective {
            set_binding(map, binding);
        }
        self.config.image = Some(binding.image.clone());
        if binding.image_id.is_some() {
            self.config.image_id = binding.image_id.clone();
        }
        if binding.image_version.is_some() {
            self.config.image_version = binding.image_version.clone();
        }

        tracing::info!(
            "Bound environment '{}' to {} ({})",
            self.name(),
            binding.image,
            binding.image_id.as_deref().unwrap_or("no image id")
        );
        Ok(())
    }
}

fn set_binding(map: &mut Map<String, Value>, binding: &ImageBinding) {
    map.insert("image".to_string(), Value::String(binding.image.clone()));
    if let Some(id) = &binding.image_id {
        map.insert("image_id".to_string(), Value::String(id.clone()));
    }
    if let Some(version) = &binding.image_version {
        map.insert("image_version".to_string(), Value::String(version.clone()));
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn mapping_text(environment: &str, mapping: &str, key: &str, value: &Value) -> Result<String> {
    scalar_text(value).ok_or_else(|| ShelterError::ConfigValidationError {
        message: format!(
            "{}.{} in environment '{}' must be a string",
            mapping, key, environment
        ),
    })
}
