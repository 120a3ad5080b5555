//! Discovery and selection of environments under a base directory.
//!
//! Every environment lives in `<base>/<dir>/host/conf/shelter.json`. The
//! catalog loads all of them, enforces unique names, and filters them
//! with shell-style patterns on descriptor fields.

use glob::Pattern;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::descriptor::Environment;
use crate::config::{Settings, CONF_DIR, DESCRIPTOR_FILE};
use crate::error::{Result, ShelterError};

/// Descriptor fields a filter may constrain.
pub const FILTER_FIELDS: [&str; 9] = [
    "name",
    "type",
    "distro",
    "branch",
    "system",
    "container_type",
    "image",
    "image_version",
    "directory",
];

/// Field filters; `None` values match anything.
///
/// # Example
///
/// ```
/// use shelter::environment::EnvironmentFilter;
///
/// let filter = EnvironmentFilter::new()
///     .with("system", Some("ubuntu-*"))
///     .with("branch", None::<String>);
/// assert_eq!(filter.describe(), "system=ubuntu-*");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentFilter {
    fields: Vec<(String, Option<String>)>,
}

impl EnvironmentFilter {
    /// An empty filter matching every environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter selecting one environment by name.
    pub fn by_name(name: impl Into<String>) -> Self {
        Self::new().with("name", Some(name))
    }

    /// Constrain `field` to the glob `pattern`, or leave it free with `None`.
    pub fn with(mut self, field: impl Into<String>, pattern: Option<impl Into<String>>) -> Self {
        self.fields.push((field.into(), pattern.map(Into::into)));
        self
    }

    /// True if no field is constrained.
    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(|(_, p)| p.is_none())
    }

    /// Human-readable form, e.g. `name=dev system=ubuntu-*`.
    pub fn describe(&self) -> String {
        let parts: Vec<String> = self
            .fields
            .iter()
            .filter_map(|(f, p)| p.as_ref().map(|p| format!("{}={}", f, p)))
            .collect();
        if parts.is_empty() {
            "any environment".to_string()
        } else {
            parts.join(" ")
        }
    }

    fn compile(&self) -> Result<Vec<(String, Pattern)>> {
        self.fields
            .iter()
            .filter_map(|(field, pattern)| pattern.as_ref().map(|p| (field, p)))
            .map(|(field, pattern)| {
                if !FILTER_FIELDS.contains(&field.as_str()) {
                    return Err(ShelterError::ConfigValidationError {
                        message: format!("cannot filter on unknown field '{}'", field),
                    });
                }
                let compiled =
                    Pattern::new(pattern).map_err(|e| ShelterError::ConfigValidationError {
                        message: format!("invalid pattern '{}' for {}: {}", pattern, field, e),
                    })?;
                Ok((field.clone(), compiled))
            })
            .collect()
    }
}

fn matches(env: &Environment, patterns: &[(String, Pattern)]) -> bool {
    patterns.iter().all(|(field, pattern)| {
        env.field(field)
            .is_some_and(|value| pattern.matches(&value))
    })
}

/// Catalog of environments in one base directory.
#[derive(Debug, Clone)]
pub struct EnvironmentCatalog {
    base_directory: PathBuf,
    user_override: Option<PathBuf>,
}

impl EnvironmentCatalog {
    /// Catalog for the given settings.
    pub fn new(settings: &Settings) -> Self {
        Self {
            base_directory: settings.base_directory.clone(),
            user_override: settings.user_override.clone(),
        }
    }

    /// Base directory scanned by this catalog.
    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// Instance config paths, sorted lexicographically.
    ///
    /// A missing base directory holds no environments.
    pub fn instance_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.base_directory.is_dir() {
            tracing::debug!(
                "Base directory {} does not exist",
                self.base_directory.display()
            );
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.base_directory)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| ShelterError::Other(e.into()))?;
            if !entry.file_type().is_dir() || entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let instance = entry.path().join(CONF_DIR).join(DESCRIPTOR_FILE);
            if instance.is_file() {
                paths.push(instance);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Every environment, checking that names are unique.
    pub fn all(&self) -> Result<Vec<Environment>> {
        let mut environments = Vec::new();
        let mut seen: HashMap<String, PathBuf> = HashMap::new();

        for instance in self.instance_paths()? {
            let Some(directory) = crate::config::ConfigPaths::directory_of(&instance) else {
                continue;
            };
            let env = Environment::load(&directory, self.user_override.as_deref())?;

            if let Some(first) = seen.get(env.name()) {
                return Err(ShelterError::DuplicateEnvironment {
                    name: env.name().to_string(),
                    first: first.clone(),
                    second: instance,
                });
            }
            seen.insert(env.name().to_string(), instance);
            environments.push(env);
        }

        Ok(environments)
    }

    /// Environments whose every constrained field matches.
    ///
    /// Results are ordered by instance config path.
    pub fn enumerate(&self, filter: &EnvironmentFilter) -> Result<Vec<Environment>> {
        let patterns = filter.compile()?;
        let selected: Vec<Environment> = self
            .all()?
            .into_iter()
            .filter(|env| matches(env, &patterns))
            .collect();

        tracing::debug!(
            "{} environment(s) match {}",
            selected.len(),
            filter.describe()
        );
        Ok(selected)
    }

    /// The single environment matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `NoMatch` when nothing matches and `Ambiguous`, listing every
    /// match, when several do.
    pub fn select_one(&self, filter: &EnvironmentFilter) -> Result<Environment> {
        let mut selected = self.enumerate(filter)?;
        match selected.len() {
            0 => Err(ShelterError::NoMatch {
                what: "environment".to_string(),
                filter: filter.describe(),
            }),
            1 => Ok(selected.remove(0)),
            _ => Err(ShelterError::Ambiguous {
                what: "environments".to_string(),
                matches: selected
                    .iter()
                    .map(|e| format!("{} ({})", e.name(), e.directory.display()))
                    .collect(),
            }),
        }
    }
}
