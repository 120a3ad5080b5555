//! Creation of new environments.
//!
//! Setup is the only time a descriptor is written from scratch. It
//! provisions the environment's file tree, optionally from a template
//! directory, and writes the instance config with default mounts and
//! environment variables.

use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::catalog::{EnvironmentCatalog, EnvironmentFilter};
use super::descriptor::{Environment, EnvironmentType};
use crate::config::{deep_merge, load_layer, write_json, Settings, CONF_DIR, DESCRIPTOR_FILE};
use crate::container::ContainerType;
use crate::error::{Result, ShelterError};

/// Mount point of the environment's `host` directory inside the container.
pub const CONTAINER_HOST_DIR: &str = "/shelter/host";

/// Parameters of a new environment.
#[derive(Debug, Clone)]
pub struct SetupRequest {
    pub name: String,
    pub kind: EnvironmentType,
    pub distro: String,
    pub branch: String,
    pub system: String,
    pub container_type: ContainerType,
    pub image: Option<String>,
    /// Directory whose content is copied into `<environment>/host`.
    pub template: Option<PathBuf>,
    /// Target directory; defaults to `<base>/<name>`.
    pub directory: Option<PathBuf>,
    /// Overwrite an existing environment in the target directory.
    pub force: bool,
}

impl SetupRequest {
    /// Request with the given name and defaults for everything else.
    pub fn new(name: impl Into<String>, container_type: ContainerType) -> Self {
        Self {
            name: name.into(),
            kind: EnvironmentType::Dev,
            distro: "opensource".to_string(),
            branch: "master".to_string(),
            system: "ubuntu-20.04".to_string(),
            container_type,
            image: None,
            template: None,
            directory: None,
            force: false,
        }
    }
}

/// Create a new environment and return it loaded.
///
/// # Errors
///
/// Returns `EnvironmentExists` if the target already holds a descriptor and
/// `force` is not set, and `DuplicateEnvironment` if another environment in
/// the base directory already uses the name.
pub fn create_environment(settings: &Settings, request: &SetupRequest) -> Result<Environment> {
    let directory = request
        .directory
        .clone()
        .unwrap_or_else(|| settings.base_directory.join(&request.name));
    let instance = directory.join(CONF_DIR).join(DESCRIPTOR_FILE);

    if instance.exists() && !request.force {
        return Err(ShelterError::EnvironmentExists { path: directory });
    }

    let catalog = EnvironmentCatalog::new(settings);
    if let Some(existing) = catalog
        .enumerate(&EnvironmentFilter::by_name(&request.name))?
        .into_iter()
        .find(|e| e.directory != directory)
    {
        return Err(ShelterError::DuplicateEnvironment {
            name: request.name.clone(),
            first: existing.instance_config(),
            second: instance,
        });
    }

    // A forced setup starts over; only the image binding survives.
    let previous_binding = if instance.is_file() {
        let binding = binding_fields(&load_layer(&instance)?);
        fs::remove_file(&instance)?;
        binding
    } else {
        Map::new()
    };

    let host = directory.join("host");
    if let Some(template) = &request.template {
        let copied = copy_tree(template, &host)?;
        tracing::info!("Copied {} file(s) from {}", copied, template.display());
    }
    fs::create_dir_all(host.join("conf"))?;
    fs::create_dir_all(host.join("home"))?;

    // A descriptor shipped with the template is the base; setup values win.
    let mut base = if instance.is_file() {
        load_layer(&instance)?
    } else {
        json!({})
    };
    if let Value::Object(map) = &mut base {
        map.extend(previous_binding);
    }
    let descriptor = deep_merge(&base, &initial_descriptor(request));
    write_json(&instance, &descriptor)?;

    tracing::info!(
        "Created environment '{}' in {}",
        request.name,
        directory.display()
    );
    Environment::load(&directory, settings.user_override.as_deref())
}

fn binding_fields(descriptor: &Value) -> Map<String, Value> {
    ["image", "image_id", "image_version"]
        .into_iter()
        .filter_map(|key| Some((key.to_string(), descriptor.get(key)?.clone())))
        .collect()
}

fn initial_descriptor(request: &SetupRequest) -> Value {
    let mut descriptor = json!({
        "name": request.name,
        "type": request.kind.as_str(),
        "distro": request.distro,
        "branch": request.branch,
        "system": request.system,
        "container_type": request.container_type.as_str(),
        "mounts": {
            CONTAINER_HOST_DIR: "{directory}/host",
        },
        "env": {
            "SHELTER_ENVIRONMENT": "{name}",
            "SHELTER_BRANCH": "{branch}",
            "SHELTER_SYSTEM": "{system}",
            "SHELTER_HOST_DIR": "{directory}",
            "HOME": format!("{}/home", CONTAINER_HOST_DIR),
        },
    });

    if let Some(image) = &request.image {
        descriptor["image"] = Value::String(image.clone());
    }
    if request.container_type == ContainerType::Singularity {
        descriptor["container_options"] = json!(["--pwd", format!("{}/home", CONTAINER_HOST_DIR)]);
    }
    descriptor
}

/// Recursively copy `src` into `dst`, overwriting existing files.
///
/// Returns the number of files copied.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<u64> {
    let mut copied = 0;

    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| ShelterError::Other(e.into()))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| ShelterError::Other(e.into()))?;
        let target = dst.join(relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
            copied += 1;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    let link = fs::read_link(src)?;
    if dst.symlink_metadata().is_ok() {
        fs::remove_file(dst)?;
    }
    std::os::unix::fs::symlink(link, dst)?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    fs::copy(src, dst)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn settings(temp: &TempDir) -> Settings {
        Settings::new(temp.path().join("base"))
    }

    #[test]
    fn creates_descriptor_with_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = settings(&temp);
        let mut request = SetupRequest::new("dev", ContainerType::Singularity);
        request.image = Some("casa-dev-5.0.sif".to_string());

        let env = create_environment(&settings, &request).unwrap();

        assert_eq!(env.name(), "dev");
        assert_eq!(env.directory, settings.base_directory.join("dev"));
        assert_eq!(env.config.container_type.as_deref(), Some("singularity"));
        assert_eq!(env.config.image.as_deref(), Some("casa-dev-5.0.sif"));
        assert!(env.directory.join("host").join("home").is_dir());

        let mounts = env.resolved_mounts().unwrap();
        assert_eq!(mounts[0].0, CONTAINER_HOST_DIR);
        assert_eq!(
            mounts[0].1,
            format!("{}/host", settings.base_directory.join("dev").display())
        );
        assert_eq!(env.string_list("container_options")[0], "--pwd");
    }

    #[test]
    fn vbox_environment_has_no_container_options() {
        let temp = TempDir::new().unwrap();
        let request = SetupRequest::new("vm", ContainerType::VirtualBox);
        let env = create_environment(&settings(&temp), &request).unwrap();
        assert!(env.string_list("container_options").is_empty());
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let temp = TempDir::new().unwrap();
        let settings = settings(&temp);
        let mut request = SetupRequest::new("dev", ContainerType::Singularity);
        create_environment(&settings, &request).unwrap();

        let again = create_environment(&settings, &request);
        assert!(matches!(again, Err(ShelterError::EnvironmentExists { .. })));

        request.force = true;
        request.branch = "integration".to_string();
        let env = create_environment(&settings, &request).unwrap();
        assert_eq!(env.config.branch.as_deref(), Some("integration"));
    }

    #[test]
    fn forced_setup_rewrites_descriptor_and_keeps_binding() {
        let temp = TempDir::new().unwrap();
        let settings = settings(&temp);
        let mut request = SetupRequest::new("dev", ContainerType::Singularity);
        let mut env = create_environment(&settings, &request).unwrap();
        env.rebind(&crate::environment::ImageBinding {
            image: "casa-dev-5.0.sif".to_string(),
            image_id: Some("A".to_string()),
            image_version: Some("5.0".to_string()),
        })
        .unwrap();

        request.force = true;
        create_environment(&settings, &request).unwrap();
        let env = create_environment(&settings, &request).unwrap();

        assert_eq!(
            env.string_list("container_options"),
            vec!["--pwd", "/shelter/host/home"]
        );
        assert_eq!(env.config.image.as_deref(), Some("casa-dev-5.0.sif"));
        assert_eq!(env.config.image_id.as_deref(), Some("A"));
        assert_eq!(env.config.image_version.as_deref(), Some("5.0"));
        assert_eq!(env.config.mounts.len(), 1);
    }

    #[test]
    fn refuses_duplicate_name_elsewhere() {
        let temp = TempDir::new().unwrap();
        let settings = settings(&temp);
        create_environment(&settings, &SetupRequest::new("dev", ContainerType::Singularity))
            .unwrap();

        let mut request = SetupRequest::new("dev", ContainerType::Singularity);
        request.directory = Some(settings.base_directory.join("other"));
        let result = create_environment(&settings, &request);
        assert!(matches!(
            result,
            Err(ShelterError::DuplicateEnvironment { .. })
        ));
    }

    #[test]
    fn template_tree_is_copied_and_its_descriptor_kept() {
        let temp = TempDir::new().unwrap();
        let template = temp.path().join("template");
        fs::create_dir_all(template.join("conf")).unwrap();
        fs::create_dir_all(template.join("src").join("lib")).unwrap();
        fs::write(template.join("src").join("lib").join("a.txt"), "a").unwrap();
        fs::write(
            template.join("conf").join(DESCRIPTOR_FILE),
            r#"{"name": "template", "build_options": ["-j4"]}"#,
        )
        .unwrap();

        let mut request = SetupRequest::new("dev", ContainerType::Singularity);
        request.template = Some(template);
        let env = create_environment(&settings(&temp), &request).unwrap();

        assert!(env.directory.join("host/src/lib/a.txt").is_file());
        assert_eq!(env.name(), "dev");
        assert_eq!(env.string_list("build_options"), vec!["-j4"]);
    }

    #[test]
    fn copy_tree_counts_files() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("a/b")).unwrap();
        fs::write(src.join("a/b/one"), "1").unwrap();
        fs::write(src.join("two"), "2").unwrap();

        let copied = copy_tree(&src, &temp.path().join("dst")).unwrap();
        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(temp.path().join("dst/a/b/one")).unwrap(), "1");
    }
}
