//! Compatibility between an environment and an installed image.
//!
//! An environment may pin the image it was built against through
//! `image_id`. A different image may still serve it when it shares the
//! environment's `image_version` or declares the pinned id in its
//! `compatibility` list.

use crate::environment::Environment;
use crate::error::{Result, ShelterError};
use crate::image::ImageMetadata;

/// Why an image may serve an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingMatch {
    /// The environment pins no image id.
    Unbound,
    /// The image is the pinned one.
    Exact,
    /// Same `image_version` as the environment.
    VersionMatch,
    /// The image lists the pinned id as compatible.
    Compatible,
}

/// Check that `installed` can serve `environment`.
///
/// # Errors
///
/// Returns `Incompatible` naming the environment, the pinned id and the
/// installed id.
pub fn check_binding(environment: &Environment, installed: &ImageMetadata) -> Result<BindingMatch> {
    let Some(pinned) = environment.config.image_id.as_deref() else {
        return Ok(BindingMatch::Unbound);
    };

    if installed.image_id.as_deref() == Some(pinned) {
        return Ok(BindingMatch::Exact);
    }

    if let Some(version) = environment.config.image_version.as_deref() {
        if installed.image_version.as_deref() == Some(version) {
            return Ok(BindingMatch::VersionMatch);
        }
    }

    if installed.compatibility.iter().any(|id| id == pinned) {
        return Ok(BindingMatch::Compatible);
    }

    Err(ShelterError::Incompatible {
        environment: environment.name().to_string(),
        pinned: pinned.to_string(),
        installed: installed
            .image_id
            .clone()
            .unwrap_or_else(|| "unidentified".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn environment(image_id: Option<&str>, image_version: Option<&str>) -> Environment {
        let mut value = json!({"name": "dev"});
        if let Some(id) = image_id {
            value["image_id"] = json!(id);
        }
        if let Some(version) = image_version {
            value["image_version"] = json!(version);
        }
        Environment::from_value(value, PathBuf::from("/base/dev"), Vec::new()).unwrap()
    }

    fn image(id: &str, version: &str, compatibility: &[&str]) -> ImageMetadata {
        ImageMetadata {
            image_id: Some(id.to_string()),
            image_version: Some(version.to_string()),
            compatibility: compatibility.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn unpinned_environment_accepts_anything() {
        let env = environment(None, None);
        assert_eq!(
            check_binding(&env, &ImageMetadata::default()).unwrap(),
            BindingMatch::Unbound
        );
    }

    #[test]
    fn same_id_matches() {
        let env = environment(Some("A"), None);
        assert_eq!(
            check_binding(&env, &image("A", "5.0", &[])).unwrap(),
            BindingMatch::Exact
        );
    }

    #[test]
    fn listed_compatibility_matches() {
        let env = environment(Some("A"), None);
        assert_eq!(
            check_binding(&env, &image("B", "5.1", &["A", "C"])).unwrap(),
            BindingMatch::Compatible
        );
    }

    #[test]
    fn unlisted_id_is_incompatible() {
        let env = environment(Some("A"), None);
        match check_binding(&env, &image("B", "5.1", &["C"])) {
            Err(ShelterError::Incompatible {
                environment,
                pinned,
                installed,
            }) => {
                assert_eq!(environment, "dev");
                assert_eq!(pinned, "A");
                assert_eq!(installed, "B");
            }
            other => panic!("expected incompatibility, got {:?}", other),
        }
    }

    #[test]
    fn shared_version_matches() {
        let env = environment(Some("A"), Some("5.0"));
        assert_eq!(
            check_binding(&env, &image("B", "5.0", &[])).unwrap(),
            BindingMatch::VersionMatch
        );
        assert!(check_binding(&env, &image("B", "5.1", &[])).is_err());
    }
}
