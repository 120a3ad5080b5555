//! Image sidecar metadata.
//!
//! Every image artifact `<file>` is described by a JSON sidecar
//! `<file>.json`. `size` and `md5` are absent while an image is being
//! built and filled in once it is finalized.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::write_json;
use crate::error::{Result, ShelterError};

/// Metadata of one image artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_type: Option<String>,
    /// ISO-8601 timestamp, with or without offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    /// Image ids this image can stand in for.
    #[serde(default)]
    pub compatibility: Vec<String>,
    #[serde(default)]
    pub build_number: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Keys this version does not know about, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ImageMetadata {
    /// Sidecar path of `artifact`: the artifact path with `.json` appended.
    pub fn sidecar_path(artifact: &Path) -> PathBuf {
        let mut name = artifact.as_os_str().to_os_string();
        name.push(".json");
        PathBuf::from(name)
    }

    /// Parse metadata from a JSON document.
    pub fn parse(content: &str, source: &Path) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| ShelterError::ConfigParseError {
            path: source.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Read a sidecar file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ShelterError::ConfigNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ShelterError::Io(e)
            }
        })?;
        Self::parse(&content, path)
    }

    /// Read the sidecar of `artifact`.
    pub fn load_for(artifact: &Path) -> Result<Self> {
        Self::load(&Self::sidecar_path(artifact))
    }

    /// Write the metadata as pretty JSON to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, &serde_json::to_value(self)?)
    }

    /// Whether both sides carry the same finalized size and checksum.
    pub fn matches_checksum(&self, other: &ImageMetadata) -> bool {
        match (&self.md5, self.size, &other.md5, other.size) {
            (Some(a), Some(sa), Some(b), Some(sb)) => a.eq_ignore_ascii_case(b) && sa == sb,
            _ => false,
        }
    }

    /// Parsed `creation_time`, interpreting offset-less stamps as UTC.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.creation_time.as_deref()?;
        if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
            return Some(stamp.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Short human-readable summary used in listings.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(version) = &self.image_version {
            parts.push(format!("version {}", version));
        }
        if self.build_number > 0 {
            parts.push(format!("build {}", self.build_number));
        }
        if let Some(created) = self.created_at() {
            parts.push(created.format("%Y-%m-%d %H:%M").to_string());
        }
        if let Some(size) = self.size {
            parts.push(format_size(size));
        }
        parts.join(", ")
    }
}

/// Format a byte count with a binary unit.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> ImageMetadata {
        ImageMetadata::parse(
            r#"{
                "name": "casa-dev-5.0",
                "type": "dev",
                "container_type": "singularity",
                "creation_time": "2021-05-12T10:23:45.123456",
                "size": 1048576,
                "md5": "0123456789abcdef0123456789abcdef",
                "image_version": "5.0",
                "image_id": "A",
                "compatibility": ["B"],
                "build_number": 3,
                "maintainer": "someone"
            }"#,
            Path::new("casa-dev-5.0.sif.json"),
        )
        .unwrap()
    }

    #[test]
    fn parses_known_and_extra_fields() {
        let meta = sample();
        assert_eq!(meta.kind.as_deref(), Some("dev"));
        assert_eq!(meta.size, Some(1048576));
        assert_eq!(meta.build_number, 3);
        assert_eq!(meta.extra["maintainer"], "someone");
    }

    #[test]
    fn defaults_for_missing_fields() {
        let meta = ImageMetadata::parse("{}", Path::new("x.json")).unwrap();
        assert!(meta.compatibility.is_empty());
        assert_eq!(meta.build_number, 0);
        assert!(meta.md5.is_none());
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let result = ImageMetadata::parse("{", Path::new("x.json"));
        assert!(matches!(result, Err(ShelterError::ConfigParseError { .. })));
    }

    #[test]
    fn sidecar_path_appends_json() {
        assert_eq!(
            ImageMetadata::sidecar_path(Path::new("/b/casa-dev-5.0.sif")),
            PathBuf::from("/b/casa-dev-5.0.sif.json")
        );
    }

    #[test]
    fn save_and_load_keep_extra_keys() {
        let temp = TempDir::new().unwrap();
        let artifact = temp.path().join("img.sif");
        sample()
            .save(&ImageMetadata::sidecar_path(&artifact))
            .unwrap();

        let loaded = ImageMetadata::load_for(&artifact).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn missing_sidecar_is_not_found() {
        let temp = TempDir::new().unwrap();
        let result = ImageMetadata::load_for(&temp.path().join("none.sif"));
        assert!(matches!(result, Err(ShelterError::ConfigNotFound { .. })));
    }

    #[test]
    fn checksum_match_requires_both_fields() {
        let meta = sample();
        let mut other = sample();
        assert!(meta.matches_checksum(&other));

        other.md5 = Some(other.md5.unwrap().to_uppercase());
        assert!(meta.matches_checksum(&other));

        other.size = None;
        assert!(!meta.matches_checksum(&other));
    }

    #[test]
    fn created_at_accepts_naive_and_offset_stamps() {
        let mut meta = sample();
        assert_eq!(
            meta.created_at().unwrap().format("%Y-%m-%d").to_string(),
            "2021-05-12"
        );
        meta.creation_time = Some("2021-05-12T23:00:00+02:00".to_string());
        assert_eq!(
            meta.created_at().unwrap().format("%H").to_string(),
            "21"
        );
        meta.creation_time = Some("yesterday".to_string());
        assert!(meta.created_at().is_none());
    }

    #[test]
    fn summary_lists_available_fields() {
        assert_eq!(
            sample().summary(),
            "version 5.0, build 3, 2021-05-12 10:23, 1.0 MiB"
        );
        assert_eq!(ImageMetadata::default().summary(), "");
    }
}
