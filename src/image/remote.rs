//! Images published in a remote directory.
//!
//! Each published image `<base>-<N>.<ext>` is accompanied by
//! `<base>-<N>.<ext>.json`. The numeric suffix orders successive builds
//! of the same image; an unsuffixed name counts as suffix 0.

use regex::Regex;
use std::collections::BTreeMap;

use super::local::compile;
use crate::error::{Result, ShelterError};
use crate::fetch::{join_url, RemoteSource};

/// Metadata URLs of one image's builds, keyed by suffix.
pub type CandidateSet = BTreeMap<u32, String>;

/// An image artifact listed in a remote directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteArtifact {
    /// Artifact file name.
    pub name: String,
    pub url: String,
    pub metadata_url: String,
}

/// Remote directory of images.
pub struct RemoteCatalog<'a, S: RemoteSource + ?Sized> {
    source: &'a S,
    url: String,
}

impl<'a, S: RemoteSource + ?Sized> RemoteCatalog<'a, S> {
    pub fn new(source: &'a S, url: impl Into<String>) -> Self {
        Self {
            source,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn list(&self) -> Result<Vec<String>> {
        self.source.list(&self.url).map_err(|e| ShelterError::Transfer {
            url: self.url.clone(),
            message: format!("{:#}", e),
        })
    }

    /// Builds of the image named `base` with extension `extension`.
    pub fn candidates(&self, base: &str, extension: &str) -> Result<CandidateSet> {
        let names = self.list()?;
        let candidates: CandidateSet = parse_candidates(&names, base, extension)?
            .into_iter()
            .map(|(suffix, name)| (suffix, join_url(&self.url, &name)))
            .collect();
        tracing::debug!(
            "{} candidate(s) for {}.{} at {}",
            candidates.len(),
            base,
            extension,
            self.url
        );
        Ok(candidates)
    }

    /// Artifacts with extension `extension`, optionally filtered by a glob
    /// over their file name.
    ///
    /// Only artifacts with a published metadata file are listed.
    pub fn artifacts(&self, extension: &str, pattern: Option<&str>) -> Result<Vec<RemoteArtifact>> {
        let pattern = pattern.map(compile).transpose()?;
        let suffix = format!(".{}.json", extension);

        let mut artifacts: Vec<RemoteArtifact> = self
            .list()?
            .into_iter()
            .filter(|name| name.ends_with(&suffix))
            .map(|metadata_name| {
                let name = artifact_url(&metadata_name).to_string();
                RemoteArtifact {
                    url: join_url(&self.url, &name),
                    metadata_url: join_url(&self.url, &metadata_name),
                    name,
                }
            })
            .filter(|artifact| pattern.as_ref().is_none_or(|p| p.matches(&artifact.name)))
            .collect();
        artifacts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(artifacts)
    }
}

/// Select the metadata files of `base` among directory entry names.
///
/// An explicit `-0` suffix takes precedence over an unsuffixed name.
pub fn parse_candidates(names: &[String], base: &str, extension: &str) -> Result<CandidateSet> {
    let pattern = format!(
        r"^{}(?:-(\d+))?\.{}\.json$",
        regex::escape(base),
        regex::escape(extension)
    );
    let regex = Regex::new(&pattern).map_err(|e| ShelterError::Other(e.into()))?;

    let mut candidates = CandidateSet::new();
    for name in names {
        let Some(captures) = regex.captures(name) else {
            continue;
        };
        match captures.get(1) {
            Some(digits) => match digits.as_str().parse::<u32>() {
                Ok(suffix) => {
                    candidates.insert(suffix, name.clone());
                }
                Err(_) => tracing::debug!("Ignoring {}: suffix out of range", name),
            },
            None => {
                candidates.entry(0).or_insert_with(|| name.clone());
            }
        }
    }
    Ok(candidates)
}

/// Artifact URL of a metadata URL.
pub fn artifact_url(metadata_url: &str) -> &str {
    metadata_url.strip_suffix(".json").unwrap_or(metadata_url)
}
