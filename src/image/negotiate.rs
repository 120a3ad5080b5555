//! Choice of the build to install among remote candidates.

use super::metadata::ImageMetadata;
use super::remote::{artifact_url, CandidateSet};
use crate::error::Result;
use crate::fetch::RemoteSource;
use std::path::Path;

/// A remote build whose metadata has been fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub suffix: u32,
    pub metadata_url: String,
    pub metadata: ImageMetadata,
}

impl Candidate {
    pub fn artifact_url(&self) -> &str {
        artifact_url(&self.metadata_url)
    }
}

/// Pick the newest usable build.
///
/// Suffixes are tried from highest to lowest. A candidate whose metadata
/// cannot be fetched or parsed is skipped with a warning, as is one whose
/// `image_version` differs from `pinned_version`. `Ok(None)` means no
/// build qualifies.
pub fn negotiate<S: RemoteSource + ?Sized>(
    source: &S,
    candidates: &CandidateSet,
    pinned_version: Option<&str>,
) -> Result<Option<Candidate>> {
    for (&suffix, url) in candidates.iter().rev() {
        let content = match source.fetch_text(url) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Skipping {}: {:#}", url, e);
                continue;
            }
        };
        let metadata = match ImageMetadata::parse(&content, Path::new(url)) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", url, e);
                continue;
            }
        };

        if let Some(pinned) = pinned_version {
            if metadata.image_version.as_deref() != Some(pinned) {
                tracing::debug!(
                    "Skipping {}: version {} is not {}",
                    url,
                    metadata.image_version.as_deref().unwrap_or("unknown"),
                    pinned
                );
                continue;
            }
        }

        tracing::debug!("Selected build {} from {}", suffix, url);
        return Ok(Some(Candidate {
            suffix,
            metadata_url: url.clone(),
            metadata,
        }));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::RemoteBody;
    use anyhow::bail;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Serves metadata documents and records which were requested.
    #[derive(Default)]
    struct FakeSource {
        documents: HashMap<String, String>,
        visited: RefCell<Vec<String>>,
    }

    impl FakeSource {
        fn serve(mut self, url: &str, body: &str) -> Self {
            self.documents.insert(url.to_string(), body.to_string());
            self
        }
    }

    impl RemoteSource for FakeSource {
        fn list(&self, _url: &str) -> anyhow::Result<Vec<String>> {
            Ok(Vec::new())
        }
        fn fetch_text(&self, url: &str) -> anyhow::Result<String> {
            self.visited.borrow_mut().push(url.to_string());
            match self.documents.get(url) {
                Some(body) => Ok(body.clone()),
                None => bail!("HTTP 404 Not Found fetching {}", url),
            }
        }
        fn open(&self, url: &str, _offset: u64) -> anyhow::Result<RemoteBody> {
            bail!("not served: {}", url)
        }
    }

    fn set(suffixes: &[u32]) -> CandidateSet {
        suffixes
            .iter()
            .map(|s| (*s, format!("m/{}.json", s)))
            .collect()
    }

    #[test]
    fn highest_suffix_wins() {
        let source = FakeSource::default()
            .serve("m/0.json", r#"{"image_version": "5.0"}"#)
            .serve("m/2.json", r#"{"image_version": "5.0"}"#)
            .serve("m/5.json", r#"{"image_version": "5.0"}"#);

        let winner = negotiate(&source, &set(&[0, 2, 5]), None).unwrap().unwrap();

        assert_eq!(winner.suffix, 5);
        assert_eq!(*source.visited.borrow(), vec!["m/5.json"]);
    }

    #[test]
    fn failures_are_skipped_in_descending_order() {
        let source = FakeSource::default()
            .serve("m/0.json", r#"{"image_version": "5.0"}"#)
            .serve("m/2.json", r#"{"image_version": "5.0"}"#)
            .serve("m/5.json", "{ truncated");

        let winner = negotiate(&source, &set(&[0, 2, 5]), None).unwrap().unwrap();

        assert_eq!(winner.suffix, 2);
        assert_eq!(*source.visited.borrow(), vec!["m/5.json", "m/2.json"]);
    }

    #[test]
    fn pinned_version_skips_other_versions() {
        let source = FakeSource::default()
            .serve("m/1.json", r#"{"image_version": "5.0"}"#)
            .serve("m/3.json", r#"{"image_version": "5.1"}"#);

        let winner = negotiate(&source, &set(&[1, 3]), Some("5.0"))
            .unwrap()
            .unwrap();
        assert_eq!(winner.suffix, 1);
        assert_eq!(winner.metadata.image_version.as_deref(), Some("5.0"));
    }

    #[test]
    fn pinned_version_walks_down_and_stops_at_first_match() {
        let source = FakeSource::default()
            .serve("m/0.json", r#"{"image_version": "5.0"}"#)
            .serve("m/2.json", r#"{"image_version": "5.0"}"#)
            .serve("m/5.json", r#"{"image_version": "5.1"}"#);

        let winner = negotiate(&source, &set(&[0, 2, 5]), Some("5.0"))
            .unwrap()
            .unwrap();

        assert_eq!(winner.suffix, 2);
        assert_eq!(*source.visited.borrow(), vec!["m/5.json", "m/2.json"]);
    }

    #[test]
    fn exhaustion_is_not_an_error() {
        let source = FakeSource::default().serve("m/1.json", r#"{"image_version": "4.0"}"#);

        assert!(negotiate(&source, &set(&[1, 7]), Some("5.0"))
            .unwrap()
            .is_none());
        assert!(negotiate(&source, &CandidateSet::new(), None)
            .unwrap()
            .is_none());
    }

    #[test]
    fn artifact_url_drops_json_suffix() {
        let candidate = Candidate {
            suffix: 1,
            metadata_url: "http://h/casa-dev-5.0-1.sif.json".to_string(),
            metadata: ImageMetadata::default(),
        };
        assert_eq!(candidate.artifact_url(), "http://h/casa-dev-5.0-1.sif");
    }
}
