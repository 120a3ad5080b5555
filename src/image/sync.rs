//! Transfer and installation of a remote build.
//!
//! A download is staged next to the artifact in two hidden files: the
//! payload `.<file>.part` and its metadata `.<file>.json.part`. The staged
//! metadata identifies what the partial payload belongs to, so a later run
//! can resume it. Nothing replaces the installed image until the staged
//! payload has been verified against the metadata checksum.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use super::hash::file_md5;
use super::metadata::ImageMetadata;
use super::negotiate::Candidate;
use crate::error::{Result, ShelterError};
use crate::fetch::RemoteSource;

const CHUNK_SIZE: usize = 256 * 1024;

/// Receives transfer progress.
pub trait ProgressSink {
    /// A transfer of `total` bytes starts at byte `position`.
    fn start(&mut self, _total: u64, _position: u64) {}

    /// `bytes` more bytes have been written.
    fn advance(&mut self, _bytes: u64) {}

    /// The transfer ended, successfully or not.
    fn finish(&mut self) {}
}

/// Discards progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// Result of a synchronization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Whether a new payload was installed.
    pub updated: bool,
    /// Offset the transfer resumed from, 0 for a fresh transfer.
    pub resumed_from: u64,
    /// Bytes received from the source.
    pub transferred: u64,
}

impl SyncOutcome {
    fn up_to_date() -> Self {
        Self::default()
    }
}

/// Files involved in installing one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPaths {
    pub artifact: PathBuf,
    pub sidecar: PathBuf,
    pub temp_payload: PathBuf,
    pub temp_sidecar: PathBuf,
}

impl SyncPaths {
    pub fn new(artifact: &Path) -> Result<Self> {
        let file_name = artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ShelterError::ConfigValidationError {
                message: format!("Image path {} has no file name", artifact.display()),
            })?;
        let directory = artifact.parent().unwrap_or_else(|| Path::new(""));

        Ok(Self {
            artifact: artifact.to_path_buf(),
            sidecar: ImageMetadata::sidecar_path(artifact),
            temp_payload: directory.join(format!(".{}.part", file_name)),
            temp_sidecar: directory.join(format!(".{}.json.part", file_name)),
        })
    }

    fn remove_temporaries(&self) -> Result<()> {
        for path in [&self.temp_payload, &self.temp_sidecar] {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

/// Installs remote builds into local artifact paths.
pub struct Synchronizer<'a, S: RemoteSource + ?Sized> {
    source: &'a S,
    force: bool,
}

impl<'a, S: RemoteSource + ?Sized> Synchronizer<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            force: false,
        }
    }

    /// Transfer even when the installed image already matches.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Make `artifact` hold the build described by `candidate`.
    ///
    /// # Errors
    ///
    /// Returns `MissingChecksum` when the remote metadata lacks `md5` or
    /// `size`, `Transfer` when the source fails (staged files are kept for
    /// a later resume) and `Integrity` when the received payload does not
    /// match (staged files are removed).
    pub fn sync(
        &self,
        candidate: &Candidate,
        artifact: &Path,
        progress: &mut dyn ProgressSink,
    ) -> Result<SyncOutcome> {
        let paths = SyncPaths::new(artifact)?;
        let remote = &candidate.metadata;

        if !self.force && self.is_current(&paths, remote) {
            tracing::info!("{} is up to date", artifact.display());
            return Ok(SyncOutcome::up_to_date());
        }

        let (Some(md5), Some(size)) = (remote.md5.as_deref(), remote.size) else {
            return Err(ShelterError::MissingChecksum {
                url: candidate.metadata_url.clone(),
            });
        };

        if let Some(directory) = artifact.parent() {
            fs::create_dir_all(directory)?;
        }

        let offset = resume_offset(&paths, md5, size)?;
        remote.save(&paths.temp_sidecar)?;

        let (resumed_from, transferred) = if offset == size {
            tracing::debug!("Staged payload {} is complete", paths.temp_payload.display());
            (offset, 0)
        } else {
            self.transfer(candidate, &paths, offset, size, progress)?
        };

        verify(&paths, md5, size)?;
        install(&paths)?;

        tracing::info!(
            "Installed {} (build {}, {} bytes received)",
            artifact.display(),
            candidate.suffix,
            transferred
        );
        Ok(SyncOutcome {
            updated: true,
            resumed_from,
            transferred,
        })
    }

    fn is_current(&self, paths: &SyncPaths, remote: &ImageMetadata) -> bool {
        let Ok(local) = ImageMetadata::load(&paths.sidecar) else {
            return false;
        };
        let on_disk = fs::metadata(&paths.artifact).map(|m| m.len()).ok();
        local.matches_checksum(remote) && on_disk.is_some() && on_disk == remote.size
    }

    fn transfer(
        &self,
        candidate: &Candidate,
        paths: &SyncPaths,
        offset: u64,
        size: u64,
        progress: &mut dyn ProgressSink,
    ) -> Result<(u64, u64)> {
        let url = candidate.artifact_url();
        let transfer_error = |message: String| ShelterError::Transfer {
            url: url.to_string(),
            message,
        };

        let mut body = self
            .source
            .open(url, offset)
            .map_err(|e| transfer_error(format!("{:#}", e)))?;

        let mut file = if body.offset == 0 {
            File::create(&paths.temp_payload)?
        } else {
            OpenOptions::new().append(true).open(&paths.temp_payload)?
        };

        if body.offset > 0 {
            tracing::info!("Resuming {} at byte {}", url, body.offset);
        } else {
            tracing::info!("Downloading {}", url);
        }
        progress.start(size, body.offset);

        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut transferred = 0u64;
        let result = loop {
            let read = match body.reader.read(&mut buffer) {
                Ok(0) => break Ok(()),
                Ok(read) => read,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => break Err(transfer_error(e.to_string())),
            };
            if let Err(e) = file.write_all(&buffer[..read]) {
                break Err(e.into());
            }
            transferred += read as u64;
            progress.advance(read as u64);
        };
        progress.finish();

        file.flush()?;
        result?;
        Ok((body.offset, transferred))
    }
}

/// Offset at which the staged payload can be continued.
///
/// Staged files belonging to another build are discarded.
fn resume_offset(paths: &SyncPaths, md5: &str, size: u64) -> Result<u64> {
    let staged_md5 = ImageMetadata::load(&paths.temp_sidecar)
        .ok()
        .and_then(|staged| staged.md5);
    let staged_len = fs::metadata(&paths.temp_payload).map(|m| m.len()).ok();

    match (staged_md5, staged_len) {
        (Some(staged), Some(len)) if staged.eq_ignore_ascii_case(md5) && len <= size => Ok(len),
        (_, Some(_)) => {
            tracing::debug!("Discarding stale {}", paths.temp_payload.display());
            fs::remove_file(&paths.temp_payload)?;
            Ok(0)
        }
        (_, None) => Ok(0),
    }
}

fn verify(paths: &SyncPaths, md5: &str, size: u64) -> Result<()> {
    let actual_size = fs::metadata(&paths.temp_payload)?.len();
    if actual_size != size {
        paths.remove_temporaries()?;
        return Err(ShelterError::Integrity {
            path: paths.artifact.clone(),
            expected: format!("{} bytes", size),
            actual: format!("{} bytes", actual_size),
        });
    }

    let actual_md5 = file_md5(&paths.temp_payload)?;
    if !actual_md5.eq_ignore_ascii_case(md5) {
        paths.remove_temporaries()?;
        return Err(ShelterError::Integrity {
            path: paths.artifact.clone(),
            expected: format!("md5 {}", md5),
            actual: format!("md5 {}", actual_md5),
        });
    }
    Ok(())
}

// The old sidecar goes first: an artifact without sidecar is ignored by
// the local catalog, an artifact with a stale sidecar would not be.
fn install(paths: &SyncPaths) -> Result<()> {
    match fs::remove_file(&paths.sidecar) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    fs::rename(&paths.temp_payload, &paths.artifact)?;
    fs::rename(&paths.temp_sidecar, &paths.sidecar)?;
    Ok(())
}
