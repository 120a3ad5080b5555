//! Container images: metadata, local and remote catalogs, and transfer.
//!
//! - [`metadata`] - sidecar documents describing each image
//! - [`local`] - images installed in the base directory
//! - [`remote`] - builds published in a remote directory
//! - [`negotiate`] - choice of the build to install
//! - [`sync`] - resumable, verified installation of a build
//! - [`hash`] - payload checksums

pub mod hash;
pub mod local;
pub mod metadata;
pub mod negotiate;
pub mod remote;
pub mod sync;

pub use hash::{file_md5, md5_hex};
pub use local::{LocalImage, LocalImageCatalog};
pub use metadata::{format_size, ImageMetadata};
pub use negotiate::{negotiate, Candidate};
pub use remote::{artifact_url, parse_candidates, CandidateSet, RemoteArtifact, RemoteCatalog};
pub use sync::{NoProgress, ProgressSink, SyncOutcome, SyncPaths, Synchronizer};
