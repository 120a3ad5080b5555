//! Remote image directories.
//!
//! [`RemoteSource`] is the seam between the image subsystem and the
//! network. [`HttpSource`] implements it over HTTP(S); tests substitute
//! in-memory sources.

pub mod http;
pub mod listing;

pub use http::HttpSource;
pub use listing::{join_url, parse_listing};

use anyhow::Result;
use std::io::Read;

/// A payload stream, possibly starting part-way through the file.
pub struct RemoteBody {
    /// Byte offset of the first byte `reader` yields.
    pub offset: u64,
    /// Payload bytes.
    pub reader: Box<dyn Read>,
}

impl std::fmt::Debug for RemoteBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteBody")
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

/// Blocking access to a remote image directory.
pub trait RemoteSource {
    /// Names of the entries in the directory at `url`.
    fn list(&self, url: &str) -> Result<Vec<String>>;

    /// Body of the document at `url`.
    fn fetch_text(&self, url: &str) -> Result<String>;

    /// Stream the file at `url` starting at `offset`.
    ///
    /// A source that cannot resume returns a body with `offset == 0`.
    fn open(&self, url: &str, offset: u64) -> Result<RemoteBody>;
}
