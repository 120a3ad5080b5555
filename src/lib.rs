//! Shelter - container-image environment manager.
//!
//! Shelter keeps a set of named environments in a base directory. Each
//! environment is bound to a container image that Shelter downloads,
//! verifies and updates from a published image repository.
//!
//! # Modules
//!
//! - [`binding`] - Compatibility between environments and installed images
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Settings, JSON layers and placeholder expansion
//! - [`container`] - Container back-ends and launchers
//! - [`environment`] - Environment descriptors, catalog and setup
//! - [`error`] - Error types and result aliases
//! - [`fetch`] - Remote image repository access
//! - [`image`] - Image metadata, local and remote catalogs, synchronization
//! - [`ui`] - Terminal output and download progress
//! - [`update`] - Update orchestration
//!
//! # Example
//!
//! ```
//! use shelter::image::parse_candidates;
//!
//! let listing = vec![
//!     "casa-dev-5.0.sif.json".to_string(),
//!     "casa-dev-5.0-2.sif.json".to_string(),
//!     "casa-run-5.0.sif.json".to_string(),
//! ];
//! let builds = parse_candidates(&listing, "casa-dev-5.0", "sif").unwrap();
//! assert_eq!(builds.keys().copied().collect::<Vec<_>>(), vec![0, 2]);
//! ```

pub mod binding;
pub mod cli;
pub mod config;
pub mod container;
pub mod environment;
pub mod error;
pub mod fetch;
pub mod image;
pub mod ui;
pub mod update;

pub use error::{Result, ShelterError};
