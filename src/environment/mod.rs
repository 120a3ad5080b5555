//! Environments: descriptors, discovery, and setup.
//!
//! - [`descriptor`] - the merged [`Environment`] view and binding updates
//! - [`catalog`] - enumeration and filtering under a base directory
//! - [`setup`] - creation of new environments

pub mod catalog;
pub mod descriptor;
pub mod setup;

pub use catalog::{EnvironmentCatalog, EnvironmentFilter, FILTER_FIELDS};
pub use descriptor::{Environment, EnvironmentConfig, EnvironmentType, ImageBinding};
pub use setup::{copy_tree, create_environment, SetupRequest, CONTAINER_HOST_DIR};
