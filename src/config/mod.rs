//! Configuration loading, layering, and resolution for Shelter.
//!
//! This module handles all aspects of configuration:
//! - Layer discovery and loading in [`loader`]
//! - Deep merging in [`merger`]
//! - `{field}` placeholder expansion in [`interpolation`]
//! - Process-wide settings in [`settings`]
//!
//! # Example
//!
//! ```
//! use shelter::config::{deep_merge, resolve};
//! use serde_json::json;
//!
//! let instance = json!({"name": "dev", "mounts": {"/data": "/srv/data"}});
//! let user = json!({"mounts": {"/scratch": "/tmp"}});
//!
//! let effective = resolve(&instance, &[user]).unwrap();
//! assert_eq!(effective["mounts"]["/scratch"], "/tmp");
//! assert_eq!(deep_merge(&json!({"m": ["x"]}), &json!({"m": ["x"]})), json!({"m": ["x", "x"]}));
//! ```
//!
//! # Configuration File Locations
//!
//! Shelter merges an environment's layers in this order:
//! 1. Instance config (`<environment>/host/conf/shelter.json`)
//! 2. User override (`~/.config/shelter/override.json`)
//! 3. Local override (`<environment>/host/conf/shelter.local.json`)

pub mod interpolation;
pub mod loader;
pub mod merger;
pub mod settings;

// Loader re-exports
pub use loader::{
    load_layer, load_layers, parse_layer, write_json, ConfigPaths, CONF_DIR, DESCRIPTOR_FILE,
    LOCAL_OVERRIDE_FILE,
};

// Merger re-exports
pub use merger::{deep_merge, deep_merge_with, merge_layers, resolve, resolve_with, MergeStrategy};

// Interpolation re-exports
pub use interpolation::{expand, parse_placeholders, Segment};

// Settings re-exports
pub use settings::{
    Settings, BASE_DIRECTORY_ENV, DEFAULT_DOWNLOAD_URL, DOWNLOAD_URL_ENV,
};
