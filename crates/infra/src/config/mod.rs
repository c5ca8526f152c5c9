//! Configuration loading
//!
//! Layers defaults, an optional config file and `MYSTAR_*` environment
//! overrides into a [`mystar_domain::Config`].

pub mod loader;

// Re-export commonly used items
pub use loader::{apply_env_overrides, load, load_from_file, probe_config_paths};
