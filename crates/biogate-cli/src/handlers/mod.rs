//! Command handlers. Each returns the text to print.

pub mod check;
pub mod labels;
pub mod notifier;
pub mod sensors;

use anyhow::{Context, Result};
use biogate_service::ServiceConfig;
use std::path::Path;
use tracing::debug;

/// Load a configuration file, naming the path on failure.
pub fn load_config(path: &Path) -> Result<ServiceConfig> {
    debug!(path = %path.display(), "loading configuration");
    ServiceConfig::load(path).with_context(|| format!("loading {}", path.display()))
}
