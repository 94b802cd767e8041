//! `biogate check`

use super::load_config;
use anyhow::{bail, Result};
use biogate_service::parse_sensor_configs;
use std::fmt::Write;
use std::path::Path;

/// Validate a configuration file. Fails if any sensor entry was rejected.
pub fn run(path: &Path) -> Result<String> {
    let config = load_config(path)?;
    let parsed = parse_sensor_configs(config.legacy_sensor_strings());

    let mut out = String::new();
    writeln!(out, "{}: configuration loaded", path.display())?;
    if config.legacy_transport_disabled {
        writeln!(out, "  legacy sensor list disabled")?;
    }
    writeln!(out, "  ui package: {}", config.ui_package)?;
    writeln!(out, "  sensors: {} parsed", parsed.descriptors.len())?;

    if parsed.rejected.is_empty() {
        return Ok(out);
    }
    for rejected in &parsed.rejected {
        writeln!(
            out,
            "  entry {} {:?}: {}",
            rejected.index, rejected.raw, rejected.reason
        )?;
    }
    bail!("{out}  {} sensor entries rejected", parsed.rejected.len())
}
