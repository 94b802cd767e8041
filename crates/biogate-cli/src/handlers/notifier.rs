//! `biogate notifier`

use anyhow::{ensure, Result};
use biogate_effects::{select_notifier, FilesystemProbe, LoggingCommandSink};
use std::path::Path;
use std::sync::Arc;

/// Probe the device tree under `root` and name the notifier it selects.
pub fn run(root: &Path) -> Result<String> {
    ensure!(root.is_dir(), "{} is not a directory", root.display());
    let probe = FilesystemProbe::new(root);
    let notifier = select_notifier(&probe, Arc::new(LoggingCommandSink));
    Ok(format!("{}: {}\n", root.display(), notifier.vendor()))
}
