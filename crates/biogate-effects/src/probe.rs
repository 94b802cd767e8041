//! Filesystem-backed environment probe

use biogate_core::effects::EnvironmentProbe;
use std::fs;
use std::path::PathBuf;
use tracing::trace;

/// Probe that answers path queries under a root directory.
///
/// Rooting paths makes the probe usable against a captured device tree;
/// on the device itself the root is `/`.
#[derive(Debug, Clone)]
pub struct FilesystemProbe {
    root: PathBuf,
}

impl FilesystemProbe {
    /// Probe rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl Default for FilesystemProbe {
    fn default() -> Self {
        Self::new("/")
    }
}

impl EnvironmentProbe for FilesystemProbe {
    fn path_exists(&self, path: &str) -> bool {
        let resolved = self.resolve(path);
        let exists = resolved.exists();
        trace!(path = %resolved.display(), exists, "probed path");
        exists
    }

    fn read_lines(&self, path: &str) -> Option<Vec<String>> {
        let contents = fs::read_to_string(self.resolve(path)).ok()?;
        Some(
            contents
                .lines()
                .map(|line| line.trim_end().to_string())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_resolve_under_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sys/class")).unwrap();
        fs::write(dir.path().join("sys/class/state"), "1  \nignored\n").unwrap();

        let probe = FilesystemProbe::new(dir.path());
        assert!(probe.path_exists("/sys/class/state"));
        assert!(!probe.path_exists("/sys/class/missing"));
        assert_eq!(probe.read_lines("/sys/class/missing"), None);
        assert_eq!(
            probe.read_lines("/sys/class/state"),
            Some(vec!["1".to_string(), "ignored".to_string()])
        );
    }

    #[test]
    fn test_default_root_is_filesystem_root() {
        let probe = FilesystemProbe::default();
        assert_eq!(probe.resolve("/sys/class/state"), PathBuf::from("/sys/class/state"));
    }
}
