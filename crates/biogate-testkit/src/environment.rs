//! Mock device environment for notifier selection

use biogate_core::effects::{EnvironmentProbe, VendorCommand, VendorCommandSink};
use biogate_core::{BiometricError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory device tree
#[derive(Debug, Clone, Default)]
pub struct MockProbe {
    files: HashMap<String, Vec<String>>,
}

impl MockProbe {
    /// Empty device
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file with the given lines
    pub fn with_file(mut self, path: &str, lines: &[&str]) -> Self {
        self.files.insert(
            path.to_string(),
            lines.iter().map(|line| (*line).to_string()).collect(),
        );
        self
    }
}

impl EnvironmentProbe for MockProbe {
    fn path_exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn read_lines(&self, path: &str) -> Option<Vec<String>> {
        self.files.get(path).cloned()
    }
}

/// Sink that records every vendor command
#[derive(Debug, Clone, Default)]
pub struct RecordingCommandSink {
    state: Arc<Mutex<SinkState>>,
}

#[derive(Debug, Default)]
struct SinkState {
    commands: Vec<VendorCommand>,
    rejecting: bool,
}

impl RecordingCommandSink {
    /// Sink that accepts commands
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that records and then rejects every command
    pub fn rejecting() -> Self {
        let sink = Self::default();
        sink.state.lock().rejecting = true;
        sink
    }

    /// Commands sent so far
    pub fn commands(&self) -> Vec<VendorCommand> {
        self.state.lock().commands.clone()
    }
}

impl VendorCommandSink for RecordingCommandSink {
    fn send(&self, command: VendorCommand) -> Result<()> {
        let mut state = self.state.lock();
        state.commands.push(command);
        if state.rejecting {
            return Err(BiometricError::transport("vendor channel closed"));
        }
        Ok(())
    }
}
