//! Vendor notifier interfaces
//!
//! Some sensors want a side-channel nudge (touch-panel commands, finger state)
//! that has nothing to do with routing. Those nudges are expressed as
//! [`VendorCommand`] values handed to a [`VendorCommandSink`]; which notifier
//! emits them is decided once at startup from [`EnvironmentProbe`] answers.

use crate::errors::Result;
use serde::{Deserialize, Serialize};

/// Side-channel command for vendor sensor firmware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VendorCommand {
    /// Raw command line for a touch panel command interface
    TouchPanel(String),
    /// Finger pressed/released on an under-display sensor
    FingerState {
        /// Finger is on the sensor
        pressed: bool,
    },
    /// Numeric command for a fingerprint daemon
    Daemon {
        /// Command code
        code: u32,
    },
}

/// Delivers vendor commands to whatever hardware channel exists.
pub trait VendorCommandSink: Send + Sync {
    /// Send one command.
    fn send(&self, command: VendorCommand) -> Result<()>;
}

/// Read-only view of the device environment used to pick a notifier.
pub trait EnvironmentProbe: Send + Sync {
    /// Returns `true` if the path exists.
    fn path_exists(&self, path: &str) -> bool;

    /// Lines of a file, if readable.
    fn read_lines(&self, path: &str) -> Option<Vec<String>>;
}

/// Vendor hook invoked at well-defined points of the service lifecycle.
pub trait SensorNotifier: Send + Sync {
    /// Short vendor name for logs
    fn vendor(&self) -> &'static str;

    /// The service finished registering authenticators.
    fn on_service_started(&self);

    /// An under-display sensor reported a finger press or release.
    fn on_finger_state(&self, pressed: bool);
}
