//! Vendor notifier strategies
//!
//! Exactly one notifier is chosen at startup by [`select_notifier`]. The router
//! only ever sees `Arc<dyn SensorNotifier>` and never branches on vendor.
//!
//! Notifiers never fail the service: a command the sink rejects is logged and
//! dropped.

use biogate_core::effects::{EnvironmentProbe, SensorNotifier, VendorCommand, VendorCommandSink};
use biogate_core::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Touch panel command list advertising under-display fingerprint support
pub const TOUCH_PANEL_COMMAND_LIST: &str = "/sys/devices/virtual/sec/tsp/cmd_list";
/// Display node that flips to `1` once the sensor spot is lit
pub const SPOT_ON_ACHIEVED: &str = "/sys/class/drm/spot_on_achieved";

const FOD_ENABLE_COMMAND: &str = "fod_enable";
const FOD_ENABLE_ARGS: &str = "fod_enable,1,1,0";
const DAEMON_SPOT_READY: u32 = 200_002;

/// No-op notifier for devices without vendor hooks.
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackNotifier;

impl SensorNotifier for FallbackNotifier {
    fn vendor(&self) -> &'static str {
        "fallback"
    }

    fn on_service_started(&self) {}

    fn on_finger_state(&self, _pressed: bool) {}
}

/// Notifier for panels driven through a touch-panel command interface.
pub struct TouchPanelNotifier {
    sink: Arc<dyn VendorCommandSink>,
}

impl TouchPanelNotifier {
    /// Create a notifier writing to `sink`
    pub fn new(sink: Arc<dyn VendorCommandSink>) -> Self {
        Self { sink }
    }
}

impl SensorNotifier for TouchPanelNotifier {
    fn vendor(&self) -> &'static str {
        "touch-panel"
    }

    fn on_service_started(&self) {
        send_or_log(
            self.sink.as_ref(),
            VendorCommand::TouchPanel(FOD_ENABLE_ARGS.to_string()),
        );
    }

    fn on_finger_state(&self, pressed: bool) {
        send_or_log(self.sink.as_ref(), VendorCommand::FingerState { pressed });
    }
}

/// Notifier for sensors whose daemon must be told when the spot is lit.
///
/// Only the released → pressed edge produces a command.
pub struct SpotDaemonNotifier {
    sink: Arc<dyn VendorCommandSink>,
    was_on: AtomicBool,
}

impl SpotDaemonNotifier {
    /// Create a notifier writing to `sink`
    pub fn new(sink: Arc<dyn VendorCommandSink>) -> Self {
        Self {
            sink,
            was_on: AtomicBool::new(false),
        }
    }
}

impl SensorNotifier for SpotDaemonNotifier {
    fn vendor(&self) -> &'static str {
        "spot-daemon"
    }

    fn on_service_started(&self) {
        debug!("spot daemon notifier armed");
    }

    fn on_finger_state(&self, pressed: bool) {
        let was_on = self.was_on.swap(pressed, Ordering::AcqRel);
        if pressed && !was_on {
            send_or_log(
                self.sink.as_ref(),
                VendorCommand::Daemon {
                    code: DAEMON_SPOT_READY,
                },
            );
        }
    }
}

/// Sink that logs each command and delivers nothing.
///
/// Used where no vendor channel is attached, such as dry runs against a
/// captured device tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingCommandSink;

impl VendorCommandSink for LoggingCommandSink {
    fn send(&self, command: VendorCommand) -> Result<()> {
        info!(?command, "vendor command");
        Ok(())
    }
}

fn send_or_log(sink: &dyn VendorCommandSink, command: VendorCommand) {
    if let Err(err) = sink.send(command.clone()) {
        warn!(?command, error = %err, "vendor command failed");
    }
}

/// Pick the notifier for this device.
///
/// Probes are evaluated in a fixed order; the first match wins.
pub fn select_notifier(
    probe: &dyn EnvironmentProbe,
    sink: Arc<dyn VendorCommandSink>,
) -> Arc<dyn SensorNotifier> {
    let has_fod_command = probe
        .read_lines(TOUCH_PANEL_COMMAND_LIST)
        .is_some_and(|lines| lines.iter().any(|line| line == FOD_ENABLE_COMMAND));

    let notifier: Arc<dyn SensorNotifier> = if has_fod_command {
        Arc::new(TouchPanelNotifier::new(sink))
    } else if probe.path_exists(SPOT_ON_ACHIEVED) {
        Arc::new(SpotDaemonNotifier::new(sink))
    } else {
        Arc::new(FallbackNotifier)
    };

    info!(vendor = notifier.vendor(), "selected sensor notifier");
    notifier
}
