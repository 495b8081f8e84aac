//! Outbound device commands from HTTP handlers to the host application.
//!
//! Handlers never wait on the host: [`ChannelBridge`] uses a bounded channel and
//! `try_send`, so a full queue or a host that stopped draining only drops the
//! command (with a warning) instead of stalling the response.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use log::{debug, warn};

/// Default depth of the command queue.
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

/// Commands delivered to the host's event loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    /// Take a picture with the attached camera
    Capture,
    /// Replace the scrolling ticker text
    Ticker(String),
}

/// Sink for device commands. Calls must return promptly; delivery is
/// at-most-once and unacknowledged.
pub trait EventBridge: Send + Sync {
    fn post_capture(&self);
    fn post_ticker_text(&self, text: &str);
}

/// [`EventBridge`] backed by a bounded crossbeam channel.
#[derive(Debug, Clone)]
pub struct ChannelBridge {
    tx: Sender<DeviceCommand>,
}

impl ChannelBridge {
    /// Create the bridge and the receiver the host polls.
    pub fn new(depth: usize) -> (Self, Receiver<DeviceCommand>) {
        let (tx, rx) = bounded(depth.max(1));
        (Self { tx }, rx)
    }

    fn send(&self, cmd: DeviceCommand) {
        match self.tx.try_send(cmd) {
            Ok(()) => {}
            Err(TrySendError::Full(cmd)) => {
                warn!("Device command queue full, dropping {:?}", cmd);
            }
            Err(TrySendError::Disconnected(cmd)) => {
                warn!("Device command consumer gone, dropping {:?}", cmd);
            }
        }
    }
}

impl EventBridge for ChannelBridge {
    fn post_capture(&self) {
        debug!("Posting capture command");
        self.send(DeviceCommand::Capture);
    }

    fn post_ticker_text(&self, text: &str) {
        debug!("Posting ticker text ({} chars)", text.chars().count());
        self.send(DeviceCommand::Ticker(text.to_string()));
    }
}

/// Bridge that discards everything (no device attached).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBridge;

impl EventBridge for NullBridge {
    fn post_capture(&self) {
        debug!("No device attached, capture ignored");
    }

    fn post_ticker_text(&self, _text: &str) {
        debug!("No device attached, ticker ignored");
    }
}
