//! Host loop: owns the shared state, the REST server and the board display.
//!
//! Stands in for the kiosk's UI thread. Each tick it drains device commands
//! posted by HTTP handlers and, on the configured interval, renders the next
//! board page from a repository snapshot.

use anyhow::Result;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::{debug, info};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::core::board::{self, Pager, StatusSummary};
use crate::core::bridge::{ChannelBridge, DEFAULT_QUEUE_DEPTH, DeviceCommand};
use crate::core::repair::RepairRecord;
use crate::core::repository::RepairRepository;
use crate::server::{ApiServer, SharedDeviceState};

/// One rendered board page
#[derive(Debug, Clone)]
pub struct BoardFrame {
    pub page: usize,
    pub pages: usize,
    pub summary: StatusSummary,
    pub rows: Vec<RepairRecord>,
}

pub struct Host {
    settings: Settings,
    repository: Arc<RepairRepository>,
    device: Arc<SharedDeviceState>,
    bridge: ChannelBridge,
    commands: Receiver<DeviceCommand>,
    server: Option<ApiServer>,
    pager: Pager,
    captures: u64,
}

impl Host {
    pub fn new(settings: Settings) -> Self {
        let repository = Arc::new(if settings.demo_data {
            RepairRepository::with_records(board::demo_records())
        } else {
            RepairRepository::new()
        });
        let device = Arc::new(SharedDeviceState::default());
        let (bridge, commands) = ChannelBridge::new(DEFAULT_QUEUE_DEPTH);

        let server = settings.server.enabled.then(|| {
            ApiServer::new(settings.server.to_server_config())
                .with_repository(Arc::clone(&repository))
                .with_bridge(Arc::new(bridge.clone()))
                .with_device_state(Arc::clone(&device))
        });

        Self {
            pager: Pager::new(settings.display.items_per_page),
            settings,
            repository,
            device,
            bridge,
            commands,
            server,
            captures: 0,
        }
    }

    pub fn repository(&self) -> &Arc<RepairRepository> {
        &self.repository
    }

    pub fn device(&self) -> &Arc<SharedDeviceState> {
        &self.device
    }

    /// Local handle for posting device commands (same queue the API uses).
    pub fn bridge(&self) -> &ChannelBridge {
        &self.bridge
    }

    pub fn captures(&self) -> u64 {
        self.captures
    }

    /// Start the REST server if enabled. Returns its address.
    pub fn start(&mut self) -> Result<Option<SocketAddr>> {
        // This loop is the capture sink
        self.device.set_camera("connected");
        match self.server.as_mut() {
            Some(server) => {
                let addr = server.start()?;
                info!("Repair board API on http://{}", addr);
                Ok(Some(addr))
            }
            None => {
                info!("REST API server disabled");
                Ok(None)
            }
        }
    }

    pub fn shutdown(&mut self) {
        if let Some(server) = self.server.as_mut() {
            server.stop();
        }
        self.device.set_camera("disconnected");
    }

    /// Drain and apply all pending device commands. Returns how many ran.
    pub fn handle_device_commands(&mut self) -> usize {
        let commands: Vec<DeviceCommand> = self.commands.try_iter().collect();
        let count = commands.len();
        for cmd in commands {
            self.apply(cmd);
        }
        count
    }

    fn apply(&mut self, cmd: DeviceCommand) {
        log::trace!("Device command: {:?}", cmd);
        match cmd {
            DeviceCommand::Capture => {
                self.captures += 1;
                info!("Capture requested (#{})", self.captures);
            }
            DeviceCommand::Ticker(text) => {
                info!("Ticker text: {}", text);
                self.device.set_ticker(&text);
            }
        }
    }

    /// Render the current page and move the pager on.
    pub fn render_board(&mut self) -> BoardFrame {
        let sorted = board::order_for_display(self.repository.get_all());
        let summary = StatusSummary::from_records(&sorted);
        let rows = self.pager.current(&sorted).to_vec();
        let page = self.pager.page();
        let pages = self.pager.page_count(sorted.len());
        self.pager.advance(sorted.len());

        info!("Board [{}/{}] {}", page + 1, pages.max(1), summary);
        for r in &rows {
            debug!(
                "  {} {} {} finish={}",
                r.license_plate,
                r.car_model,
                r.status,
                r.estimated_finish_time().unwrap_or_else(|| "-".to_string())
            );
        }

        BoardFrame { page, pages, summary, rows }
    }

    /// Main loop. Runs until `run_for` elapses (forever when `None`).
    pub fn run(&mut self, run_for: Option<Duration>) -> Result<()> {
        let interval = Duration::from_millis(self.settings.display.interval_ms.max(100));
        let deadline = run_for.map(|d| Instant::now() + d);
        let mut next_render = Instant::now();

        loop {
            let now = Instant::now();
            if deadline.is_some_and(|d| now >= d) {
                break;
            }
            if now >= next_render {
                self.render_board();
                next_render = now + interval;
            }

            let mut wait = next_render.saturating_duration_since(now);
            if let Some(d) = deadline {
                wait = wait.min(d.saturating_duration_since(now));
            }
            match self.commands.recv_timeout(wait) {
                Ok(cmd) => {
                    self.apply(cmd);
                    self.handle_device_commands();
                }
                Err(RecvTimeoutError::Timeout) => {}
                // Host keeps a sender, so this only happens during teardown
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.shutdown();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bridge::EventBridge;
    use crate::core::repair::RepairStatus;

    fn offline_settings(demo: bool) -> Settings {
        let mut settings = Settings::default();
        settings.server.enabled = false;
        settings.demo_data = demo;
        settings
    }

    #[test]
    fn test_demo_seed() {
        assert_eq!(Host::new(offline_settings(true)).repository().len(), 10);
        assert!(Host::new(offline_settings(false)).repository().is_empty());
    }

    #[test]
    fn test_device_commands_applied() {
        let mut host = Host::new(offline_settings(false));
        host.bridge().post_capture();
        host.bridge().post_ticker_text("Oil change 20% off");
        host.bridge().post_capture();

        assert_eq!(host.handle_device_commands(), 3);
        assert_eq!(host.captures(), 2);
        assert_eq!(host.device().ticker(), "Oil change 20% off");
        assert_eq!(host.handle_device_commands(), 0);
    }

    #[test]
    fn test_board_pages_rotate() {
        let mut host = Host::new(offline_settings(true));
        let first = host.render_board();
        assert_eq!(first.pages, 3);
        assert_eq!(first.page, 0);
        assert_eq!(first.rows.len(), 4);
        // Completed cars lead
        assert_eq!(first.rows[0].status, RepairStatus::Completed);
        assert_eq!(first.summary.total(), 10);

        assert_eq!(host.render_board().page, 1);
        assert_eq!(host.render_board().rows.len(), 2);
        assert_eq!(host.render_board().page, 0);
    }

    #[test]
    fn test_board_sees_local_and_remote_edits() {
        let mut host = Host::new(offline_settings(false));
        assert!(host.render_board().rows.is_empty());

        host.repository()
            .add(RepairRecord::new("A1", "K3", RepairStatus::InProgress));
        host.repository()
            .update_status("A1", Some(RepairStatus::Completed), None);
        let frame = host.render_board();
        assert_eq!(frame.rows.len(), 1);
        assert_eq!(frame.summary.completed, 1);
    }

    #[test]
    fn test_run_with_server() {
        let mut settings = Settings::default();
        settings.server.bind = "127.0.0.1".to_string();
        settings.server.port = 0;
        settings.display.interval_ms = 100;

        let mut host = Host::new(settings);
        let addr = host.start().unwrap();
        assert!(addr.is_some());
        assert_eq!(host.device().camera(), "connected");

        host.bridge().post_ticker_text("hello");
        host.run(Some(Duration::from_millis(250))).unwrap();
        assert_eq!(host.device().ticker(), "hello");
        assert_eq!(host.device().camera(), "disconnected");
    }
}
