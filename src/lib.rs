//! REPAIR-BOARD - kiosk repair-status board library
//!
//! Re-exports all modules for use by the binary target.

// Domain (records, store, time codec, device bridge, board)
pub mod core;

// REST control plane
pub mod server;

// App modules
pub mod app;
pub mod cli;
pub mod config;

// Re-export commonly used types
pub use crate::core::bridge::{ChannelBridge, DeviceCommand, EventBridge};
pub use crate::core::repair::{RepairRecord, RepairStatus};
pub use crate::core::repository::RepairRepository;
pub use server::{ApiServer, ServerConfig, ServerHandle};
