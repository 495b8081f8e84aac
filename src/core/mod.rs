//! Core domain modules - records, store, time codec, device bridge, board
//!
//! These modules hold the business state, independent of HTTP and of the host loop.

pub mod board;
pub mod bridge;
pub mod repair;
pub mod repository;
pub mod time_codec;

// Re-exports for convenience
pub use board::{Pager, StatusSummary, order_for_display};
pub use bridge::{ChannelBridge, DeviceCommand, EventBridge, NullBridge};
pub use repair::{RepairRecord, RepairStatus, normalize_plate};
pub use repository::RepairRepository;
pub use time_codec::{TimeParseError, TimeUnit};
