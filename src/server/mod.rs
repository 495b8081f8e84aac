//! REST control plane for the repair board.
//!
//! # Purpose
//!
//! Lets external clients (companion display, technician tablet, dashboards)
//! read and edit repair records and send device commands while the host loop
//! keeps using the same state locally.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────┐    Arc<RepairRepository>    ┌──────────────────────┐
//! │   API Server Threads    │  ◀───── shared store ─────▶ │   Host Loop          │
//! │   (rouille HTTP pool)   │                             │   (board display)    │
//! │                         │    crossbeam bounded chan   │                      │
//! │  POST /camera/capture   │  ── DeviceCommand ───────▶  │  capture pipeline    │
//! │  POST /ticker           │  ── Ticker(text) ────────▶  │  ticker text         │
//! └─────────────────────────┘                             └──────────────────────┘
//!          │                                                      │
//!          │  Arc<SharedDeviceState>                              │
//!          │◀──────────── camera state ───────────────────────────│
//! ```
//!
//! - **rouille** - sync HTTP server with a worker pool
//! - **EventBridge** - non-blocking commands from handlers to the host
//! - **SharedDeviceState** - device state written by the host, read by `/status`
//!
//! # Endpoints
//!
//! | Method | Path                      | Description                     |
//! |--------|---------------------------|---------------------------------|
//! | GET    | `/`                       | Greeting text                   |
//! | GET    | `/status`                 | Server + camera state           |
//! | POST   | `/camera/capture`         | Request a capture               |
//! | POST   | `/ticker`                 | Set ticker text (JSON body)     |
//! | GET    | `/api/car-repair`         | List all repair records         |
//! | GET    | `/api/car-repair/{plate}` | One record                      |
//! | POST   | `/api/car-repair`         | Create record (201 / 409)       |
//! | PUT    | `/api/car-repair/{plate}` | Replace record, path plate wins |
//! | DELETE | `/api/car-repair/{plate}` | Delete record                   |

mod api;
pub mod dto;
mod error;

pub use api::{ApiServer, Clock, ServerConfig, ServerHandle, local_seconds_of_day};
pub use dto::{ApiResponse, RepairRequest, RepairResponse, SharedDeviceState};
pub use error::ApiError;
