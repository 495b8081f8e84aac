//! Wire types for the REST API.
//!
//! Request decoding is lenient: unknown fields are ignored and optional fields
//! default, so older and newer clients keep working. `requestedTime` is never
//! read from a client; it is stamped from the server clock on create.

use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use crate::core::repair::{RepairRecord, RepairStatus};
use crate::core::time_codec::{self, TimeParseError, TimeUnit};

/// Uniform response envelope for the `/api` routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: &str, data: T) -> Self {
        Self { success: true, message: message.to_string(), data: Some(data) }
    }
}

impl ApiResponse<()> {
    pub fn ok_msg(message: &str) -> Self {
        Self { success: true, message: message.to_string(), data: None }
    }

    pub fn err(message: &str) -> Self {
        Self { success: false, message: message.to_string(), data: None }
    }
}

/// Body of POST /api/car-repair and PUT /api/car-repair/{plate}
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairRequest {
    #[serde(default)]
    pub license_plate_number: String,
    pub car_model: String,
    #[serde(default)]
    pub repair_status: Option<String>,
    #[serde(default)]
    pub estimated_finish_time: Option<String>,
}

impl RepairRequest {
    /// Build the domain record. `requested_at` comes from the caller (server
    /// clock), not from the body.
    pub fn to_record(&self, requested_at: Option<u32>) -> Result<RepairRecord, TimeParseError> {
        let status = self
            .repair_status
            .as_deref()
            .map(RepairStatus::from_wire)
            .unwrap_or_default();
        let finish =
            time_codec::parse_optional(self.estimated_finish_time.as_deref(), TimeUnit::Minutes)?;

        Ok(RepairRecord::new(self.license_plate_number.trim(), self.car_model.as_str(), status)
            .with_requested_at(requested_at)
            .with_estimated_finish_at(finish))
    }
}

/// Record as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairResponse {
    pub license_plate_number: String,
    pub car_model: String,
    pub repair_status: RepairStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_finish_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_time: Option<String>,
}

impl From<&RepairRecord> for RepairResponse {
    fn from(r: &RepairRecord) -> Self {
        Self {
            license_plate_number: r.license_plate.clone(),
            car_model: r.car_model.clone(),
            repair_status: r.status,
            estimated_finish_time: r.estimated_finish_time(),
            requested_time: r.requested_time(),
        }
    }
}

/// Body of POST /ticker
#[derive(Debug, Clone, Deserialize)]
pub struct TickerRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerResponse {
    pub status: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureResponse {
    pub result: String,
}

/// GET /status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub camera: String,
}

/// Device state readable by API handlers (updated by the host loop)
pub struct SharedDeviceState {
    camera: RwLock<String>,
    ticker: RwLock<String>,
}

impl Default for SharedDeviceState {
    fn default() -> Self {
        Self {
            camera: RwLock::new("unknown".to_string()),
            ticker: RwLock::new(String::new()),
        }
    }
}

impl SharedDeviceState {
    pub fn set_camera(&self, state: &str) {
        *self.camera.write().unwrap_or_else(|e| e.into_inner()) = state.to_string();
    }

    pub fn camera(&self) -> String {
        self.camera.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set_ticker(&self, text: &str) {
        *self.ticker.write().unwrap_or_else(|e| e.into_inner()) = text.to_string();
    }

    pub fn ticker(&self) -> String {
        self.ticker.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
