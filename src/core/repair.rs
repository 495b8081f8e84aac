//! Repair record entity and its status.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::time_codec::{self, TimeUnit};

/// Where a vehicle is in the shop.
///
/// Transitions are unrestricted: a client may move a record from any state to
/// any other (e.g. back from `Completed` to `InProgress` after a recheck).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepairStatus {
    #[default]
    InProgress,
    FinalInspection,
    Completed,
}

impl RepairStatus {
    pub const ALL: [RepairStatus; 3] = [
        RepairStatus::InProgress,
        RepairStatus::FinalInspection,
        RepairStatus::Completed,
    ];

    /// Wire name (`IN_PROGRESS`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            RepairStatus::InProgress => "IN_PROGRESS",
            RepairStatus::FinalInspection => "FINAL_INSPECTION",
            RepairStatus::Completed => "COMPLETED",
        }
    }

    /// Case-insensitive lookup. Unknown strings fall back to `InProgress`.
    pub fn from_wire(s: &str) -> Self {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .unwrap_or_else(|| {
                log::debug!("Unknown repair status '{}', using IN_PROGRESS", s);
                RepairStatus::InProgress
            })
    }
}

impl fmt::Display for RepairStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One vehicle tracked by the board, keyed by license plate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairRecord {
    pub license_plate: String,
    pub car_model: String,
    pub status: RepairStatus,
    /// Seconds since midnight when the repair was requested
    pub requested_at: Option<u32>,
    /// Minutes since midnight the work is expected to finish
    pub estimated_finish_at: Option<u32>,
}

impl RepairRecord {
    pub fn new(
        license_plate: impl Into<String>,
        car_model: impl Into<String>,
        status: RepairStatus,
    ) -> Self {
        Self {
            license_plate: license_plate.into(),
            car_model: car_model.into(),
            status,
            requested_at: None,
            estimated_finish_at: None,
        }
    }

    pub fn with_requested_at(mut self, seconds: Option<u32>) -> Self {
        self.requested_at = seconds;
        self
    }

    pub fn with_estimated_finish_at(mut self, minutes: Option<u32>) -> Self {
        self.estimated_finish_at = minutes;
        self
    }

    pub fn requested_time(&self) -> Option<String> {
        self.requested_at
            .map(|v| time_codec::format_time_of_day(v, TimeUnit::Seconds))
    }

    pub fn estimated_finish_time(&self) -> Option<String> {
        self.estimated_finish_at
            .map(|v| time_codec::format_time_of_day(v, TimeUnit::Minutes))
    }
}

/// Repository key form of a plate: trimmed, uppercased.
pub fn normalize_plate(plate: &str) -> String {
    plate.trim().to_uppercase()
}
