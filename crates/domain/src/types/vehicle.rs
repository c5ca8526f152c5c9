//! Vehicle telemetry types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Charging state reported by the provider.
///
/// Known provider strings map to dedicated variants; anything else is kept
/// verbatim in [`ChargingStatus::Unknown`] so new statuses never fail parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChargingStatus {
    Charging,
    SmartCharging,
    Done,
    Scheduled,
    Idle,
    Fault,
    Error,
    Discharging,
    Unknown(String),
}

impl ChargingStatus {
    /// Raw provider value
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Charging => "CHARGING_STATUS_CHARGING",
            Self::SmartCharging => "CHARGING_STATUS_SMART_CHARGING",
            Self::Done => "CHARGING_STATUS_DONE",
            Self::Scheduled => "CHARGING_STATUS_SCHEDULED",
            Self::Idle => "CHARGING_STATUS_IDLE",
            Self::Fault => "CHARGING_STATUS_FAULT",
            Self::Error => "CHARGING_STATUS_ERROR",
            Self::Discharging => "CHARGING_STATUS_DISCHARGING",
            Self::Unknown(raw) => raw,
        }
    }

    /// Short human readable label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Charging | Self::SmartCharging => "Charging",
            Self::Done => "Done",
            Self::Scheduled => "Scheduled",
            Self::Idle => "Idle",
            Self::Fault | Self::Error => "Error",
            Self::Discharging => "Discharging",
            Self::Unknown(_) => "Unknown",
        }
    }

    #[must_use]
    pub const fn is_charging(&self) -> bool {
        matches!(self, Self::Charging | Self::SmartCharging)
    }
}

impl From<&str> for ChargingStatus {
    fn from(raw: &str) -> Self {
        match raw {
            "CHARGING_STATUS_CHARGING" => Self::Charging,
            "CHARGING_STATUS_SMART_CHARGING" => Self::SmartCharging,
            "CHARGING_STATUS_DONE" => Self::Done,
            "CHARGING_STATUS_SCHEDULED" => Self::Scheduled,
            "CHARGING_STATUS_IDLE" => Self::Idle,
            "CHARGING_STATUS_FAULT" => Self::Fault,
            "CHARGING_STATUS_ERROR" => Self::Error,
            "CHARGING_STATUS_DISCHARGING" => Self::Discharging,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<String> for ChargingStatus {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<ChargingStatus> for String {
    fn from(status: ChargingStatus) -> Self {
        match status {
            ChargingStatus::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl Default for ChargingStatus {
    fn default() -> Self {
        Self::Unknown("Unknown".to_string())
    }
}

impl fmt::Display for ChargingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vehicle metadata from the account's car list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleInfo {
    pub image_url: Option<String>,
    pub model_name: Option<String>,
}

/// One successful telemetry poll.
///
/// Produced atomically per poll and replaces the previous snapshot wholesale.
/// Handed to callers by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarSnapshot {
    pub battery_percentage: f64,
    pub range_km: i64,
    pub range_miles: Option<i64>,
    pub charging_status: ChargingStatus,
    pub charging_power_watts: Option<i64>,
    pub estimated_charging_time_to_full_minutes: Option<i64>,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    pub model_name: Option<String>,
    /// When the provider measured the values, if reported
    pub measured_at: Option<DateTime<Utc>>,
    /// When this snapshot was fetched
    pub last_updated: DateTime<Utc>,
}

impl CarSnapshot {
    /// Attach vehicle metadata fetched separately from the telemetry query.
    #[must_use]
    pub fn with_vehicle(mut self, vehicle: &VehicleInfo) -> Self {
        self.image_url.clone_from(&vehicle.image_url);
        self.model_name.clone_from(&vehicle.model_name);
        self
    }

    /// Minutes until full, treating finished or idle charging as zero.
    #[must_use]
    pub fn remaining_charge_minutes(&self) -> i64 {
        match self.charging_status {
            ChargingStatus::Done | ChargingStatus::Idle => 0,
            _ => self.estimated_charging_time_to_full_minutes.unwrap_or(0).max(0),
        }
    }
}
