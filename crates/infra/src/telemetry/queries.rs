//! GraphQL documents and response decoding for the telemetry API
//!
//! Decoding works on `serde_json::Value` rather than typed structs: the
//! provider is inconsistent about numeric types (integers, floats and numeric
//! strings all occur), and a missing optional field must never fail a poll.

use chrono::{DateTime, Utc};
use mystar_domain::{CarSnapshot, ChargingStatus, MyStarError, Result, VehicleInfo};
use serde_json::Value;

/// Battery telematics for a list of VINs
pub const CAR_TELEMATICS_QUERY: &str = r"query CarTelematicsV2($vins: [String!]!) {
  carTelematicsV2(vins: $vins) {
    battery {
      vin
      batteryChargeLevelPercentage
      estimatedDistanceToEmptyKm
      estimatedDistanceToEmptyMiles
      chargingStatus
      estimatedChargingTimeToFullMinutes
      timestamp {
        seconds
      }
    }
  }
}";

/// All vehicles on the account with model and studio image
pub const CONSUMER_CARS_QUERY: &str = r"query GetConsumerCarsV2 {
  getConsumerCarsV2 {
    vin
    content {
      model { name }
      images {
        studio { url }
      }
    }
  }
}";

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn integer(value: Option<&Value>) -> Option<i64> {
    number(value).filter(|n| n.is_finite()).map(|n| n.round() as i64)
}

fn string(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Decode the `data` object of a `CarTelematicsV2` response.
///
/// The record whose `vin` equals `vin` is used; without one the first record
/// is taken. Vehicle metadata is left empty.
///
/// # Errors
/// [`MyStarError::Protocol`] when the battery list is missing or empty.
pub fn decode_telemetry(data: &Value, vin: &str, fetched_at: DateTime<Utc>) -> Result<CarSnapshot> {
    let records = data
        .pointer("/carTelematicsV2/battery")
        .and_then(Value::as_array)
        .ok_or_else(|| MyStarError::Protocol("telemetry response lacks carTelematicsV2.battery".into()))?;

    let battery = records
        .iter()
        .find(|record| record.get("vin").and_then(Value::as_str) == Some(vin))
        .or_else(|| records.first())
        .ok_or_else(|| MyStarError::Protocol(format!("no battery telemetry returned for {vin}")))?;

    let measured_at = integer(battery.pointer("/timestamp/seconds"))
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0));

    Ok(CarSnapshot {
        battery_percentage: number(battery.get("batteryChargeLevelPercentage")).unwrap_or(0.0),
        range_km: integer(battery.get("estimatedDistanceToEmptyKm")).unwrap_or(0),
        range_miles: integer(battery.get("estimatedDistanceToEmptyMiles")),
        charging_status: string(battery.get("chargingStatus"))
            .map(ChargingStatus::from)
            .unwrap_or_default(),
        charging_power_watts: None,
        estimated_charging_time_to_full_minutes: integer(
            battery.get("estimatedChargingTimeToFullMinutes"),
        ),
        image_url: None,
        model_name: None,
        measured_at,
        last_updated: fetched_at,
    })
}

/// Decode the `data` object of a `GetConsumerCarsV2` response for `vin`.
///
/// A VIN that is not on the account yields empty metadata.
///
/// # Errors
/// [`MyStarError::Protocol`] when the car list is missing.
pub fn decode_vehicle_info(data: &Value, vin: &str) -> Result<VehicleInfo> {
    let cars = data
        .get("getConsumerCarsV2")
        .and_then(Value::as_array)
        .ok_or_else(|| MyStarError::Protocol("car list response lacks getConsumerCarsV2".into()))?;

    let Some(content) = cars
        .iter()
        .find(|car| car.get("vin").and_then(Value::as_str) == Some(vin))
        .and_then(|car| car.get("content"))
    else {
        return Ok(VehicleInfo::default());
    };

    Ok(VehicleInfo {
        image_url: string(content.pointer("/images/studio/url")),
        model_name: string(content.pointer("/model/name")),
    })
}
