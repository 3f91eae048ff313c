use std::fmt;

use chrono::{DateTime, Utc};

/// Unit of the primary metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Celsius,
    Fahrenheit,
    Percent,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Celsius => "°C",
            Unit::Fahrenheit => "°F",
            Unit::Percent => "%",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One measurement taken from a sensor.
///
/// Created fresh on each invocation and discarded after a successful write;
/// the database is the only system of record. `device_id` and `room` must be
/// non-empty before a write point may be built from this (both are query
/// dimensions downstream). Absent optional fields are omitted from the
/// serialized field set, never written as zero.
#[derive(Debug, Clone)]
pub struct Reading {
    pub measured_at: DateTime<Utc>,

    pub device_id: String,

    pub room: String,

    /// Field key for the primary value, e.g. `temp_c`.
    pub metric: String,

    pub value: f64,

    pub unit: Unit,

    pub humidity_percent: Option<f64>,

    pub battery_percent: Option<u8>,

    pub rssi_dbm: Option<i16>,
}
