use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::Error;
use crate::sensor::{Reading, Unit};

/// Default mount point of the Linux w1 bus.
pub const SYSFS_BASE: &str = "/sys/bus/w1/devices";

// DS18B20 family code prefix in w1 device names.
const DS18B20_PREFIX: &str = "28-";

// w1_therm reports millidegrees Celsius.
const MILLIDEGREES_PER_DEGREE: f64 = 1000.0;

// Power-on default of the DS18B20 temperature register (85 °C). A read that
// returns it means the conversion never ran, so it must not be taken as a
// real 85 °C measurement.
const POWER_ON_SENTINEL_MILLIDEGREES: i32 = 85_000;

/// A DS18B20 temperature sensor exposed through the w1_therm sysfs driver.
#[derive(Debug)]
pub struct Ds18b20Sensor {
    /// w1 device name, e.g. `28-0316a279`.
    pub device_id: String,

    pub room: String,

    pub base_dir: PathBuf,
}

impl Ds18b20Sensor {
    pub fn slave_path(&self) -> PathBuf {
        self.base_dir.join(&self.device_id).join("w1_slave")
    }

    /// Read and decode the sensor's `w1_slave` file.
    pub fn read(&self) -> Result<Reading, Error> {
        let path = self.slave_path();

        let content = fs::read_to_string(&path).map_err(|e| {
            Error::DeviceNotFound(format!("failed to read {}: {e}", path.display()))
        })?;

        let temperature_celsius = parse_w1_slave(&content)?;

        Ok(Reading {
            measured_at: Utc::now(),
            device_id: self.device_id.clone(),
            room: self.room.clone(),
            metric: "temp_c".into(),
            value: temperature_celsius,
            unit: Unit::Celsius,
            humidity_percent: None,
            battery_percent: None,
            rssi_dbm: None,
        })
    }
}

/// Decode the two-line `w1_slave` format:
///
/// ```text
/// 6e 01 4b 46 7f ff 02 10 1c : crc=1c YES
/// 6e 01 4b 46 7f ff 02 10 1c t=22937
/// ```
///
/// The first line must end in `YES` (CRC passed); the second carries the
/// temperature in millidegrees after `t=`.
pub fn parse_w1_slave(content: &str) -> Result<f64, Error> {
    let mut lines = content.lines();

    let crc_line = lines
        .next()
        .ok_or_else(|| Error::Decode("w1_slave content is empty".into()))?;
    if !crc_line.trim_end().ends_with("YES") {
        return Err(Error::Decode(format!("CRC check failed: {crc_line}")));
    }

    let data_line = lines
        .next()
        .ok_or_else(|| Error::Decode("w1_slave data line is missing".into()))?;
    let t_pos = data_line
        .rfind("t=")
        .ok_or_else(|| Error::Decode(format!("no t= marker in data line: {data_line}")))?;

    let millidegrees: i32 = data_line[t_pos + 2..]
        .trim()
        .parse()
        .map_err(|_| Error::Decode(format!("malformed temperature in data line: {data_line}")))?;

    if millidegrees == POWER_ON_SENTINEL_MILLIDEGREES {
        return Err(Error::Decode(
            "sensor returned the 85000 power-on default, conversion did not run".into(),
        ));
    }

    Ok(millidegrees as f64 / MILLIDEGREES_PER_DEGREE)
}

/// Enumerate DS18B20 device names (`28-*`) on the w1 bus, sorted.
pub fn discover(base_dir: &Path) -> Result<Vec<String>, Error> {
    let entries = fs::read_dir(base_dir).map_err(|e| {
        Error::DeviceNotFound(format!(
            "one-wire bus not available at {}: {e}",
            base_dir.display()
        ))
    })?;

    let mut device_ids = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            Error::DeviceNotFound(format!("failed to list {}: {e}", base_dir.display()))
        })?;

        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };

        if name.starts_with(DS18B20_PREFIX) && entry.path().is_dir() {
            device_ids.push(name.to_owned());
        }
    }

    device_ids.sort();

    Ok(device_ids)
}
