use std::collections::HashMap;
use std::time::Duration;

use btleplug::{
    api::{Central, Manager as _, Peripheral, ScanFilter},
    platform::{Adapter, Manager},
};
use chrono::Utc;
use macaddr::MacAddr6;
use tokio::time::sleep;

use crate::error::Error;
use crate::sensor::{Reading, Unit};

// Ref: https://github.com/wcbonner/GoveeBTTempLogger#bluetooth-advertisement-format
const GOVEE_MANUFACTURER_DATA_COMPANY_ID: u16 = 0xec88;

const SCAN_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub struct DecodedMeasurement {
    pub temperature_celsius: f64,
    pub humidity_percent: f64,
    pub battery_percent: Option<u8>,
}

/// The Govee H5075 manufacturer-data payload, if the advertisement carries
/// one. Advertisements without it (e.g. scan responses) are not an error.
pub fn govee_manufacturer_data(manufacturer_data: &HashMap<u16, Vec<u8>>) -> Option<&[u8]> {
    manufacturer_data
        .get(&GOVEE_MANUFACTURER_DATA_COMPANY_ID)
        .map(Vec::as_slice)
}

/// Decode the H5075 packed-24 temperature/humidity format.
///
/// Bytes 1..4 hold a 24-bit big-endian value whose top bit is the
/// temperature sign. After clearing it, `temp_c = raw / 10000` and
/// `rh_% = (raw % 1000) / 10`. Byte 4 is the battery percentage; values
/// above 100 are reported by some firmware revisions and treated as absent.
///
/// Example: `00 01 3F 91 64 00` -> 8.1809 °C, 80.9 %RH, battery 100.
pub fn decode_packed24(payload: &[u8]) -> Result<DecodedMeasurement, Error> {
    if payload.len() < 5 {
        return Err(Error::Decode(format!(
            "Govee manufacturer data too short: expected at least 5 bytes, got {}",
            payload.len()
        )));
    }

    let raw = u32::from_be_bytes([0, payload[1], payload[2], payload[3]]);
    let negative = raw & 0x80_0000 != 0;
    let raw = raw & 0x7f_ffff;

    let magnitude = raw as f64 / 10_000.0;
    let temperature_celsius = if negative { -magnitude } else { magnitude };
    let humidity_percent = (raw % 1000) as f64 / 10.0;
    let battery_percent = (payload[4] <= 100).then_some(payload[4]);

    Ok(DecodedMeasurement {
        temperature_celsius,
        humidity_percent,
        battery_percent,
    })
}

/// A Govee H5075 thermometer/hygrometer read over BLE advertisements.
#[derive(Debug)]
pub struct GoveeBleSensor {
    pub address: MacAddr6,

    pub room: String,

    /// Scan window; no matching advertisement within it is a failure.
    pub timeout: Duration,
}

impl GoveeBleSensor {
    /// Scan for one advertisement from the configured address and decode it.
    ///
    /// The scan is stopped on every exit path; the adapter handle is owned
    /// for the duration of this call only.
    pub async fn read(&self) -> Result<Reading, Error> {
        let manager = Manager::new()
            .await
            .map_err(|e| Error::DeviceNotFound(format!("failed to initialize Bluetooth manager: {e}")))?;

        let adapters = manager
            .adapters()
            .await
            .map_err(|e| Error::DeviceNotFound(format!("failed to get Bluetooth adapters: {e}")))?;

        let adapter = adapters
            .into_iter()
            .next()
            .ok_or_else(|| Error::DeviceNotFound("no Bluetooth adapters found".into()))?;

        adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(|e| Error::DeviceNotFound(format!("failed to start BLE scan: {e}")))?;

        let result = self.wait_for_advertisement(&adapter).await;

        let _ = adapter.stop_scan().await;

        result
    }

    async fn wait_for_advertisement<S: AdvertisementSource>(
        &self,
        source: &S,
    ) -> Result<Reading, Error> {
        let deadline = tokio::time::Instant::now() + self.timeout;

        loop {
            sleep(SCAN_POLL_INTERVAL).await;

            if let Some(advertisement) = source.advertisement_from(self.address).await?
                && let Some(payload) = govee_manufacturer_data(&advertisement.manufacturer_data)
            {
                let decoded = decode_packed24(payload)?;

                return Ok(Reading {
                    measured_at: Utc::now(),
                    device_id: self.address.to_string(),
                    room: self.room.clone(),
                    metric: "temp_c".into(),
                    value: decoded.temperature_celsius,
                    unit: Unit::Celsius,
                    humidity_percent: Some(decoded.humidity_percent),
                    battery_percent: decoded.battery_percent,
                    rssi_dbm: advertisement.rssi,
                });
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(Error::DeviceNotFound(format!(
                    "no advertisement from {} within {:?}",
                    self.address, self.timeout
                )));
            }
        }
    }
}

#[derive(Debug)]
struct AdvertisementData {
    manufacturer_data: HashMap<u16, Vec<u8>>,
    rssi: Option<i16>,
}

/// Source of advertisement snapshots for one device address. The production
/// implementation is a scanning btleplug adapter.
trait AdvertisementSource {
    async fn advertisement_from(&self, address: MacAddr6)
    -> Result<Option<AdvertisementData>, Error>;
}

impl AdvertisementSource for Adapter {
    async fn advertisement_from(
        &self,
        address: MacAddr6,
    ) -> Result<Option<AdvertisementData>, Error> {
        let peripherals = self
            .peripherals()
            .await
            .map_err(|e| Error::DeviceNotFound(format!("failed to get BLE peripherals: {e}")))?;

        for peripheral in peripherals {
            let mac_address: MacAddr6 = peripheral.address().into_inner().into();
            if mac_address != address {
                continue;
            }

            let Ok(Some(properties)) = peripheral.properties().await else {
                continue;
            };

            return Ok(Some(AdvertisementData {
                manufacturer_data: properties.manufacturer_data,
                rssi: properties.rssi,
            }));
        }

        Ok(None)
    }
}
