mod govee;
mod onewire;
mod reading;

pub use govee::*;
pub use onewire::*;
pub use reading::*;

use crate::error::Error;

/// Closed set of supported sensors, selected by explicit configuration.
#[derive(Debug)]
pub enum Sensor {
    GoveeBle(GoveeBleSensor),
    Ds18b20(Ds18b20Sensor),
}

impl Sensor {
    /// Take exactly one reading from the sensor, or fail.
    pub async fn read(&self) -> Result<Reading, Error> {
        match self {
            Sensor::GoveeBle(sensor) => sensor.read().await,
            Sensor::Ds18b20(sensor) => sensor.read(),
        }
    }
}
