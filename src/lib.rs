pub mod error;
pub mod influx;
pub mod sensor;

pub use error::Error;
