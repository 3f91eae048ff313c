use std::path::PathBuf;

use clap::Parser;
use roomtemp::influx::parse_tag;
use roomtemp::sensor::SYSFS_BASE;
use roomtemp::Error;

#[derive(Debug, Parser)]
pub struct Args {
    /// w1 device name, e.g. 28-0316a279. When omitted, every 28-* device on
    /// the bus is read.
    #[arg(long)]
    pub device: Option<String>,

    /// Room label for sensors without a map-file entry.
    #[arg(long)]
    pub room: Option<String>,

    /// JSON or whitespace-separated file mapping sensor id to room.
    #[arg(long)]
    pub map_file: Option<PathBuf>,

    #[arg(long, default_value = SYSFS_BASE)]
    pub sysfs_base: PathBuf,

    /// Seconds between cycles; 0 reads and writes once, then exits.
    #[arg(long, default_value_t = 0)]
    pub interval: u64,

    #[arg(long, default_value = "ds18b20")]
    pub measurement: String,

    /// Extra tag as key=value (repeatable).
    #[arg(long = "tag", value_parser = parse_tag)]
    pub tags: Vec<(String, String)>,

    #[arg(long, env = "INFLUX_URL", default_value = "http://localhost:8086")]
    pub influx_url: String,

    #[arg(long, env = "INFLUX_TOKEN", hide_env_values = true)]
    pub influx_token: Option<String>,

    #[arg(long, env = "INFLUX_ORG", default_value = "default")]
    pub influx_org: String,

    #[arg(long, env = "INFLUX_BUCKET", default_value = "sensors")]
    pub influx_bucket: String,
}

impl Args {
    /// The fallback room label, validated non-empty at startup so a broken
    /// label fails fast instead of surfacing after the bus was read.
    pub fn room_label(&self) -> Result<Option<&str>, Error> {
        let Some(room) = &self.room else {
            return Ok(None);
        };

        let room = room.trim();
        if room.is_empty() {
            return Err(Error::Config("room label must be non-empty".into()));
        }

        Ok(Some(room))
    }
}
