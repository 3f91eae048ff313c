use clap::Parser;
use macaddr::MacAddr6;
use roomtemp::influx::parse_tag;
use roomtemp::Error;

#[derive(Debug, Parser)]
pub struct Args {
    /// BLE address of the Govee H5075 to read.
    #[arg(long)]
    pub device: MacAddr6,

    /// Room label attached to every point.
    #[arg(long)]
    pub room: String,

    /// Scan window in seconds before the device counts as unreachable.
    #[arg(long, default_value_t = 8)]
    pub timeout: u64,

    /// Seconds between cycles; 0 reads and writes once, then exits.
    #[arg(long, default_value_t = 0)]
    pub interval: u64,

    #[arg(long, default_value = "govee_h5075")]
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
    /// The room label, validated non-empty at startup so a broken label
    /// fails fast instead of surfacing after the BLE scan.
    pub fn room_label(&self) -> Result<&str, Error> {
        let room = self.room.trim();
        if room.is_empty() {
            return Err(Error::Config("room label must be non-empty".into()));
        }

        Ok(room)
    }
}
