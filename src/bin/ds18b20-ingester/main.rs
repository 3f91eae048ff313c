mod args;
mod map;

use std::collections::HashMap;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context as _, Result};
use clap::Parser as _;
use roomtemp::error::{is_config_error, process_exit_code};
use roomtemp::influx::{InfluxConfig, InfluxWriter, Point};
use roomtemp::sensor::{self, Ds18b20Sensor, Sensor};
use roomtemp::Error;
use tokio::time::sleep;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::args::Args;
use crate::map::load_room_map;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("{e:#}");
        return ExitCode::from(process_exit_code(&e));
    }

    ExitCode::SUCCESS
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let config = InfluxConfig::new(
        &args.influx_url,
        args.influx_token.as_deref().unwrap_or(""),
        &args.influx_org,
        &args.influx_bucket,
    )?;
    let writer = InfluxWriter::new(config)?;
    let default_room = args.room_label()?.map(str::to_owned);

    let room_map = match &args.map_file {
        Some(path) => load_room_map(path).map_err(|e| Error::Config(format!("{e:#}")))?,
        None => HashMap::new(),
    };

    if room_map.is_empty() && default_room.is_none() {
        return Err(Error::Config("no room labels: pass --room or --map-file".into()).into());
    }

    let host = hostname::get().ok().and_then(|h| h.into_string().ok());

    if args.interval == 0 {
        return ingest_once(&args, &writer, &room_map, default_room.as_deref(), host.as_deref())
            .await;
    }

    let period = Duration::from_secs(args.interval);
    loop {
        let started = Instant::now();

        if let Err(e) =
            ingest_once(&args, &writer, &room_map, default_room.as_deref(), host.as_deref()).await
        {
            if is_config_error(&e) {
                return Err(e);
            }
            warn!("ingestion cycle failed: {e:#}");
        }

        sleep(period.saturating_sub(started.elapsed())).await;
    }
}

async fn ingest_once(
    args: &Args,
    writer: &InfluxWriter,
    room_map: &HashMap<String, String>,
    default_room: Option<&str>,
    host: Option<&str>,
) -> Result<()> {
    let device_ids = match &args.device {
        Some(device_id) => vec![device_id.clone()],
        None => sensor::discover(&args.sysfs_base)?,
    };

    let explicit_device = args.device.is_some();
    let mut points = Vec::with_capacity(device_ids.len());

    for device_id in &device_ids {
        let Some(room) = room_map
            .get(device_id)
            .cloned()
            .or_else(|| default_room.map(str::to_owned))
        else {
            if explicit_device {
                return Err(Error::Config(format!("no room label for sensor {device_id}")).into());
            }
            warn!(%device_id, "no room label for sensor, skipping");
            continue;
        };

        let ds18b20 = Sensor::Ds18b20(Ds18b20Sensor {
            device_id: device_id.clone(),
            room,
            base_dir: args.sysfs_base.clone(),
        });

        let reading = match ds18b20.read().await {
            Ok(reading) => reading,
            Err(e) if explicit_device => {
                return Err(e).with_context(|| format!("failed to read sensor {device_id}"));
            }
            Err(e) => {
                warn!(%device_id, "failed to read sensor: {e}");
                continue;
            }
        };

        let mut point = Point::from_reading(&args.measurement, &reading)?;
        if let Some(host) = host {
            point = point.tag("host", host);
        }
        for (key, value) in &args.tags {
            point = point.tag(key.as_str(), value.as_str());
        }

        info!(
            device_id = %reading.device_id,
            room = %reading.room,
            temp = %format_args!("{:.3} {}", reading.value, reading.unit),
            "read sensor"
        );
        points.push(point);
    }

    if points.is_empty() {
        return Err(Error::DeviceNotFound(format!(
            "no readable DS18B20 sensors under {}",
            args.sysfs_base.display()
        ))
        .into());
    }

    let count = points.len();
    writer
        .write(&points)
        .await
        .context("failed to write to InfluxDB")?;

    info!(count, "wrote measurements");

    Ok(())
}
