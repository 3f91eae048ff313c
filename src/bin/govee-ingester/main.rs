mod args;

use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context as _, Result};
use clap::Parser as _;
use roomtemp::error::{is_config_error, process_exit_code};
use roomtemp::influx::{InfluxConfig, InfluxWriter, Point};
use roomtemp::sensor::{GoveeBleSensor, Sensor};
use tokio::time::sleep;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::args::Args;

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
    let room = args.room_label()?.to_owned();

    let host = hostname::get().ok().and_then(|h| h.into_string().ok());

    let sensor = Sensor::GoveeBle(GoveeBleSensor {
        address: args.device,
        room,
        timeout: Duration::from_secs(args.timeout),
    });

    if args.interval == 0 {
        return ingest_once(&sensor, &writer, &args, host.as_deref()).await;
    }

    let period = Duration::from_secs(args.interval);
    loop {
        let started = Instant::now();

        if let Err(e) = ingest_once(&sensor, &writer, &args, host.as_deref()).await {
            if is_config_error(&e) {
                return Err(e);
            }
            warn!("ingestion cycle failed: {e:#}");
        }

        sleep(period.saturating_sub(started.elapsed())).await;
    }
}

async fn ingest_once(
    sensor: &Sensor,
    writer: &InfluxWriter,
    args: &Args,
    host: Option<&str>,
) -> Result<()> {
    let reading = sensor
        .read()
        .await
        .with_context(|| format!("failed to read Govee sensor {}", args.device))?;

    let mut point = Point::from_reading(&args.measurement, &reading)?;
    if let Some(host) = host {
        point = point.tag("host", host);
    }
    for (key, value) in &args.tags {
        point = point.tag(key.as_str(), value.as_str());
    }

    writer
        .write(std::slice::from_ref(&point))
        .await
        .context("failed to write to InfluxDB")?;

    info!(
        device_id = %reading.device_id,
        room = %reading.room,
        temp = %format_args!("{:.2} {}", reading.value, reading.unit),
        humidity_pct = ?reading.humidity_percent,
        battery_pct = ?reading.battery_percent,
        "wrote measurement"
    );

    Ok(())
}
