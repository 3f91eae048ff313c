use std::time::Duration;

use crate::error::Error;
use crate::influx::{InfluxConfig, Point};

// One write attempt per invocation; a hung endpoint must not outlive the
// scheduler's next run.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Writes line-protocol points to the InfluxDB v2 `/api/v2/write` endpoint.
///
/// At-most-once delivery: a single HTTP POST per call, no retry, no
/// batching across calls, no buffering on failure. A failed write is
/// reported to the invoker and recovery is the next scheduled invocation.
#[derive(Debug)]
pub struct InfluxWriter {
    client: reqwest::Client,
    config: InfluxConfig,
}

impl InfluxWriter {
    pub fn new(config: InfluxConfig) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Write all points in one request. Empty input is a no-op.
    pub async fn write(&self, points: &[Point]) -> Result<(), Error> {
        let body = points
            .iter()
            .map(Point::to_line)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if body.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .post(self.config.write_url())
            .query(&[
                ("org", self.config.org.as_str()),
                ("bucket", self.config.bucket.as_str()),
                ("precision", "ns"),
            ])
            .header("Authorization", format!("Token {}", self.config.token))
            .body(body)
            .send()
            .await
            .map_err(|e| Error::WriteUnavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_client_error() {
            Err(Error::WriteRejected {
                status: status.as_u16(),
                body,
            })
        } else {
            Err(Error::WriteUnavailable(format!("HTTP {}: {body}", status.as_u16())))
        }
    }
}
