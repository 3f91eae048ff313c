use crate::error::Error;

/// InfluxDB v2 connection settings, built once at process start and passed
/// explicitly to the writer. No component reads the environment after this.
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
}

impl InfluxConfig {
    /// Validate every component before any hardware access happens.
    pub fn new(url: &str, token: &str, org: &str, bucket: &str) -> Result<Self, Error> {
        if url.trim().is_empty() {
            return Err(Error::Config(
                "missing InfluxDB URL: set --influx-url or INFLUX_URL".into(),
            ));
        }
        if token.trim().is_empty() {
            return Err(Error::Config(
                "missing InfluxDB token: set --influx-token or INFLUX_TOKEN".into(),
            ));
        }
        if org.trim().is_empty() {
            return Err(Error::Config(
                "missing InfluxDB organization: set --influx-org or INFLUX_ORG".into(),
            ));
        }
        if bucket.trim().is_empty() {
            return Err(Error::Config(
                "missing InfluxDB bucket: set --influx-bucket or INFLUX_BUCKET".into(),
            ));
        }

        Ok(Self {
            url: url.trim_end_matches('/').to_owned(),
            token: token.to_owned(),
            org: org.to_owned(),
            bucket: bucket.to_owned(),
        })
    }

    pub fn write_url(&self) -> String {
        format!("{}/api/v2/write", self.url)
    }
}
