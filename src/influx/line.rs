use chrono::Utc;
use indexmap::IndexMap;

use crate::error::Error;
use crate::sensor::Reading;

/// A line-protocol field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    Boolean(bool),
    Text(String),
}

/// One line-protocol point: measurement, tag set, field set, timestamp.
///
/// Tags and fields keep insertion order. A missing timestamp is filled with
/// the current time when the line is rendered.
#[derive(Debug, Clone)]
pub struct Point {
    measurement: String,
    tags: IndexMap<String, String>,
    fields: IndexMap<String, FieldValue>,
    timestamp_ns: Option<i64>,
}

impl Point {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: IndexMap::new(),
            fields: IndexMap::new(),
            timestamp_ns: None,
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn timestamp_ns(mut self, timestamp_ns: i64) -> Self {
        self.timestamp_ns = Some(timestamp_ns);
        self
    }

    /// Build a point from a reading.
    ///
    /// `device_id` and `room` become the tag set and must be non-empty; they
    /// are the query dimensions every dashboard filters on. Optional fields
    /// that are absent from the reading are omitted, not zeroed.
    pub fn from_reading(measurement: &str, reading: &Reading) -> Result<Self, Error> {
        if reading.device_id.trim().is_empty() {
            return Err(Error::Config("reading has an empty device identifier".into()));
        }
        if reading.room.trim().is_empty() {
            return Err(Error::Config("reading has an empty room label".into()));
        }

        let timestamp_ns = reading
            .measured_at
            .timestamp_nanos_opt()
            .ok_or_else(|| Error::Decode("reading timestamp out of range".into()))?;

        let mut point = Point::new(measurement)
            .tag("device_id", reading.device_id.as_str())
            .tag("room", reading.room.as_str())
            .field(reading.metric.as_str(), FieldValue::Float(reading.value));

        if let Some(humidity) = reading.humidity_percent {
            point = point.field("humidity_pct", FieldValue::Float(humidity));
        }
        if let Some(battery) = reading.battery_percent {
            point = point.field("battery_pct", FieldValue::Integer(battery as i64));
        }
        if let Some(rssi) = reading.rssi_dbm {
            point = point.field("rssi_dbm", FieldValue::Integer(rssi as i64));
        }

        Ok(point.timestamp_ns(timestamp_ns))
    }

    /// Render as one line-protocol record:
    /// `measurement,tag=val field=val timestamp`.
    ///
    /// Empty tag keys or values and non-finite float fields are dropped. An
    /// empty field set renders to an empty string, which the writer skips.
    pub fn to_line(&self) -> String {
        let mut line = escape_measurement(&self.measurement);

        for (key, value) in &self.tags {
            if key.is_empty() || value.is_empty() {
                continue;
            }
            line.push(',');
            line.push_str(&escape_key(key));
            line.push('=');
            line.push_str(&escape_key(value));
        }

        let mut fields = Vec::with_capacity(self.fields.len());
        for (key, value) in &self.fields {
            let rendered = match value {
                FieldValue::Float(v) if !v.is_finite() => continue,
                FieldValue::Float(v) => format!("{v}"),
                FieldValue::Integer(v) => format!("{v}i"),
                FieldValue::Boolean(v) => format!("{v}"),
                FieldValue::Text(v) => format!("\"{}\"", escape_text_field(v)),
            };
            fields.push(format!("{}={rendered}", escape_key(key)));
        }

        if fields.is_empty() {
            return String::new();
        }

        line.push(' ');
        line.push_str(&fields.join(","));
        line.push(' ');

        let timestamp_ns = self
            .timestamp_ns
            .or_else(|| Utc::now().timestamp_nanos_opt())
            .unwrap_or_default();
        line.push_str(&timestamp_ns.to_string());

        line
    }
}

/// Parse a `key=value` tag pair as passed on the command line. The error is
/// a plain string so this can be used as a clap value parser.
pub fn parse_tag(s: &str) -> Result<(String, String), String> {
    let Some((key, value)) = s.split_once('=') else {
        return Err(format!("expected key=value, got: {s}"));
    };

    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return Err(format!("tag key and value must be non-empty: {s}"));
    }

    Ok((key.to_owned(), value.to_owned()))
}

fn escape_measurement(s: &str) -> String {
    s.replace('\\', "\\\\").replace(',', "\\,").replace(' ', "\\ ")
}

// Tag keys, tag values, and field keys share the same escape set.
fn escape_key(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

fn escape_text_field(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
