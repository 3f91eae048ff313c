//! Render a reading to line protocol, parse the record back, and check that
//! the tag set, field values, and timestamp survive.

use chrono::{TimeZone as _, Utc};
use roomtemp::influx::Point;
use roomtemp::sensor::{Reading, Unit};

#[derive(Debug, PartialEq)]
enum ParsedValue {
    Float(f64),
    Integer(i64),
    Boolean(bool),
    Text(String),
}

#[derive(Debug)]
struct ParsedLine {
    measurement: String,
    tags: Vec<(String, String)>,
    fields: Vec<(String, ParsedValue)>,
    timestamp_ns: i64,
}

/// Minimal conformant line-protocol parser, handling backslash escapes and
/// quoted string fields.
fn parse_line(line: &str) -> ParsedLine {
    let sections = split_unescaped(line, ' ');
    assert_eq!(sections.len(), 3, "expected 3 sections in: {line}");

    let mut head = split_unescaped(&sections[0], ',').into_iter();
    let measurement = unescape(&head.next().expect("measurement"));
    let tags = head
        .map(|pair| {
            let kv = split_unescaped(&pair, '=');
            assert_eq!(kv.len(), 2, "malformed tag: {pair}");
            (unescape(&kv[0]), unescape(&kv[1]))
        })
        .collect();

    let fields = split_unescaped(&sections[1], ',')
        .into_iter()
        .map(|pair| {
            let kv = split_unescaped(&pair, '=');
            assert_eq!(kv.len(), 2, "malformed field: {pair}");
            (unescape(&kv[0]), parse_field_value(&kv[1]))
        })
        .collect();

    let timestamp_ns = sections[2].parse().expect("timestamp");

    ParsedLine {
        measurement,
        tags,
        fields,
        timestamp_ns,
    }
}

fn parse_field_value(raw: &str) -> ParsedValue {
    if let Some(stripped) = raw.strip_prefix('"') {
        let inner = stripped.strip_suffix('"').expect("unterminated string");
        return ParsedValue::Text(unescape(inner));
    }
    if raw == "true" || raw == "false" {
        return ParsedValue::Boolean(raw == "true");
    }
    if let Some(stripped) = raw.strip_suffix('i') {
        return ParsedValue::Integer(stripped.parse().expect("integer field"));
    }
    ParsedValue::Float(raw.parse().expect("float field"))
}

/// Split on `delimiter`, ignoring occurrences that are backslash-escaped or
/// inside a quoted string.
fn split_unescaped(s: &str, delimiter: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    let mut in_quotes = false;

    for c in s.chars() {
        if escaped {
            current.push('\\');
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            c if c == delimiter && !in_quotes => {
                parts.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    parts.push(current);

    parts
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;
    for c in s.chars() {
        if escaped {
            out.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else {
            out.push(c);
        }
    }
    out
}

fn float_field(parsed: &ParsedLine, key: &str) -> f64 {
    match parsed.fields.iter().find(|(k, _)| k == key) {
        Some((_, ParsedValue::Float(v))) => *v,
        other => panic!("expected float field {key}, got {other:?}"),
    }
}

#[test]
fn govee_reading_round_trips() {
    let reading = Reading {
        measured_at: Utc.with_ymd_and_hms(2025, 11, 2, 7, 30, 0).unwrap(),
        device_id: "A4:C1:38:11:22:33".into(),
        room: "living room".into(),
        metric: "temp_c".into(),
        value: -8.1809,
        unit: Unit::Celsius,
        humidity_percent: Some(80.9),
        battery_percent: Some(93),
        rssi_dbm: Some(-58),
    };

    let point = Point::from_reading("govee_h5075", &reading)
        .unwrap()
        .tag("host", "rpi-hall");
    let parsed = parse_line(&point.to_line());

    assert_eq!(parsed.measurement, "govee_h5075");
    assert_eq!(
        parsed.tags,
        vec![
            ("device_id".to_owned(), "A4:C1:38:11:22:33".to_owned()),
            ("room".to_owned(), "living room".to_owned()),
            ("host".to_owned(), "rpi-hall".to_owned()),
        ]
    );
    assert!((float_field(&parsed, "temp_c") + 8.1809).abs() < 1e-9);
    assert!((float_field(&parsed, "humidity_pct") - 80.9).abs() < 1e-9);
    assert_eq!(
        parsed.fields.iter().find(|(k, _)| k == "battery_pct"),
        Some(&("battery_pct".to_owned(), ParsedValue::Integer(93)))
    );
    assert_eq!(
        parsed.fields.iter().find(|(k, _)| k == "rssi_dbm"),
        Some(&("rssi_dbm".to_owned(), ParsedValue::Integer(-58)))
    );
    assert_eq!(
        parsed.timestamp_ns,
        reading.measured_at.timestamp_nanos_opt().unwrap()
    );
}

#[test]
fn ds18b20_reading_round_trips_with_minimal_field_set() {
    let reading = Reading {
        measured_at: Utc.with_ymd_and_hms(2026, 1, 15, 23, 59, 59).unwrap(),
        device_id: "28-0316a279".into(),
        room: "cellar".into(),
        metric: "temp_c".into(),
        value: 12.062,
        unit: Unit::Celsius,
        humidity_percent: None,
        battery_percent: None,
        rssi_dbm: None,
    };

    let parsed = parse_line(&Point::from_reading("ds18b20", &reading).unwrap().to_line());

    assert_eq!(parsed.measurement, "ds18b20");
    assert_eq!(
        parsed.tags,
        vec![
            ("device_id".to_owned(), "28-0316a279".to_owned()),
            ("room".to_owned(), "cellar".to_owned()),
        ]
    );
    assert_eq!(parsed.fields.len(), 1, "absent optionals must be omitted");
    assert!((float_field(&parsed, "temp_c") - 12.062).abs() < 1e-9);
    assert_eq!(
        parsed.timestamp_ns,
        reading.measured_at.timestamp_nanos_opt().unwrap()
    );
}

#[test]
fn escaped_measurement_and_tags_round_trip() {
    let point = Point::new("room temps")
        .tag("room", "kitchen, 2nd=floor")
        .field("temp_c", roomtemp::influx::FieldValue::Float(19.25))
        .timestamp_ns(42);

    let parsed = parse_line(&point.to_line());
    assert_eq!(parsed.measurement, "room temps");
    assert_eq!(
        parsed.tags,
        vec![("room".to_owned(), "kitchen, 2nd=floor".to_owned())]
    );
    assert!((float_field(&parsed, "temp_c") - 19.25).abs() < 1e-9);
    assert_eq!(parsed.timestamp_ns, 42);
}
