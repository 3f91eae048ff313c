use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context as _, Result};

/// Load a sensor-id -> room mapping from a JSON object or a
/// whitespace-separated text file (`<sensor_id> <room>` per line, `#`
/// comments and blank lines ignored). Empty ids or room labels are rejected
/// here, before any sensor is touched.
pub fn load_room_map(path: &Path) -> Result<HashMap<String, String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read map file: {}", path.display()))?;

    let map = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON map file: {}", path.display()))?
    } else {
        let mut map = HashMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split_whitespace();
            if let (Some(sensor_id), Some(room)) = (parts.next(), parts.next()) {
                map.insert(sensor_id.to_owned(), room.to_owned());
            }
        }
        map
    };

    for (sensor_id, room) in &map {
        if sensor_id.trim().is_empty() || room.trim().is_empty() {
            bail!(
                "map file {} has an empty sensor id or room label",
                path.display()
            );
        }
    }

    Ok(map)
}
