use std::fmt;

use serde_json::{Map, Value};

use crate::feed::FeedError;

/// Identity of a report: the feed's date and time fields glued together.
/// Only ever compared for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventId(String);

impl EventId {
    pub fn from_parts(date: &str, time: &str) -> Self {
        Self(format!("{date}{time}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EarthquakeEvent {
    pub magnitude: String,
    pub depth: String,
    pub felt_locations: String,
    pub date: String,
    pub time: String,
}

impl EarthquakeEvent {
    pub fn id(&self) -> EventId {
        EventId::from_parts(&self.date, &self.time)
    }

    fn from_gempa(gempa: &Map<String, Value>) -> Self {
        Self {
            magnitude: field_text(gempa, "Magnitude"),
            depth: field_text(gempa, "Kedalaman"),
            felt_locations: field_text(gempa, "Dirasakan"),
            date: field_text(gempa, "Tanggal"),
            time: field_text(gempa, "Jam"),
        }
    }
}

/// Decodes an `autogempa.json` body. `Ok(None)` means the body is valid
/// JSON but has no `Infogempa.gempa` record, whatever shape it has instead.
pub fn parse_feed(body: &str) -> Result<Option<EarthquakeEvent>, FeedError> {
    let document: Value =
        serde_json::from_str(body).map_err(|err| FeedError::Parse(err.to_string()))?;
    let gempa = match document.get("Infogempa").and_then(|info| info.get("gempa")) {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => value,
    };
    match gempa {
        Value::Object(map) => Ok(Some(EarthquakeEvent::from_gempa(map))),
        other => Err(FeedError::Parse(format!(
            "expected gempa object, found {}",
            kind_of(other)
        ))),
    }
}

// The feed reports numbers as strings, but accept bare numbers as well.
fn field_text(map: &Map<String, Value>, key: &str) -> String {
    match map.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
