//! Tolerant decoding and parsing of StopMonitoring responses.
//!
//! The upstream API is not consistent about its JSON shape. Depending on
//! the agency and the day, a response may or may not carry the top-level
//! `Siri` wrapper, `StopMonitoringDelivery` may be an object or a list,
//! `MonitoredStopVisit` may be an object or a list, and text fields such as
//! the line name come as plain strings, `{"value": ...}` objects, or lists
//! of those.
//!
//! Parsing is therefore done in two layers:
//!
//! 1. **Shape rules** locate the delivery. Each rule is a JSON pointer, tried
//!    in order; the first one that resolves to an object (or a non-empty list
//!    of objects) wins.
//! 2. **Per-visit extraction** deserializes each visit on its own, so a
//!    malformed visit is dropped without affecting its siblings.
//!
//! Nothing here ever fails: an unrecognized payload parses to zero visits.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use stopmon_types::ArrivalVisit;

use crate::AdapterError;

/// Placeholder for a line or destination with no usable text.
pub const UNKNOWN: &str = "UNKNOWN";

/// Where a `StopMonitoringDelivery` may live, in order of preference.
const DELIVERY_RULES: &[&str] = &[
    "/Siri/ServiceDelivery/StopMonitoringDelivery",
    "/ServiceDelivery/StopMonitoringDelivery",
    "/StopMonitoringDelivery",
];

/// Decode a raw response body into JSON.
///
/// Strict decoding is tried first. If that fails the body is decoded as
/// lossy UTF-8, a leading byte-order mark is stripped, and decoding is
/// retried. Only when both fail is an error returned.
pub fn decode_body(raw: &[u8]) -> Result<Value, AdapterError> {
    match serde_json::from_slice(raw) {
        Ok(value) => Ok(value),
        Err(_) => {
            let text = String::from_utf8_lossy(raw);
            let text = text.trim_start_matches('\u{feff}');
            Ok(serde_json::from_str(text)?)
        }
    }
}

/// The outcome of parsing one payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPayload {
    /// Visits that parsed cleanly, in upstream order.
    pub visits: Vec<ArrivalVisit>,

    /// Visits that were present but malformed and therefore dropped.
    pub skipped: usize,

    /// Whether a delivery was found at all.
    pub recognized: bool,
}

/// Extract every well-formed visit from a decoded payload.
///
/// Returns an empty list when no delivery structure is recognized.
pub fn parse_payload(payload: &Value) -> Vec<ArrivalVisit> {
    parse_payload_detailed(payload).visits
}

/// Like [`parse_payload`], but also reports what was dropped.
pub fn parse_payload_detailed(payload: &Value) -> ParsedPayload {
    let Some(delivery) = locate_delivery(payload) else {
        return ParsedPayload::default();
    };

    let raw_visits = delivery
        .get("MonitoredStopVisit")
        .map(one_or_many)
        .unwrap_or_default();

    let mut parsed = ParsedPayload {
        recognized: true,
        ..ParsedPayload::default()
    };
    for raw in raw_visits {
        match parse_visit(raw) {
            Some(visit) => parsed.visits.push(visit),
            None => parsed.skipped += 1,
        }
    }
    parsed
}

fn locate_delivery(payload: &Value) -> Option<&Value> {
    DELIVERY_RULES
        .iter()
        .find_map(|rule| payload.pointer(rule).and_then(first_object))
}

/// An object, or the first element of a list when it is an object.
fn first_object(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(_) => Some(value),
        Value::Array(items) => items.first().filter(|v| v.is_object()),
        _ => None,
    }
}

fn one_or_many(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn parse_visit(raw: &Value) -> Option<ArrivalVisit> {
    let visit = StopVisit::deserialize(raw).ok()?;
    let journey = visit.monitored_vehicle_journey;

    let arrival = journey
        .monitored_call
        .and_then(|call| call.expected_arrival_time)
        .as_deref()
        .and_then(parse_arrival)?;

    let line = resolve_text(
        journey.published_line_name.as_ref(),
        journey.line_ref.as_ref(),
    );
    let destination = resolve_text(
        journey.destination_name.as_ref(),
        journey.destination_ref.as_ref(),
    );

    Some(ArrivalVisit::new(line, destination, arrival))
}

/// Parse an arrival timestamp. Timestamps without an offset are read as UTC.
fn parse_arrival(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .map(|ts| ts.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// First non-empty text of `primary`, then `fallback`, else [`UNKNOWN`].
fn resolve_text(primary: Option<&TextField>, fallback: Option<&TextField>) -> String {
    primary
        .and_then(TextField::text)
        .or_else(|| fallback.and_then(TextField::text))
        .unwrap_or(UNKNOWN)
        .to_string()
}

/// A text field as the API sends it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextField {
    Plain(String),
    Tagged(TaggedText),
    List(Vec<TaggedText>),
}

impl TextField {
    fn text(&self) -> Option<&str> {
        let raw = match self {
            TextField::Plain(s) => Some(s.as_str()),
            TextField::Tagged(tagged) => tagged.value.as_deref(),
            TextField::List(items) => items.first().and_then(|t| t.value.as_deref()),
        };
        raw.map(str::trim).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct TaggedText {
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StopVisit {
    monitored_vehicle_journey: VehicleJourney,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VehicleJourney {
    #[serde(default)]
    published_line_name: Option<TextField>,
    #[serde(default)]
    line_ref: Option<TextField>,
    #[serde(default)]
    destination_name: Option<TextField>,
    #[serde(default)]
    destination_ref: Option<TextField>,
    #[serde(default)]
    monitored_call: Option<MonitoredCall>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MonitoredCall {
    #[serde(default)]
    expected_arrival_time: Option<String>,
}
