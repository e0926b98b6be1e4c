//! Encoding/decoding between [`Event`] and Google Calendar event resources.

use chrono::DateTime;
use serde_json::{json, Map, Value};

use crate::error::RemoteError;
use crate::event::Event;

/// Keys [`Event`] models directly; everything else round-trips via `extra`.
const MODELED: [&str; 10] = [
    "id",
    "summary",
    "start",
    "end",
    "colorId",
    "location",
    "description",
    "attendees",
    "recurrence",
    "reminders",
];

/// Build the request body for an insert or update.
///
/// Unmodeled fields read from the remote are sent back as they were, since
/// an update replaces the whole resource. Optional modeled fields that are
/// `None` are left out so the remote keeps its own defaults for them.
pub fn to_google(event: &Event) -> Value {
    let mut body = event.extra.clone();
    body.insert("summary".into(), json!(event.summary));
    body.insert("start".into(), boundary(event.extra.get("start"), event.start.to_rfc3339()));
    body.insert("end".into(), boundary(event.extra.get("end"), event.end.to_rfc3339()));

    if let Some(color) = &event.color {
        body.insert("colorId".into(), json!(color));
    }
    if let Some(location) = &event.location {
        body.insert("location".into(), json!(location));
    }
    if let Some(description) = &event.description {
        body.insert("description".into(), json!(description));
    }
    if let Some(attendees) = &event.attendees {
        body.insert("attendees".into(), attendees.clone());
    }
    if let Some(recurrence) = &event.recurrence {
        body.insert("recurrence".into(), json!(recurrence));
    }
    if let Some(reminders) = &event.reminders {
        body.insert("reminders".into(), reminders.clone());
    }
    Value::Object(body)
}

/// `{ "dateTime": .. }` on top of whatever else the remote kept there (`timeZone`).
fn boundary(kept: Option<&Value>, date_time: String) -> Value {
    let mut obj = match kept {
        Some(Value::Object(fields)) => fields.clone(),
        _ => Map::new(),
    };
    obj.insert("dateTime".into(), Value::String(date_time));
    Value::Object(obj)
}

/// Unmodeled top-level keys, plus the non-`dateTime` parts of `start`/`end`.
fn unmodeled(item: &Value) -> Map<String, Value> {
    let Some(fields) = item.as_object() else {
        return Map::new();
    };
    let mut extra: Map<String, Value> = fields
        .iter()
        .filter(|(key, _)| !MODELED.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    for key in ["start", "end"] {
        if let Some(Value::Object(inner)) = fields.get(key) {
            let rest: Map<String, Value> = inner
                .iter()
                .filter(|(k, _)| k.as_str() != "dateTime")
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            if !rest.is_empty() {
                extra.insert(key.to_string(), Value::Object(rest));
            }
        }
    }
    extra
}

/// Decode one event resource.
///
/// Returns `Ok(None)` for all-day events (a `date` instead of a `dateTime`)
/// and for cancelled instances; neither takes part in a reflow.
pub fn from_google(item: &Value) -> Result<Option<Event>, RemoteError> {
    if item["status"].as_str() == Some("cancelled") {
        return Ok(None);
    }
    let (Some(start), Some(end)) = (
        item["start"]["dateTime"].as_str(),
        item["end"]["dateTime"].as_str(),
    ) else {
        if item["start"]["date"].is_string() {
            return Ok(None);
        }
        return Err(RemoteError::Decode(format!(
            "event {} has no start/end time",
            item["id"].as_str().unwrap_or("<unknown>")
        )));
    };

    let parse = |raw: &str| {
        DateTime::parse_from_rfc3339(raw)
            .map_err(|e| RemoteError::Decode(format!("invalid time '{raw}': {e}")))
    };

    let text = |key: &str| item[key].as_str().map(str::to_string);
    let present = |key: &str| item.get(key).filter(|v| !v.is_null()).cloned();

    let recurrence = match item.get("recurrence") {
        Some(Value::Array(lines)) => Some(
            lines
                .iter()
                .filter_map(|l| l.as_str().map(str::to_string))
                .collect(),
        ),
        _ => None,
    };

    Ok(Some(Event {
        id: text("id"),
        summary: text("summary").unwrap_or_else(|| "(No title)".to_string()),
        start: parse(start)?,
        end: parse(end)?,
        color: text("colorId"),
        location: text("location"),
        description: text("description"),
        attendees: present("attendees"),
        recurrence,
        reminders: present("reminders"),
        extra: unmodeled(item),
    }))
}

/// Decode the `items` of one page of an events list.
pub fn decode_items(page: &Value) -> Result<Vec<Event>, RemoteError> {
    let Some(items) = page["items"].as_array() else {
        return Ok(Vec::new());
    };
    let mut events = Vec::with_capacity(items.len());
    for item in items {
        if let Some(event) = from_google(item)? {
            events.push(event);
        }
    }
    Ok(events)
}
