use chrono::{NaiveDate, Utc};
use serde_json::{Map, Value};

use crate::models::{Issue, RawIssue, Sprint, SprintState, UNASSIGNED, UNKNOWN};

pub fn normalize(raw: &RawIssue) -> Issue {
    normalize_with_today(raw, Utc::now().date_naive())
}

// Total: missing or unexpectedly shaped fields degrade to defaults, never
// fail. `today` is the reference date for age computation.
pub fn normalize_with_today(raw: &RawIssue, today: NaiveDate) -> Issue {
    let fields = &raw.fields;

    let created = date_field(fields, "created").unwrap_or(today);
    let updated = date_field(fields, "updated").unwrap_or(today);
    let resolution_date = date_field(fields, "resolutiondate");

    Issue {
        key: raw.key.clone(),
        summary: str_field(fields, "summary").unwrap_or_else(|| UNKNOWN.to_string()),
        status: nested_str(fields, "status", "name").unwrap_or_else(|| UNKNOWN.to_string()),
        priority: nested_str(fields, "priority", "name").unwrap_or_else(|| UNKNOWN.to_string()),
        issue_type: nested_str(fields, "issuetype", "name").unwrap_or_else(|| UNKNOWN.to_string()),
        project: nested_str(fields, "project", "key").unwrap_or_else(|| UNKNOWN.to_string()),
        project_name: nested_str(fields, "project", "name").unwrap_or_else(|| UNKNOWN.to_string()),
        developer: nested_str(fields, "customfield_11103", "displayName")
            .or_else(|| nested_str(fields, "customfield_11000", "displayName"))
            .or_else(|| nested_str(fields, "assignee", "displayName"))
            .unwrap_or_else(|| UNASSIGNED.to_string()),
        qa: nested_str(fields, "customfield_11102", "displayName")
            .unwrap_or_else(|| UNASSIGNED.to_string()),
        ba: nested_str(fields, "customfield_11104", "displayName")
            .unwrap_or_else(|| UNASSIGNED.to_string()),
        module: nested_str(fields, "customfield_10105", "value")
            .or_else(|| str_field(fields, "customfield_10802"))
            .unwrap_or_else(|| UNKNOWN.to_string()),
        product: nested_str(fields, "customfield_12000", "value")
            .unwrap_or_else(|| UNKNOWN.to_string()),
        demand_type: nested_str(fields, "customfield_12300", "value")
            .unwrap_or_else(|| UNKNOWN.to_string()),
        sprint: extract_sprint(fields.get("customfield_10005")),
        story_points: number_field(fields, "customfield_10002"),
        created,
        updated,
        resolution_date,
        age_in_days: (today - created).num_days(),
        is_resolved: resolution_date.is_some(),
    }
}

fn str_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_string)
}

fn nested_str(fields: &Map<String, Value>, key: &str, inner: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(|value| value.get(inner))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn number_field(fields: &Map<String, Value>, key: &str) -> f64 {
    match fields.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn date_field(fields: &Map<String, Value>, key: &str) -> Option<NaiveDate> {
    parse_date(fields.get(key)?.as_str()?)
}

// Timestamps arrive as "2024-01-15T10:30:00.000+0000"; only the date part
// matters here.
fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.get(..10)?, "%Y-%m-%d").ok()
}

// The sprint field is a history; the last entry is taken to be the current
// sprint. Entries arrive either as structured objects or as encoded
// "key=value,..." strings, depending on the server version.
fn extract_sprint(field: Option<&Value>) -> Sprint {
    let Some(Value::Array(entries)) = field else {
        return Sprint::default();
    };
    let Some(current) = entries.last() else {
        return Sprint::default();
    };

    match current {
        Value::String(encoded) => parse_sprint_encoding(encoded),
        Value::Object(object) => Sprint {
            name: object
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("Unknown Sprint")
                .to_string(),
            id: object.get("id").and_then(Value::as_u64),
            state: object
                .get("state")
                .and_then(Value::as_str)
                .map(SprintState::parse)
                .unwrap_or(SprintState::Unknown),
        },
        _ => Sprint::default(),
    }
}

fn parse_sprint_encoding(encoded: &str) -> Sprint {
    Sprint {
        name: entry_value(encoded, "name=")
            .unwrap_or("Unknown Sprint")
            .to_string(),
        id: entry_value(encoded, "id=").and_then(|v| v.parse().ok()),
        state: entry_value(encoded, "state=")
            .map(SprintState::parse)
            .unwrap_or(SprintState::Unknown),
    }
}

// first occurrence of `key`; the value runs to the next comma or the end
fn entry_value<'a>(encoded: &'a str, key: &str) -> Option<&'a str> {
    let start = encoded.find(key)? + key.len();
    let rest = &encoded[start..];
    let end = rest.find(',').unwrap_or(rest.len());
    let value = rest[..end].trim();
    (!value.is_empty()).then_some(value)
}
