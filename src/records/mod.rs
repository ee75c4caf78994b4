//! Call records: the raw upstream row shape and the typed record the
//! aggregation engine works on.
//!
//! Upstream rows are loosely typed (any column may be missing, a number,
//! or a string). [`CallRecord::from_raw`] is the single normalization step
//! between the two: it never fails, substitutes neutral values for bad
//! fields, and reports each substitution as a [`FieldError`].

pub mod fields;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::schema::FieldNames;
use crate::error::FieldError;

use fields::Parsed;

// ---------------------------------------------------------------------------
// Raw upstream shape
// ---------------------------------------------------------------------------

/// One row as delivered by the tabular data API.
///
/// Decoding never fails. Odd `id` or `fields` values are coerced. A row
/// that is not an object at all is kept in `rejected` for normalization to
/// report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct RawCallRecord {
    pub id: String,
    #[serde(rename = "createdTime", skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    pub fields: Map<String, Value>,
    /// The original value when the row was not a JSON object.
    #[serde(skip)]
    pub rejected: Option<Value>,
}

impl From<Value> for RawCallRecord {
    fn from(value: Value) -> Self {
        let Value::Object(mut row) = value else {
            return Self {
                rejected: Some(value),
                ..Self::default()
            };
        };

        let id = match row.remove("id") {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        let created_time = match row.remove("createdTime") {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };
        let fields = match row.remove("fields") {
            Some(Value::Object(fields)) => fields,
            _ => Map::new(),
        };

        Self {
            id,
            created_time,
            fields,
            rejected: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Call status as reported upstream. Unknown values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Incoming,
    Outgoing,
    Missed,
    /// Any other value. Empty string when the status was missing.
    Other(String),
}

impl CallStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Other(String::new());
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "incoming" => Self::Incoming,
            "outgoing" => Self::Outgoing,
            "missed" => Self::Missed,
            _ => Self::Other(raw.trim().to_string()),
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incoming => write!(f, "incoming"),
            Self::Outgoing => write!(f, "outgoing"),
            Self::Missed => write!(f, "missed"),
            Self::Other(raw) if raw.is_empty() => write!(f, "-"),
            Self::Other(raw) => write!(f, "{raw}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Typed record
// ---------------------------------------------------------------------------

/// A validated call record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallRecord {
    pub id: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: u64,
    pub status: CallStatus,
    pub total_cost: f64,
    /// Running total computed upstream; only meaningful on the newest record.
    pub cumulative_total_cost: Option<f64>,
    pub avg_cost_per_minute: Option<f64>,
    pub week_number: Option<u32>,
    pub phone_number: Option<String>,
    pub ended_reason: Option<String>,
}

impl CallRecord {
    /// Build a record with only an id; every other field takes its neutral value.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            start_time: None,
            end_time: None,
            duration_seconds: 0,
            status: CallStatus::Other(String::new()),
            total_cost: 0.0,
            cumulative_total_cost: None,
            avg_cost_per_minute: None,
            week_number: None,
            phone_number: None,
            ended_reason: None,
        }
    }

    /// Duration expressed in minutes (`150` seconds and `"2:30"` both give 2.5).
    pub fn duration_minutes(&self) -> f64 {
        self.duration_seconds as f64 / 60.0
    }

    /// Normalize one raw row using the configured column names.
    ///
    /// Returns the record and every field that was present but unusable.
    pub fn from_raw(raw: &RawCallRecord, names: &FieldNames) -> (Self, Vec<FieldError>) {
        let mut issues = Vec::new();
        let get = |name: &str| raw.fields.get(name);

        let start = fields::parse_timestamp(get(&names.start_time));
        flag(&mut issues, raw, &names.start_time, &start);
        let end = fields::parse_timestamp(get(&names.end_time));
        flag(&mut issues, raw, &names.end_time, &end);
        let duration = fields::parse_duration_secs(get(&names.duration));
        flag(&mut issues, raw, &names.duration, &duration);
        let cost = fields::parse_amount(get(&names.total_cost));
        flag(&mut issues, raw, &names.total_cost, &cost);
        let cumulative = fields::parse_amount(get(&names.cumulative_total_cost));
        flag(&mut issues, raw, &names.cumulative_total_cost, &cumulative);
        let avg = fields::parse_amount(get(&names.avg_cost_per_minute));
        flag(&mut issues, raw, &names.avg_cost_per_minute, &avg);
        let week = fields::parse_week_number(get(&names.week_number));
        flag(&mut issues, raw, &names.week_number, &week);

        let status_raw = fields::parse_text(get(&names.status));

        let record = Self {
            id: raw.id.clone(),
            start_time: start.valid(),
            end_time: end.valid(),
            duration_seconds: duration.valid().unwrap_or(0),
            status: CallStatus::parse(status_raw.as_deref()),
            total_cost: cost.valid().unwrap_or(0.0),
            cumulative_total_cost: cumulative.valid(),
            avg_cost_per_minute: avg.valid(),
            week_number: week.valid(),
            phone_number: fields::parse_text(get(&names.phone_number)),
            ended_reason: fields::parse_text(get(&names.ended_reason)),
        };

        (record, issues)
    }
}

fn flag<T>(issues: &mut Vec<FieldError>, raw: &RawCallRecord, field: &str, parsed: &Parsed<T>) {
    if parsed.is_invalid() {
        issues.push(FieldError::InvalidRecordField {
            record_id: raw.id.clone(),
            field: field.to_string(),
            value: raw.fields.get(field).map(|v| v.to_string()).unwrap_or_default(),
        });
    }
}

/// Normalized batch plus every field-level problem found along the way.
#[derive(Debug, Default)]
pub struct Normalized {
    pub records: Vec<CallRecord>,
    pub issues: Vec<FieldError>,
}

/// Normalize a batch of raw rows, preserving their order.
///
/// Rows that were not objects upstream are dropped and reported.
pub fn normalize_all(raw: &[RawCallRecord], names: &FieldNames) -> Normalized {
    let mut out = Normalized {
        records: Vec::with_capacity(raw.len()),
        issues: Vec::new(),
    };
    for (index, row) in raw.iter().enumerate() {
        if let Some(value) = &row.rejected {
            out.issues.push(FieldError::MalformedRow {
                index,
                value: value.to_string(),
            });
            continue;
        }
        let (record, issues) = CallRecord::from_raw(row, names);
        out.records.push(record);
        out.issues.extend(issues);
    }
    out
}
