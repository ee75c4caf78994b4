//! Field parsers for loosely typed upstream values.
//!
//! Each parser distinguishes three outcomes: the field is absent (`null`,
//! missing, or blank), present and valid, or present but unusable. The
//! caller decides which neutral value to substitute for the last case.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde_json::Value;

/// `M:SS` / `MM:SS` durations as shown in spreadsheet-style tables.
static MIN_SEC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):([0-5]?\d)$").expect("valid duration regex"));

/// Outcome of parsing one raw field.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    Missing,
    Valid(T),
    Invalid,
}

impl<T> Parsed<T> {
    pub fn valid(self) -> Option<T> {
        match self {
            Parsed::Valid(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Parsed::Invalid)
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Parse a timestamp. Offsets are honored; naive forms are read as UTC.
pub fn parse_timestamp(value: Option<&Value>) -> Parsed<DateTime<Utc>> {
    let Some(value) = value.filter(|v| !is_blank(v)) else {
        return Parsed::Missing;
    };
    let Value::String(raw) = value else {
        return Parsed::Invalid;
    };
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Parsed::Valid(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Parsed::Valid(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        && let Some(naive) = date.and_hms_opt(0, 0, 0)
    {
        return Parsed::Valid(naive.and_utc());
    }

    Parsed::Invalid
}

/// Parse a call duration into whole seconds.
///
/// Numbers are seconds. Strings are either `M:SS` or a plain number of
/// seconds. Fractional seconds are rounded.
pub fn parse_duration_secs(value: Option<&Value>) -> Parsed<u64> {
    let Some(value) = value.filter(|v| !is_blank(v)) else {
        return Parsed::Missing;
    };

    match value {
        Value::Number(n) => n.as_f64().map_or(Parsed::Invalid, seconds_from_f64),
        Value::String(s) => {
            let s = s.trim();
            if let Some(caps) = MIN_SEC_RE.captures(s) {
                let total = caps[1]
                    .parse::<u64>()
                    .ok()
                    .zip(caps[2].parse::<u64>().ok())
                    .and_then(|(mins, secs)| mins.checked_mul(60)?.checked_add(secs));
                return total.map_or(Parsed::Invalid, Parsed::Valid);
            }
            s.parse::<f64>().map_or(Parsed::Invalid, seconds_from_f64)
        }
        _ => Parsed::Invalid,
    }
}

fn seconds_from_f64(secs: f64) -> Parsed<u64> {
    if secs.is_finite() && secs >= 0.0 {
        Parsed::Valid(secs.round() as u64)
    } else {
        Parsed::Invalid
    }
}

/// Parse a non-negative money amount from a number or numeric string.
pub fn parse_amount(value: Option<&Value>) -> Parsed<f64> {
    let Some(value) = value.filter(|v| !is_blank(v)) else {
        return Parsed::Missing;
    };

    let amount = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_start_matches('$').replace(',', "").parse().ok(),
        _ => None,
    };

    match amount {
        Some(a) if a.is_finite() && a >= 0.0 => Parsed::Valid(a),
        _ => Parsed::Invalid,
    }
}

/// Parse a positive integer week label.
pub fn parse_week_number(value: Option<&Value>) -> Parsed<u32> {
    let Some(value) = value.filter(|v| !is_blank(v)) else {
        return Parsed::Missing;
    };

    let week = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    match week.and_then(|w| u32::try_from(w).ok()) {
        Some(w) if w > 0 => Parsed::Valid(w),
        _ => Parsed::Invalid,
    }
}

/// Read a free-text field. Numbers are rendered, other shapes are ignored.
pub fn parse_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
