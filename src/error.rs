//! Typed errors for record normalization and upstream fetching.
//!
//! Application seams (CLI, config, web) use `anyhow`; these enums exist
//! where callers need to tell failure kinds apart.

/// A single present-but-unparsable field on one record, or a row that
/// could not be read as a record at all.
///
/// Never fatal: normalization substitutes a neutral value and keeps going,
/// and the collected errors are only reported.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    #[error("record {record_id}: invalid value for '{field}': {value}")]
    InvalidRecordField {
        record_id: String,
        field: String,
        value: String,
    },

    #[error("row {index}: not a record object: {value}")]
    MalformedRow { index: usize, value: String },
}

/// Failure of the upstream call source.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("no API key configured (set CALLBOARD_API_KEY or source.api_key)")]
    MissingApiKey,

    #[error("source not configured: {0} is empty")]
    NotConfigured(&'static str),

    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to decode upstream response: {0}")]
    Decode(String),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<ureq::Error> for FetchError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, resp) => {
                let body = resp.into_string().unwrap_or_default();
                FetchError::Status { status, body }
            }
            ureq::Error::Transport(t) => FetchError::Transport(t.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_error_message_names_record_and_field() {
        let err = FieldError::InvalidRecordField {
            record_id: "rec1".to_string(),
            field: "Start time".to_string(),
            value: "\"yesterday\"".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("rec1"));
        assert!(msg.contains("Start time"));
    }

    #[test]
    fn status_error_shows_code() {
        let err = FetchError::Status {
            status: 401,
            body: "unauthorized".to_string(),
        };
        assert!(err.to_string().contains("401"));
    }
}
