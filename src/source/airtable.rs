/// Airtable REST client for the call table.
///
/// Lists every row of `{api_url}/{base_id}/{table}` with the synchronous
/// `ureq` client, newest first (sorted server-side on the start-time
/// column), following the `offset` cursor until the last page.
///
/// Each page is requested exactly once. A failure surfaces as a typed
/// [`FetchError`]; the caller decides whether stale rows are good enough.
use std::time::Duration;

use serde::Deserialize;

use super::CallSource;
use crate::config::schema::{FieldNames, SourceConfig};
use crate::error::FetchError;
use crate::records::RawCallRecord;

/// Upper bound on followed cursors, in case the API keeps handing back one.
const MAX_PAGES: usize = 1_000;

/// One page of `GET /{base}/{table}`.
#[derive(Debug, Deserialize)]
struct RecordsPage {
    #[serde(default)]
    records: Vec<RawCallRecord>,
    #[serde(default)]
    offset: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AirtableSource {
    api_url: String,
    base_id: String,
    table: String,
    api_key: String,
    sort_field: String,
    timeout: Duration,
}

impl AirtableSource {
    /// Build a client from the resolved config.
    pub fn from_config(source: &SourceConfig, fields: &FieldNames) -> Self {
        Self {
            api_url: source.api_url.trim_end_matches('/').to_string(),
            base_id: source.base_id.clone(),
            table: source.table.clone(),
            api_key: source.api_key.clone(),
            sort_field: fields.start_time.clone(),
            timeout: Duration::from_millis(source.timeout_ms),
        }
    }

    /// Full URL of the table listing endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/{}/{}", self.api_url, self.base_id, self.table)
    }

    fn fetch_page(&self, offset: Option<&str>) -> Result<RecordsPage, FetchError> {
        let mut request = ureq::get(&self.endpoint())
            .timeout(self.timeout)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .query("sort[0][field]", &self.sort_field)
            .query("sort[0][direction]", "desc");
        if let Some(offset) = offset {
            request = request.query("offset", offset);
        }

        let resp = request.call()?;
        resp.into_json::<RecordsPage>()
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

impl CallSource for AirtableSource {
    fn name(&self) -> String {
        "airtable".to_string()
    }

    fn fetch(&self) -> Result<Vec<RawCallRecord>, FetchError> {
        if self.api_key.is_empty() {
            return Err(FetchError::MissingApiKey);
        }
        if self.base_id.is_empty() {
            return Err(FetchError::NotConfigured("source.base_id"));
        }
        if self.table.is_empty() {
            return Err(FetchError::NotConfigured("source.table"));
        }

        let mut rows = Vec::new();
        let mut offset: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let page = self.fetch_page(offset.as_deref())?;
            rows.extend(page.records);
            match page.offset {
                Some(next) if !next.is_empty() => offset = Some(next),
                _ => return Ok(rows),
            }
        }

        Err(FetchError::Decode(format!(
            "pagination did not terminate after {MAX_PAGES} pages"
        )))
    }
}
