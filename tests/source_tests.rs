/// Source and refresh-cycle tests.
///
/// The HTTP client is exercised against a throwaway `tiny_http` server on
/// a random local port. File-source and refresh tests write to a per-test
/// temp directory.
use std::fs;
use std::path::PathBuf;
use std::thread;

use callboard::analytics::logger;
use callboard::config::schema::{FieldNames, LoggingConfig, SourceConfig};
use callboard::error::FetchError;
use callboard::source::{self, AirtableSource, CallSource, FetchCache, FileSource};
use tiny_http::{Header, Response, Server};

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("callboard-src-{}-{name}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn logging(dir: &std::path::Path) -> LoggingConfig {
    LoggingConfig {
        enabled: true,
        path: dir.join("refresh-log.jsonl").to_string_lossy().into_owned(),
    }
}

// ---------------------------------------------------------------------------
// Airtable client
// ---------------------------------------------------------------------------

/// Serve `pages` in order, one per request, and hand back the request URLs
/// and Authorization headers seen.
fn serve_pages(pages: Vec<(u16, String)>) -> (String, thread::JoinHandle<Vec<(String, String)>>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();

    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for (status, body) in pages {
            let request = server.recv().unwrap();
            let auth = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Authorization"))
                .map(|h| h.value.as_str().to_string())
                .unwrap_or_default();
            seen.push((request.url().to_string(), auth));
            let resp = Response::from_string(body)
                .with_status_code(status)
                .with_header(Header::from_bytes("Content-Type", "application/json").unwrap());
            request.respond(resp).unwrap();
        }
        seen
    });

    (format!("http://127.0.0.1:{port}/v0"), handle)
}

fn airtable(api_url: &str) -> AirtableSource {
    let cfg = SourceConfig {
        api_url: api_url.to_string(),
        base_id: "appTEST".to_string(),
        table: "Calls".to_string(),
        api_key: "keyTEST".to_string(),
        timeout_ms: 5_000,
    };
    AirtableSource::from_config(&cfg, &FieldNames::default())
}

#[test]
fn airtable_follows_offset_cursor() {
    let (url, handle) = serve_pages(vec![
        (
            200,
            r#"{"records":[{"id":"rec1","fields":{"Call status":"incoming"}},{"id":"rec2","fields":{}}],"offset":"itrNEXT"}"#
                .to_string(),
        ),
        (200, r#"{"records":[{"id":"rec3","fields":{}}]}"#.to_string()),
    ]);

    let rows = airtable(&url).fetch().unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["rec1", "rec2", "rec3"]);

    let seen = handle.join().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].0.starts_with("/v0/appTEST/Calls?"));
    assert!(seen[0].0.contains("desc"));
    assert!(!seen[0].0.contains("offset="));
    assert!(seen[1].0.contains("offset=itrNEXT"));
    assert!(seen.iter().all(|(_, auth)| auth == "Bearer keyTEST"));
}

#[test]
fn airtable_malformed_row_is_reported_not_fatal() {
    let dir = temp_dir("malformed");
    let (url, handle) = serve_pages(vec![(
        200,
        r#"{"records":[{"id":"rec1","fields":null},"junk",{"id":12,"fields":{"Call status":"missed"}}]}"#
            .to_string(),
    )]);

    let src = airtable(&url);
    let mut cache = FetchCache::default();
    let refreshed = source::refresh(&src, &mut cache, &FieldNames::default(), &logging(&dir)).unwrap();
    handle.join().unwrap();

    let ids: Vec<&str> = refreshed.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["rec1", "12"]);
    assert_eq!(refreshed.issues.len(), 1);
    assert_eq!(refreshed.event.invalid_fields, 1);
}

#[test]
fn airtable_status_error_is_typed() {
    let (url, handle) = serve_pages(vec![(
        401,
        r#"{"error":{"type":"AUTHENTICATION_REQUIRED"}}"#.to_string(),
    )]);

    let err = airtable(&url).fetch().unwrap_err();
    match err {
        FetchError::Status { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("AUTHENTICATION_REQUIRED"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
    handle.join().unwrap();
}

#[test]
fn airtable_bad_json_is_decode_error() {
    let (url, handle) = serve_pages(vec![(200, "<html>oops</html>".to_string())]);
    let err = airtable(&url).fetch().unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));
    handle.join().unwrap();
}

#[test]
fn airtable_unreachable_is_transport_error() {
    // Bind then drop to get a port nobody listens on.
    let port = {
        let server = Server::http("127.0.0.1:0").unwrap();
        server.server_addr().to_ip().unwrap().port()
    };
    let err = airtable(&format!("http://127.0.0.1:{port}/v0")).fetch().unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
}

// ---------------------------------------------------------------------------
// Refresh cycle
// ---------------------------------------------------------------------------

#[test]
fn refresh_normalizes_sorts_and_logs() {
    let dir = temp_dir("refresh");
    let path = dir.join("calls.json");
    fs::write(
        &path,
        r#"{"records":[
            {"id":"old","fields":{"Start time":"2024-05-01T10:00:00Z","Call status":"missed"}},
            {"id":"new","fields":{"Start time":"2024-05-08T10:00:00Z","Total cost":"oops"}},
            {"id":"undated","fields":{}}
        ]}"#,
    )
    .unwrap();
    let log = logging(&dir);
    let src = FileSource::new(&path);
    let mut cache = FetchCache::new(30);

    let first = source::refresh(&src, &mut cache, &FieldNames::default(), &log).unwrap();
    let ids: Vec<&str> = first.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["new", "old", "undated"]);
    assert_eq!(first.issues.len(), 1);
    assert!(!first.event.cache_hit);

    let second = source::refresh(&src, &mut cache, &FieldNames::default(), &log).unwrap();
    assert!(second.event.cache_hit);

    let entries = logger::read_all_entries(&dir.join("refresh-log.jsonl"));
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].records, 3);
    assert_eq!(entries[0].invalid_fields, 1);
    assert!(entries[0].source.starts_with("file:"));
    assert!(entries[1].cache_hit);
}

#[test]
fn refresh_serves_stale_rows_when_source_breaks() {
    let dir = temp_dir("stale");
    let path = dir.join("calls.json");
    fs::write(&path, r#"[{"id":"a","fields":{}}]"#).unwrap();
    let log = logging(&dir);
    let src = FileSource::new(&path);
    // Zero window: every refresh goes to the source.
    let mut cache = FetchCache::new(0);

    source::refresh(&src, &mut cache, &FieldNames::default(), &log).unwrap();
    fs::remove_file(&path).unwrap();

    let stale = source::refresh(&src, &mut cache, &FieldNames::default(), &log).unwrap();
    assert_eq!(stale.records.len(), 1);
    assert!(matches!(stale.stale_error, Some(FetchError::Io { .. })));
    assert!(stale.event.stale);
    assert!(!stale.event.success);

    let last = logger::last_refresh(&log).unwrap();
    assert!(last.stale);
    assert!(last.error.is_some());
}

#[test]
fn refresh_without_cache_propagates_and_logs_failure() {
    let dir = temp_dir("fail");
    let log = logging(&dir);
    let src = FileSource::new(dir.join("missing.json"));
    let mut cache = FetchCache::default();

    let err = source::refresh(&src, &mut cache, &FieldNames::default(), &log).unwrap_err();
    assert!(matches!(err, FetchError::Io { .. }));

    let last = logger::last_refresh(&log).unwrap();
    assert!(!last.success);
    assert_eq!(last.records, 0);
}
