use ingest::{
    FileFetcher, Fetcher, IngestError, IngestHandle, IngestPayload, IngestPool, IngestRequest,
    IngestSource, RetryPolicy, Retrying, SourceFetcher,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct EchoFetcher;

impl Fetcher for EchoFetcher {
    fn fetch(&self, source: &IngestSource) -> Result<IngestPayload, IngestError> {
        match source {
            IngestSource::Url { url, .. } => Ok(IngestPayload::Text(format!("echo {url}"))),
            IngestSource::File { .. } => Err(IngestError::Unsupported("file".to_string())),
        }
    }
}

fn url_request(target: &str, url: &str) -> IngestRequest {
    IngestRequest {
        target: target.to_string(),
        source_id: url.to_string(),
        source: IngestSource::Url {
            url: url.to_string(),
            selector: None,
        },
    }
}

#[test]
fn pool_delivers_results_as_events() {
    let pool = IngestPool::new(Arc::new(EchoFetcher), 2);
    assert_eq!(pool.worker_count(), 2);
    let handle = pool.handle();
    handle.submit(url_request("weather_forecast", "a")).unwrap();
    handle.submit(url_request("stock_market", "b")).unwrap();

    let mut events = Vec::new();
    while events.len() < 2 {
        let event = pool
            .recv_timeout(Duration::from_secs(5))
            .expect("event delivered");
        events.push(event);
    }
    events.sort_by(|a, b| a.source_id.cmp(&b.source_id));
    assert_eq!(events[0].target, "weather_forecast");
    assert_eq!(events[0].result, Ok(IngestPayload::Text("echo a".to_string())));
    assert_eq!(events[1].target, "stock_market");
    pool.shutdown();
}

#[test]
fn fetch_errors_are_reported_in_the_event() {
    let pool = IngestPool::new(Arc::new(EchoFetcher), 1);
    pool.handle()
        .submit(IngestRequest {
            target: "markdown_viewer".to_string(),
            source_id: "notes".to_string(),
            source: IngestSource::File {
                path: "notes.md".into(),
            },
        })
        .unwrap();
    let event = pool
        .recv_timeout(Duration::from_secs(5))
        .expect("event delivered");
    assert!(event.result.unwrap_err().contains("unsupported"));
}

#[test]
fn handle_fails_after_pool_shutdown() {
    let pool = IngestPool::new(Arc::new(EchoFetcher), 1);
    let handle = pool.handle();
    pool.shutdown();
    let err = handle.submit(url_request("web_view", "x")).unwrap_err();
    assert!(matches!(err, IngestError::Disconnected));
}

#[test]
fn disconnected_handle_refuses_requests() {
    let handle = IngestHandle::disconnected();
    assert!(!handle.is_connected());
    assert!(matches!(
        handle.submit(url_request("web_view", "x")),
        Err(IngestError::Disconnected)
    ));
}

#[test]
fn file_fetcher_parses_json_and_reads_text() {
    let dir = tempfile::tempdir().expect("tempdir");
    let json_path = dir.path().join("rows.json");
    let text_path = dir.path().join("notes.md");
    std::fs::write(&json_path, r#"[{"a": 1}]"#).unwrap();
    std::fs::write(&text_path, "# Notes").unwrap();

    let fetcher = FileFetcher;
    let json = fetcher
        .fetch(&IngestSource::File { path: json_path })
        .unwrap();
    assert_eq!(json, IngestPayload::Json(serde_json::json!([{"a": 1}])));

    let text = fetcher
        .fetch(&IngestSource::File { path: text_path })
        .unwrap();
    assert_eq!(text, IngestPayload::Text("# Notes".to_string()));

    let url = fetcher.fetch(&IngestSource::Url {
        url: "https://example.com".to_string(),
        selector: None,
    });
    assert!(matches!(url, Err(IngestError::Unsupported(_))));
}

/// Fails with `error` for the first `failures` calls, then answers.
struct FlakyFetcher {
    calls: AtomicUsize,
    failures: usize,
    error: fn() -> IngestError,
}

impl FlakyFetcher {
    fn new(failures: usize, error: fn() -> IngestError) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failures,
            error,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fetcher for FlakyFetcher {
    fn fetch(&self, _source: &IngestSource) -> Result<IngestPayload, IngestError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err((self.error)())
        } else {
            Ok(IngestPayload::Json(serde_json::json!({"temp": 21})))
        }
    }
}

fn quick_retries(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        backoff: Duration::ZERO,
        factor: 1.5,
    }
}

fn weather_source() -> IngestSource {
    IngestSource::Url {
        url: "https://weather.example/api".to_string(),
        selector: None,
    }
}

#[test]
fn transient_failures_are_retried_until_success() {
    let flaky = Arc::new(FlakyFetcher::new(2, || {
        IngestError::Transport("connection reset".to_string())
    }));
    let fetcher = Retrying::new(Arc::clone(&flaky), quick_retries(3));
    let payload = fetcher.fetch(&weather_source()).unwrap();
    assert_eq!(payload, IngestPayload::Json(serde_json::json!({"temp": 21})));
    assert_eq!(flaky.calls(), 3);
}

#[test]
fn retries_stop_at_the_attempt_limit() {
    let flaky = Arc::new(FlakyFetcher::new(10, || IngestError::Status {
        url: "https://weather.example/api".to_string(),
        status: 503,
    }));
    let fetcher = Retrying::new(Arc::clone(&flaky), quick_retries(3));
    let err = fetcher.fetch(&weather_source()).unwrap_err();
    assert!(matches!(err, IngestError::Status { status: 503, .. }));
    assert_eq!(flaky.calls(), 3);
}

#[test]
fn client_errors_are_not_retried() {
    let flaky = Arc::new(FlakyFetcher::new(10, || IngestError::Status {
        url: "https://weather.example/api".to_string(),
        status: 404,
    }));
    let fetcher = Retrying::new(Arc::clone(&flaky), quick_retries(3));
    assert!(fetcher.fetch(&weather_source()).is_err());
    assert_eq!(flaky.calls(), 1);
}

#[test]
fn source_fetcher_routes_urls_to_the_web_fetcher() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("notes.md");
    std::fs::write(&path, "# Notes").unwrap();

    let web = Arc::new(FlakyFetcher::new(0, || IngestError::Disconnected));
    let fetcher = SourceFetcher::new(Arc::clone(&web) as Arc<dyn Fetcher>);
    assert_eq!(
        fetcher.fetch(&IngestSource::File { path }).unwrap(),
        IngestPayload::Text("# Notes".to_string())
    );
    assert_eq!(web.calls(), 0);

    let pool = IngestPool::new(Arc::new(fetcher), 1);
    pool.handle()
        .submit(IngestRequest {
            target: "weather_forecast".to_string(),
            source_id: "forecast".to_string(),
            source: weather_source(),
        })
        .unwrap();
    let event = pool
        .recv_timeout(Duration::from_secs(5))
        .expect("event delivered");
    assert_eq!(
        event.result,
        Ok(IngestPayload::Json(serde_json::json!({"temp": 21})))
    );
    assert_eq!(web.calls(), 1);
    pool.shutdown();
}
