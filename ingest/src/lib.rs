mod http;

pub use http::{select, HttpFetcher, RetryPolicy, Retrying, SourceFetcher};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

const WORKER_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IngestSource {
    File {
        path: PathBuf,
    },
    Url {
        url: String,
        #[serde(default)]
        selector: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum IngestPayload {
    Text(String),
    Json(Value),
}

#[derive(Debug, Clone)]
pub struct IngestRequest {
    /// Widget instance id the result is delivered to.
    pub target: String,
    pub source_id: String,
    pub source: IngestSource,
}

#[derive(Debug, Clone)]
pub struct IngestEvent {
    pub target: String,
    pub source_id: String,
    pub result: Result<IngestPayload, String>,
}

#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported source: {0}")]
    Unsupported(String),
    #[error("request to {url} failed with status {status}")]
    Status { url: String, status: u16 },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("selector error: {0}")]
    Selector(String),
    #[error("ingest pool is not running")]
    Disconnected,
}

impl IngestError {
    /// Failures worth retrying: connection problems, throttling and server
    /// errors.
    pub fn is_transient(&self) -> bool {
        match self {
            IngestError::Transport(_) => true,
            IngestError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub trait Fetcher: Send + Sync {
    fn fetch(&self, source: &IngestSource) -> Result<IngestPayload, IngestError>;
}

impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    fn fetch(&self, source: &IngestSource) -> Result<IngestPayload, IngestError> {
        self.as_ref().fetch(source)
    }
}

/// Reads local files; `.json` files are parsed, anything else is text.
/// Url sources are refused; see [`SourceFetcher`] for both.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileFetcher;

impl Fetcher for FileFetcher {
    fn fetch(&self, source: &IngestSource) -> Result<IngestPayload, IngestError> {
        match source {
            IngestSource::File { path } => {
                let text = std::fs::read_to_string(path)?;
                let is_json = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
                if is_json {
                    Ok(IngestPayload::Json(serde_json::from_str(&text)?))
                } else {
                    Ok(IngestPayload::Text(text))
                }
            }
            IngestSource::Url { url, .. } => Err(IngestError::Unsupported(url.clone())),
        }
    }
}

/// Submission side of the pool, cloned into every widget.
#[derive(Debug, Clone, Default)]
pub struct IngestHandle {
    sender: Option<Sender<IngestRequest>>,
}

impl IngestHandle {
    /// A handle that refuses every request.
    pub fn disconnected() -> Self {
        Self { sender: None }
    }

    pub fn is_connected(&self) -> bool {
        self.sender.is_some()
    }

    pub fn submit(&self, request: IngestRequest) -> Result<(), IngestError> {
        let sender = self.sender.as_ref().ok_or(IngestError::Disconnected)?;
        sender
            .send(request)
            .map_err(|_| IngestError::Disconnected)
    }
}

/// Fixed-size worker pool; results are queued for the control thread.
pub struct IngestPool {
    sender: Sender<IngestRequest>,
    events: Receiver<IngestEvent>,
    workers: Vec<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl IngestPool {
    pub fn new(fetcher: Arc<dyn Fetcher>, workers: usize) -> Self {
        let (sender, requests) = mpsc::channel::<IngestRequest>();
        let (event_sender, events) = mpsc::channel::<IngestEvent>();
        let requests = Arc::new(Mutex::new(requests));
        let stop = Arc::new(AtomicBool::new(false));

        let workers = (0..workers.max(1))
            .map(|index| {
                let requests = Arc::clone(&requests);
                let fetcher = Arc::clone(&fetcher);
                let events = event_sender.clone();
                let stop = Arc::clone(&stop);
                std::thread::Builder::new()
                    .name(format!("ingest-{index}"))
                    .spawn(move || worker_loop(requests, fetcher, events, stop))
            })
            .filter_map(|spawned| match spawned {
                Ok(handle) => Some(handle),
                Err(err) => {
                    log::error!("failed to spawn ingest worker: {err}");
                    None
                }
            })
            .collect::<Vec<_>>();
        log::info!("ingest pool started with {} worker(s)", workers.len());

        Self {
            sender,
            events,
            workers,
            stop,
        }
    }

    pub fn handle(&self) -> IngestHandle {
        IngestHandle {
            sender: Some(self.sender.clone()),
        }
    }

    pub fn try_recv(&self) -> Option<IngestEvent> {
        self.events.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<IngestEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    pub fn drain(&self) -> Vec<IngestEvent> {
        self.events.try_iter().collect()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    fn stop_workers(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }

    pub fn shutdown(mut self) {
        self.stop_workers();
        log::info!("ingest pool stopped");
    }
}

impl Drop for IngestPool {
    fn drop(&mut self) {
        self.stop_workers();
    }
}

fn worker_loop(
    requests: Arc<Mutex<Receiver<IngestRequest>>>,
    fetcher: Arc<dyn Fetcher>,
    events: Sender<IngestEvent>,
    stop: Arc<AtomicBool>,
) {
    while !stop.load(Ordering::SeqCst) {
        let next = match requests.lock() {
            Ok(queue) => queue.recv_timeout(WORKER_POLL),
            Err(_) => break,
        };
        let request = match next {
            Ok(request) => request,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        log::debug!("fetching '{}' for {}", request.source_id, request.target);
        let result = fetcher.fetch(&request.source).map_err(|err| {
            log::warn!("ingest of '{}' failed: {err}", request.source_id);
            err.to_string()
        });
        let event = IngestEvent {
            target: request.target,
            source_id: request.source_id,
            result,
        };
        if events.send(event).is_err() {
            break;
        }
    }
}
