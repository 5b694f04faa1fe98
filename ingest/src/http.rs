use crate::{FileFetcher, Fetcher, IngestError, IngestPayload, IngestSource};
use std::sync::Arc;
use std::time::Duration;

/// Fetches `Url` sources over HTTP GET.
///
/// JSON responses are parsed; anything else is returned as text. A
/// `selector` is a JSON pointer into the parsed body.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, source: &IngestSource) -> Result<IngestPayload, IngestError> {
        let IngestSource::Url { url, selector } = source else {
            return Err(IngestError::Unsupported("file source over http".to_string()));
        };
        let response = self.agent.get(url).call().map_err(|err| match err {
            ureq::Error::Status(status, _) => IngestError::Status {
                url: url.clone(),
                status,
            },
            ureq::Error::Transport(transport) => IngestError::Transport(transport.to_string()),
        })?;
        let is_json = response.content_type().contains("json");
        let body = response.into_string()?;
        let payload = if is_json {
            IngestPayload::Json(serde_json::from_str(&body)?)
        } else {
            IngestPayload::Text(body)
        };
        match selector {
            Some(pointer) => select(payload, pointer),
            None => Ok(payload),
        }
    }
}

/// Narrows a JSON payload to the value at `pointer`.
pub fn select(payload: IngestPayload, pointer: &str) -> Result<IngestPayload, IngestError> {
    let IngestPayload::Json(value) = payload else {
        return Err(IngestError::Selector(format!(
            "'{pointer}' needs a json response"
        )));
    };
    value
        .pointer(pointer)
        .cloned()
        .map(IngestPayload::Json)
        .ok_or_else(|| IngestError::Selector(format!("nothing at '{pointer}'")))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub backoff: Duration,
    pub factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(1500),
            factor: 1.5,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based).
    pub fn delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16) as i32;
        self.backoff.mul_f64(self.factor.max(1.0).powi(exponent))
    }
}

/// Retries transient failures of the wrapped fetcher with exponential
/// backoff. Other errors are returned at once.
pub struct Retrying<F> {
    inner: F,
    policy: RetryPolicy,
}

impl<F: Fetcher> Retrying<F> {
    pub fn new(inner: F, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<F: Fetcher> Fetcher for Retrying<F> {
    fn fetch(&self, source: &IngestSource) -> Result<IngestPayload, IngestError> {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.inner.fetch(source) {
                Err(err) if err.is_transient() && attempt < attempts => {
                    let delay = self.policy.delay(attempt);
                    log::info!(
                        "retrying {} in {:.2}s (attempt {attempt}/{attempts}): {err}",
                        source.describe(),
                        delay.as_secs_f64()
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) if err.is_transient() => {
                    log::error!("giving up on {} after {attempts} attempt(s)", source.describe());
                    return Err(err);
                }
                result => return result,
            }
        }
    }
}

/// Sends file sources to [`FileFetcher`] and url sources to `web`.
pub struct SourceFetcher {
    file: FileFetcher,
    web: Arc<dyn Fetcher>,
}

impl SourceFetcher {
    pub fn new(web: Arc<dyn Fetcher>) -> Self {
        Self {
            file: FileFetcher,
            web,
        }
    }

    /// Local files plus HTTP with the given timeout and retry policy.
    pub fn with_http(timeout: Duration, policy: RetryPolicy) -> Self {
        Self::new(Arc::new(Retrying::new(HttpFetcher::new(timeout), policy)))
    }
}

impl Fetcher for SourceFetcher {
    fn fetch(&self, source: &IngestSource) -> Result<IngestPayload, IngestError> {
        match source {
            IngestSource::File { .. } => self.file.fetch(source),
            IngestSource::Url { .. } => self.web.fetch(source),
        }
    }
}

impl IngestSource {
    pub fn describe(&self) -> String {
        match self {
            IngestSource::File { path } => path.display().to_string(),
            IngestSource::Url { url, .. } => url.clone(),
        }
    }
}
