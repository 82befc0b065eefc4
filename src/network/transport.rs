// * Transport seam between the pipeline and the network
// * HttpTransport talks to the real API; ScriptedTransport replays canned responses

use crate::network::errors::NetworkError;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

/// Type alias for async transport results
pub type TransportFuture<T> = Pin<Box<dyn Future<Output = Result<T, NetworkError>> + Send>>;

/// Minimal GET-only transport used by the page fetcher and the persister.
pub trait Transport: Send + Sync {
    /// Fetches a listing page body. The bearer token is sent when given.
    fn get_text(&self, url: &str, bearer: Option<&str>) -> TransportFuture<String>;

    /// Fetches a binary payload, failing on non-success statuses.
    fn get_bytes(&self, url: &str) -> TransportFuture<Vec<u8>>;
}

// * The Primary HTTP Engine.
// * No request timeout: large videos may legitimately take minutes.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    inner: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, NetworkError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder().default_headers(headers).gzip(true).build()?;
        Ok(Self { inner: client })
    }
}

impl Transport for HttpTransport {
    fn get_text(&self, url: &str, bearer: Option<&str>) -> TransportFuture<String> {
        let mut request = self.inner.get(url);
        if let Some(token) = bearer {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        Box::pin(async move {
            let resp = request.send().await?;
            let status = resp.status();
            if !status.is_success() {
                // * Body is still handed to the decoder; error payloads fail to decode and get retried
                tracing::warn!(status = status.as_u16(), "Listing request returned non-success status");
            }
            Ok(resp.text().await?)
        })
    }

    fn get_bytes(&self, url: &str) -> TransportFuture<Vec<u8>> {
        let request = self.inner.get(url);
        let url = url.to_string();

        Box::pin(async move {
            let resp = request.send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(NetworkError::Status {
                    status: status.as_u16(),
                    url,
                });
            }
            Ok(resp.bytes().await?.to_vec())
        })
    }
}

/// In-memory transport for tests and offline replays.
///
/// Page bodies are served per URL in FIFO order; the last queued body of a URL is
/// repeated once the queue is down to one entry. Every page request is logged.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    pages: Mutex<HashMap<String, VecDeque<String>>>,
    payloads: Mutex<HashMap<String, Vec<u8>>>,
    page_requests: Mutex<Vec<(String, Option<String>)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&self, url: &str, body: impl Into<String>) -> &Self {
        self.pages
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(body.into());
        self
    }

    pub fn insert_payload(&self, url: &str, bytes: Vec<u8>) -> &Self {
        self.payloads.lock().unwrap().insert(url.to_string(), bytes);
        self
    }

    /// URLs and bearer tokens of every page request so far.
    pub fn page_requests(&self) -> Vec<(String, Option<String>)> {
        self.page_requests.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn get_text(&self, url: &str, bearer: Option<&str>) -> TransportFuture<String> {
        self.page_requests
            .lock()
            .unwrap()
            .push((url.to_string(), bearer.map(str::to_string)));

        let mut pages = self.pages.lock().unwrap();
        let result = match pages.get_mut(url) {
            Some(queue) if queue.len() > 1 => Ok(queue.pop_front().unwrap_or_default()),
            Some(queue) => queue
                .front()
                .cloned()
                .ok_or_else(|| NetworkError::Transport(format!("no page scripted for {}", url))),
            None => Err(NetworkError::Transport(format!("no page scripted for {}", url))),
        };

        Box::pin(async move { result })
    }

    fn get_bytes(&self, url: &str) -> TransportFuture<Vec<u8>> {
        let result = self
            .payloads
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| NetworkError::Status {
                status: 404,
                url: url.to_string(),
            });

        Box::pin(async move { result })
    }
}
