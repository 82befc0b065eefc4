use crate::network::errors::NetworkError;
use crate::network::schema::GalleryPage;
use crate::network::transport::Transport;
use crate::ops::telemetry;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

// * Authenticated page fetcher for the listing endpoint.
// * Bodies that fail to decode are retried with a fixed delay; transport errors are not.
pub struct PageFetcher {
    transport: Arc<dyn Transport>,
    api_key: String,
    max_attempts: u32,
    retry_delay: Duration,
}

impl PageFetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        api_key: impl Into<String>,
        max_attempts: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    // * Fetches and decodes one page.
    // * Returns RetriesExhausted once every attempt produced an undecodable body.
    pub async fn fetch(&self, url: &str) -> Result<GalleryPage, NetworkError> {
        let mut attempt = 1;

        loop {
            let body = self.transport.get_text(url, Some(&self.api_key)).await?;

            match serde_json::from_str::<GalleryPage>(&body) {
                Ok(page) => {
                    debug!(url = url, attempt = attempt, items = page.items.len(), "Page decoded");
                    telemetry::record_page_fetched();
                    return Ok(page);
                }
                Err(e) if attempt < self.max_attempts => {
                    warn!(
                        url = url,
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Page did not decode, retrying in {}s",
                        self.retry_delay.as_secs()
                    );
                    telemetry::record_fetch_retry();
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(NetworkError::RetriesExhausted {
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::transport::ScriptedTransport;

    const URL: &str = "https://api.test/images?sort=Newest&nsfw=false";
    const EMPTY_PAGE: &str = r#"{"items": []}"#;

    fn fetcher(transport: Arc<ScriptedTransport>, attempts: u32) -> PageFetcher {
        PageFetcher::new(transport, "secret", attempts, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_sends_bearer_token() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_page(URL, EMPTY_PAGE);

        let page = fetcher(transport.clone(), 3).fetch(URL).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(transport.page_requests(), vec![(URL.to_string(), Some("secret".to_string()))]);
    }

    #[tokio::test]
    async fn test_recovers_after_two_bad_bodies() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .push_page(URL, "<html>Bad Gateway</html>")
            .push_page(URL, "{\"items\": [")
            .push_page(URL, EMPTY_PAGE);

        let result = fetcher(transport.clone(), 3).fetch(URL).await;
        assert!(result.is_ok());
        assert_eq!(transport.page_requests().len(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_page(URL, "not json");

        let result = fetcher(transport.clone(), 3).fetch(URL).await;
        assert!(matches!(result, Err(NetworkError::RetriesExhausted { attempts: 3, .. })));
        assert_eq!(transport.page_requests().len(), 3);
    }

    #[tokio::test]
    async fn test_transport_error_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::new());

        let result = fetcher(transport.clone(), 3).fetch(URL).await;
        assert!(matches!(result, Err(NetworkError::Transport(_))));
        assert_eq!(transport.page_requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_fixed_delay_between_attempts() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_page(URL, "oops").push_page(URL, EMPTY_PAGE);

        let fetcher = PageFetcher::new(transport, "secret", 3, Duration::from_secs(30));
        let started = tokio::time::Instant::now();
        fetcher.fetch(URL).await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(30));
    }
}
