use thiserror::Error;

// * Unified Error type for the Network Layer.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Page did not decode after {attempts} attempt(s): {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // * Raised by in-memory transports (tests, offline replays)
    #[error("Transport failure: {0}")]
    Transport(String),
}
