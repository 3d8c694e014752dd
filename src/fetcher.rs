//! Page fetching.
//!
//! [`Fetch`] is the seam between the aggregator and the network: the
//! production implementation is [`HttpFetcher`], tests substitute canned
//! responses.

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::error::Error;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

/// Why a page could not be fetched.
#[derive(Debug)]
pub enum FetchError {
    /// Connection, TLS, timeout or other transport failure.
    Request(reqwest::Error),
    /// The server answered with a non-2xx status.
    Status(u16),
    /// The response body could not be read.
    Body(reqwest::Error),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Request(e) if e.is_timeout() => write!(f, "request timed out: {e}"),
            FetchError::Request(e) => write!(f, "request failed: {e}"),
            FetchError::Status(code) => write!(f, "unexpected HTTP status {code}"),
            FetchError::Body(e) => write!(f, "failed to read response body: {e}"),
        }
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FetchError::Request(e) | FetchError::Body(e) => Some(e),
            FetchError::Status(_) => None,
        }
    }
}

/// Anything that can turn a URL into an HTML body.
pub trait Fetch {
    /// Fetch `url`, returning the body on a 2xx response.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// HTTP fetcher with a fixed user agent and a per-request timeout. No retries.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher sending `user_agent` on every request.
    ///
    /// # Arguments
    ///
    /// * `user_agent` - Value of the `User-Agent` header
    /// * `timeout` - Upper bound for a whole request, connect to last body byte
    ///
    /// # Returns
    ///
    /// The fetcher, or an error if the user agent is not a valid header value
    /// or the HTTP client cannot be built.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, Box<dyn Error>> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(FetchError::Body)?;
        debug!(bytes = body.len(), %status, "Fetched page");
        Ok(body)
    }
}
