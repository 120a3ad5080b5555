//! HTTP image directory access.
//!
//! Listings and metadata are small documents fetched in one request.
//! Payloads are streamed and may be resumed with a `Range` request.

use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client, Response};
use reqwest::header::RANGE;
use reqwest::StatusCode;
use std::time::Duration;

use super::{listing::parse_listing, RemoteBody, RemoteSource};

/// Reads image directories over HTTP/HTTPS.
pub struct HttpSource {
    client: Client,
    connect_timeout: Duration,
}

impl HttpSource {
    /// Create a source with a 30-second connect timeout.
    pub fn new() -> Result<Self> {
        Self::with_connect_timeout(Duration::from_secs(30))
    }

    /// Create a source with a custom connect timeout.
    ///
    /// Image payloads can take a long time to transfer, so only the
    /// connection phase is bounded.
    pub fn with_connect_timeout(connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("shelter/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .timeout(None::<Duration>)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            connect_timeout,
        })
    }

    /// Get the configured connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    fn get(&self, url: &str) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to reach {}", url))?;
        if !response.status().is_success() {
            bail!("HTTP {} fetching {}", response.status(), url);
        }
        Ok(response)
    }
}

impl RemoteSource for HttpSource {
    fn list(&self, url: &str) -> Result<Vec<String>> {
        let directory = if url.ends_with('/') {
            url.to_string()
        } else {
            format!("{}/", url)
        };
        let body = self.get(&directory)?.text()?;
        let names = parse_listing(&body);
        tracing::debug!("Listed {} entries at {}", names.len(), directory);
        Ok(names)
    }

    fn fetch_text(&self, url: &str) -> Result<String> {
        Ok(self.get(url)?.text()?)
    }

    fn open(&self, url: &str, offset: u64) -> Result<RemoteBody> {
        if offset == 0 {
            let response = self.get(url)?;
            return Ok(body_from(response, 0));
        }

        let response = self
            .client
            .get(url)
            .header(RANGE, format!("bytes={}-", offset))
            .send()
            .with_context(|| format!("Failed to reach {}", url))?;

        match response.status() {
            StatusCode::PARTIAL_CONTENT => Ok(body_from(response, offset)),
            StatusCode::RANGE_NOT_SATISFIABLE => {
                tracing::debug!("Server rejected range {}- for {}, restarting", offset, url);
                Ok(body_from(self.get(url)?, 0))
            }
            status if status.is_success() => {
                tracing::debug!("Server ignored range request for {}, restarting", url);
                Ok(body_from(response, 0))
            }
            status => bail!("HTTP {} fetching {}", status, url),
        }
    }
}

fn body_from(response: Response, offset: u64) -> RemoteBody {
    RemoteBody {
        offset,
        reader: Box::new(response),
    }
}
