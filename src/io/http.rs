use async_trait::async_trait;
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, HeaderMap, RANGE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use super::{RangeFetcher, check_length, check_range};
use crate::error::{Error, Result};

/// Transport settings for [`HttpRangeFetcher`].
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Per-request timeout
    pub timeout: Duration,
    /// How many times a timed out or refused request is retried.
    pub retries: u32,
    pub user_agent: String,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retries: 0,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// HTTP Range fetcher for a remote ZIP file
pub struct HttpRangeFetcher {
    client: Client,
    url: String,
    size: u64,
    transferred_bytes: AtomicU64,
    retries: u32,
}

impl HttpRangeFetcher {
    /// Connect to `url` and learn the archive length.
    ///
    /// A HEAD request is tried first. Servers that refuse HEAD or omit
    /// `Content-Length` are asked for the first byte instead, and the total
    /// is read from the `Content-Range` of that answer.
    pub async fn connect(url: &str, options: &HttpOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.as_str())
            .build()?;

        let size = match head_length(&client, url, options.retries).await? {
            Some(size) => size,
            None => probe_length(&client, url, options.retries).await?,
        };
        debug!(url, size, "connected");

        Ok(Self {
            client,
            url: url.to_string(),
            size,
            transferred_bytes: AtomicU64::new(0),
            retries: options.retries,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get total payload bytes transferred from network
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RangeFetcher for HttpRangeFetcher {
    async fn fetch(&self, start: u64, end: u64) -> Result<Vec<u8>> {
        check_range(start, end, self.size)?;

        let resp = send_range(&self.client, &self.url, start, end, self.retries).await?;

        if let Some(value) = resp.headers().get(CONTENT_RANGE) {
            let value = value.to_str().unwrap_or_default();
            match parse_content_range(value) {
                Some((first, last, _)) if first == start && last == end => {}
                _ => {
                    return Err(Error::RangeMismatch {
                        expected: format!("bytes {start}-{end}"),
                        actual: value.to_string(),
                    });
                }
            }
        }

        let bytes = resp.bytes().await?;
        check_length(start, end, bytes.len())?;

        self.transferred_bytes
            .fetch_add(bytes.len() as u64, Ordering::Relaxed);
        debug!(start, end, len = bytes.len(), "fetched range");

        Ok(bytes.to_vec())
    }

    fn size(&self) -> u64 {
        self.size
    }
}

/// Length from a HEAD request, or `None` when the server won't say.
async fn head_length(client: &Client, url: &str, retries: u32) -> Result<Option<u64>> {
    let resp = send(client.head(url), retries).await?;

    if !resp.status().is_success() {
        debug!(status = %resp.status(), "HEAD refused, probing with a range request");
        return Ok(None);
    }

    let accept_ranges = resp
        .headers()
        .get(ACCEPT_RANGES)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if accept_ranges.eq_ignore_ascii_case("none") {
        return Err(Error::RangeUnsupported(resp.status()));
    }

    Ok(content_length(resp.headers()))
}

/// `Content-Length` as a number. Zero is a real length: an empty resource.
fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}

/// Length from the `Content-Range` of a one-byte range request.
async fn probe_length(client: &Client, url: &str, retries: u32) -> Result<u64> {
    let resp = send_range(client, url, 0, 0, retries).await?;
    resp.headers()
        .get(CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_content_range)
        .and_then(|(_, _, total)| total)
        .ok_or(Error::MissingLength)
}

/// Send `GET` with `Range: bytes=start-end` and insist on `206 Partial Content`.
async fn send_range(
    client: &Client,
    url: &str,
    start: u64,
    end: u64,
    retries: u32,
) -> Result<Response> {
    let request = client.get(url).header(RANGE, format!("bytes={start}-{end}"));
    let resp = send(request, retries).await?;
    match resp.status() {
        StatusCode::PARTIAL_CONTENT => Ok(resp),
        StatusCode::OK => Err(Error::RangeUnsupported(StatusCode::OK)),
        status => Err(Error::HttpStatus(status)),
    }
}

/// Send `request`, retrying timeouts and connection failures up to `retries`
/// times with a linear backoff. Any answer, whatever its status, is returned.
async fn send(request: RequestBuilder, retries: u32) -> Result<Response> {
    let mut attempt = 0;

    loop {
        let Some(this_try) = request.try_clone() else {
            return Ok(request.send().await?);
        };
        match this_try.send().await {
            Ok(resp) => return Ok(resp),
            Err(e) if (e.is_timeout() || e.is_connect()) && attempt < retries => {
                attempt += 1;
                warn!(attempt, retries, error = %e, "connection error, retrying");
                tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Parse `bytes <first>-<last>/<total>`; the total may be `*`.
fn parse_content_range(value: &str) -> Option<(u64, u64, Option<u64>)> {
    let rest = value.trim().strip_prefix("bytes ")?;
    let (span, total) = rest.split_once('/')?;
    let (first, last) = span.split_once('-')?;
    let total = match total {
        "*" => None,
        total => Some(total.parse().ok()?),
    };
    Some((first.parse().ok()?, last.parse().ok()?, total))
}
