use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::ReadAt;
use anyhow::{Result, anyhow, bail};

/// Default number of bytes fetched past the requested range
pub const DEFAULT_READ_AHEAD: usize = 256 * 1024;

/// Bytes of the last Range response, kept for the reads that follow it.
#[derive(Default)]
struct Window {
    offset: u64,
    data: Vec<u8>,
}

impl Window {
    fn covers(&self, offset: u64, len: usize) -> bool {
        offset >= self.offset && offset + len as u64 <= self.offset + self.data.len() as u64
    }
}

/// Archive source served over HTTP Range requests.
///
/// The chunk reader walks the archive front to back in small steps: an
/// 8-byte header, then its payload, then the next header. Each request
/// fetches at least `read_ahead` bytes and the reads it covers are served
/// from memory, so a run of small chunks costs a single round trip.
pub struct HttpRangeReader {
    client: Client,
    url: String,
    size: u64,
    read_ahead: usize,
    window: Mutex<Window>,
    transferred_bytes: AtomicU64,
    requests: AtomicU64,
    max_retry: u32,
}

impl HttpRangeReader {
    /// Send a HEAD request to `url` and build a reader for it.
    ///
    /// Fails if the server does not advertise byte ranges or omits the
    /// content length, since chunks are located by absolute offset.
    pub async fn new(url: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        let resp = client.head(&url).send().await?;
        if !resp.status().is_success() {
            bail!("HTTP request failed with status: {}", resp.status());
        }

        let accept_ranges = resp
            .headers()
            .get("accept-ranges")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("none");
        if !accept_ranges.contains("bytes") {
            bail!("Remote server does not support Range requests");
        }

        let size = resp
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| anyhow!("Remote server did not return Content-Length"))?;

        debug!("remote archive {} is {} bytes", url, size);

        Ok(Self {
            client,
            url,
            size,
            read_ahead: DEFAULT_READ_AHEAD,
            window: Mutex::new(Window::default()),
            transferred_bytes: AtomicU64::new(0),
            requests: AtomicU64::new(0),
            max_retry: 10,
        })
    }

    /// Set the minimum number of bytes fetched per request. Zero fetches
    /// exactly what each read asks for.
    pub fn with_read_ahead(mut self, bytes: usize) -> Self {
        self.read_ahead = bytes;
        self
    }

    /// Total bytes received from the network so far
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }

    /// Number of Range requests that returned data
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Fetch `[offset, end]` inclusive, retrying connection failures.
    async fn fetch(&self, offset: u64, end: u64) -> Result<Vec<u8>> {
        let expected_size = (end - offset + 1) as usize;
        let mut data = Vec::with_capacity(expected_size);
        let mut retry_count = 0;

        while data.len() < expected_size {
            let range = format!("bytes={}-{}", offset + data.len() as u64, end);

            match self
                .client
                .get(&self.url)
                .header("Range", &range)
                .send()
                .await
            {
                Ok(resp) => {
                    if resp.status() != reqwest::StatusCode::PARTIAL_CONTENT {
                        bail!("HTTP request failed with status: {}", resp.status());
                    }

                    let bytes = resp.bytes().await?;
                    self.requests.fetch_add(1, Ordering::Relaxed);
                    if bytes.is_empty() {
                        break;
                    }
                    let chunk_len = bytes.len().min(expected_size - data.len());
                    data.extend_from_slice(&bytes[..chunk_len]);

                    self.transferred_bytes
                        .fetch_add(chunk_len as u64, Ordering::Relaxed);
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    retry_count += 1;
                    if retry_count >= self.max_retry {
                        bail!("Max retries exceeded fetching {}", range);
                    }
                    warn!(
                        "Connection error, retry {}/{}: {}",
                        retry_count, self.max_retry, e
                    );
                    tokio::time::sleep(Duration::from_millis(500 * retry_count as u64)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(data)
    }

    /// Copy from the window if it holds all of `[offset, offset + buf.len())`.
    fn read_cached(&self, offset: u64, buf: &mut [u8]) -> bool {
        let window = self.window.lock().unwrap_or_else(|e| e.into_inner());
        if !window.covers(offset, buf.len()) {
            return false;
        }
        let start = (offset - window.offset) as usize;
        buf.copy_from_slice(&window.data[start..start + buf.len()]);
        true
    }
}

#[async_trait]
impl ReadAt for HttpRangeReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        let len = (buf.len() as u64).min(self.size - offset) as usize;
        if self.read_cached(offset, &mut buf[..len]) {
            return Ok(len);
        }

        let want = len.max(self.read_ahead) as u64;
        let end = (offset + want - 1).min(self.size - 1);
        let data = self.fetch(offset, end).await?;

        let n = data.len().min(len);
        buf[..n].copy_from_slice(&data[..n]);
        *self.window.lock().unwrap_or_else(|e| e.into_inner()) = Window { offset, data };

        Ok(n)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
