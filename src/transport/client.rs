//! Production HTTP client implementation using reqwest.

use http::header::{CACHE_CONTROL, PRAGMA};
use http::{HeaderMap, HeaderValue};
use tokio_stream::StreamExt;

use super::{CachePolicy, HttpClient, HttpError, HttpRequest, HttpResponse, ProgressFn, TransportConfig};

/// Size of the chunks an upload body is streamed in.
const UPLOAD_CHUNK_SIZE: usize = 16 * 1024;

/// Production HTTP client using reqwest.
///
/// A thin wrapper around `reqwest::Client` implementing [`HttpClient`].
/// The wrapped client owns the connection pool, so one instance should be
/// shared by every call.
///
/// # Example
///
/// ```no_run
/// use netlayer::transport::{HttpClient, HttpRequest, ReqwestClient};
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ReqwestClient::new();
/// let url = Url::parse("https://api.example.com/health")?;
/// let response = client.request(HttpRequest::new(http::Method::GET, url)).await?;
/// println!("Status: {}", response.status);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new HTTP client with reqwest's default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
        }
    }

    /// Creates an HTTP client from an existing reqwest client.
    #[must_use]
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { inner: client }
    }

    /// Creates an HTTP client with the transport's timeouts and cache policy.
    ///
    /// `request_timeout` bounds each read, `resource_timeout` bounds the
    /// whole transmission.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Connection`] if the TLS backend or resolver
    /// cannot be initialised.
    pub fn with_config(config: &TransportConfig) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .read_timeout(config.request_timeout)
            .timeout(config.resource_timeout)
            .default_headers(default_headers(config.cache_policy))
            .build()
            .map_err(|e| HttpError::Connection(Box::new(e)))?;

        Ok(Self { inner: client })
    }

    fn builder(&self, req: &HttpRequest) -> reqwest::RequestBuilder {
        let mut builder = self.inner.request(req.method.clone(), req.url.as_str());
        for (name, value) in &req.headers {
            builder = builder.header(name, value);
        }
        builder
    }

    async fn execute(&self, builder: reqwest::RequestBuilder) -> Result<HttpResponse, HttpError> {
        let response = builder.send().await.map_err(map_send_error)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    HttpError::Timeout
                } else {
                    HttpError::Connection(Box::new(e))
                }
            })?
            .to_vec();

        Ok(HttpResponse::new(status, headers, body))
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

pub(super) fn default_headers(policy: CachePolicy) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if policy == CachePolicy::IgnoreLocal {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    }
    headers
}

fn map_send_error(e: reqwest::Error) -> HttpError {
    if e.is_timeout() {
        HttpError::Timeout
    } else if e.is_builder() {
        HttpError::InvalidUrl(e.to_string())
    } else {
        HttpError::Connection(Box::new(e))
    }
}

/// Splits `body` into chunks, each reporting the cumulative fraction sent
/// as it is handed to the connection.
pub(super) fn progress_chunks(
    body: Vec<u8>,
    progress: ProgressFn,
) -> impl tokio_stream::Stream<Item = Result<Vec<u8>, std::io::Error>> + Send + Sync + 'static {
    // Precision loss only matters for bodies beyond 2^52 bytes.
    #[allow(clippy::cast_precision_loss)]
    let total = body.len() as f64;
    let chunks: Vec<Vec<u8>> = body.chunks(UPLOAD_CHUNK_SIZE).map(<[u8]>::to_vec).collect();
    let mut sent = 0usize;

    tokio_stream::iter(chunks).map(move |chunk| {
        sent += chunk.len();
        #[allow(clippy::cast_precision_loss)]
        let fraction = sent as f64 / total;
        progress(fraction.clamp(0.0, 1.0));
        Ok(chunk)
    })
}

impl HttpClient for ReqwestClient {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut builder = self.builder(&req);
        if let Some(body) = req.body {
            builder = builder.body(body);
        }
        self.execute(builder).await
    }

    async fn request_with_progress(
        &self,
        req: HttpRequest,
        progress: ProgressFn,
    ) -> Result<HttpResponse, HttpError> {
        let mut builder = self.builder(&req);
        let body = req.body.unwrap_or_default();

        if body.is_empty() {
            let response = self.execute(builder).await?;
            progress(1.0);
            return Ok(response);
        }

        builder = builder
            .header(http::header::CONTENT_LENGTH, body.len())
            .body(reqwest::Body::wrap_stream(progress_chunks(body, progress)));
        self.execute(builder).await
    }
}
