//! The transport client: adapt, transmit, validate, decode, retry.

use std::sync::Arc;
use std::time::Duration;

use http::HeaderValue;
use http::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;

use crate::router::{RequestBuildError, RequestDescriptor};
use crate::time::{Sleeper, TokioSleeper};

use super::multipart::MultipartBody;
use super::{
    Call, HttpClient, HttpRequest, NoopAdapter, ProgressFn, RequestAdapter, RetryDecision,
    RetryPolicy, TransportError,
};

/// How responses may be served from caches between client and origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CachePolicy {
    /// Always revalidate with the origin (`cache-control: no-cache`).
    #[default]
    IgnoreLocal,
    /// Leave caching headers to the caller.
    Default,
}

/// Settings fixed when a transport is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Maximum idle time waiting for data on a request.
    pub request_timeout: Duration,
    /// Maximum total time for one transmission.
    pub resource_timeout: Duration,
    /// Cache policy applied to every request.
    pub cache_policy: CachePolicy,
    /// Retry policy applied to every call.
    pub retry: RetryPolicy,
}

impl TransportConfig {
    /// Default request timeout (30 seconds).
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Default resource timeout (30 seconds).
    pub const DEFAULT_RESOURCE_TIMEOUT: Duration = Duration::from_secs(30);
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
            resource_timeout: Self::DEFAULT_RESOURCE_TIMEOUT,
            cache_policy: CachePolicy::default(),
            retry: RetryPolicy::default(),
        }
    }
}

struct Inner<H, S> {
    client: H,
    sleeper: S,
    adapter: Arc<dyn RequestAdapter>,
    retry: RetryPolicy,
}

/// Long-lived HTTP transport shared by endpoint services.
///
/// Cloning is cheap; clones share the client, adapter and policy.
///
/// # Type Parameters
///
/// - `H`: The HTTP client implementation
/// - `S`: The sleeper used for retry delays (defaults to [`TokioSleeper`])
///
/// # Example
///
/// ```no_run
/// use netlayer::router::{RegisterRequest, Route};
/// use netlayer::transport::{ReqwestClient, Transport};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = Transport::new(ReqwestClient::new());
/// let descriptor = Route::Register(RegisterRequest::new("alice", "s3cret"))
///     .descriptor("https://api.example.com");
/// let result: serde_json::Value = transport.send(&descriptor).await?;
/// println!("{result}");
/// # Ok(())
/// # }
/// ```
pub struct Transport<H, S = TokioSleeper> {
    inner: Arc<Inner<H, S>>,
}

impl<H, S> Clone for Transport<H, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<H, S> std::fmt::Debug for Transport<H, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("retry", &self.inner.retry)
            .finish_non_exhaustive()
    }
}

impl<H> Transport<H, TokioSleeper> {
    /// Creates a transport with no request adapter and the default retry policy.
    #[must_use]
    pub fn new(client: H) -> Self {
        Self::from_parts(client, TokioSleeper, Arc::new(NoopAdapter), RetryPolicy::default())
    }
}

impl<H, S> Transport<H, S> {
    /// Creates a transport from all of its parts.
    #[must_use]
    pub fn from_parts(
        client: H,
        sleeper: S,
        adapter: Arc<dyn RequestAdapter>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                sleeper,
                adapter,
                retry,
            }),
        }
    }

    /// Returns the retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.inner.retry
    }

    /// Returns the underlying HTTP client.
    #[must_use]
    pub fn client(&self) -> &H {
        &self.inner.client
    }
}

impl<H, S> Transport<H, S>
where
    H: HttpClient + 'static,
    S: Sleeper + 'static,
{
    /// Sends the described request and decodes a 2xx JSON body as `T`.
    ///
    /// Construction failures resolve the call immediately with
    /// [`TransportError::InvalidUrl`] or [`TransportError::Build`].
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn send<T>(&self, descriptor: &RequestDescriptor) -> Call<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let inner = self.inner.clone();
        let request = descriptor.to_wire_request();

        Call::spawn(async move { inner.execute(request?, None).await })
    }

    /// Uploads `file` as a multipart body wrapped in the described request.
    ///
    /// The part's content type is sniffed from the bytes. With no bytes, or
    /// bytes of an unknown type, the body is empty. `on_progress` receives
    /// fractions in `[0.0, 1.0]` as the body is sent.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn upload<T>(
        &self,
        descriptor: &RequestDescriptor,
        file: Option<Vec<u8>>,
        file_name: &str,
        on_progress: impl Fn(f64) + Send + Sync + 'static,
    ) -> Call<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let inner = self.inner.clone();
        let envelope = descriptor.to_wire_request();
        let file_name = file_name.to_string();
        let progress: ProgressFn = Arc::new(move |fraction: f64| on_progress(fraction.clamp(0.0, 1.0)));

        Call::spawn(async move {
            let mut request = envelope?;
            let body = MultipartBody::encode(file.as_deref(), &file_name);
            let content_type = HeaderValue::from_str(&body.content_type()).map_err(|e| {
                RequestBuildError::InvalidHeaderValue {
                    name: CONTENT_TYPE.to_string(),
                    reason: e.to_string(),
                }
            })?;
            request.headers.insert(CONTENT_TYPE, content_type);
            request.body = Some(body.into_bytes());

            inner.execute(request, Some(progress)).await
        })
    }
}

impl<H: HttpClient, S: Sleeper> Inner<H, S> {
    async fn execute<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
        progress: Option<ProgressFn>,
    ) -> Result<T, TransportError> {
        let mut retries: u32 = 0;

        loop {
            let attempt = self.adapter.adapt(request.clone());
            tracing::debug!(
                "{} {} (attempt {})",
                attempt.method,
                attempt.url,
                retries + 1
            );

            let error = match self.attempt(attempt, progress.clone()).await {
                Ok(body) => return serde_json::from_slice(&body).map_err(TransportError::Decoding),
                Err(e) => e,
            };

            if !error.is_retry_candidate() {
                return Err(error);
            }

            match self.retry.decide(retries, error.status()) {
                RetryDecision::Stop if retries > 0 && self.retry.is_exhausted(retries) => {
                    return Err(TransportError::RetriesExhausted {
                        attempts: retries + 1,
                        last_error: Box::new(error),
                    });
                }
                RetryDecision::Stop => return Err(error),
                RetryDecision::RetryNow => {
                    tracing::warn!("Attempt {} failed ({error}), retrying", retries + 1);
                }
                RetryDecision::RetryAfter(delay) => {
                    tracing::warn!(
                        "Attempt {} failed ({error}), retrying in {delay:?}",
                        retries + 1
                    );
                    self.sleeper.sleep(delay).await;
                }
            }

            retries += 1;
        }
    }

    /// One transmission: returns the body of a 2xx response.
    async fn attempt(
        &self,
        request: HttpRequest,
        progress: Option<ProgressFn>,
    ) -> Result<Vec<u8>, TransportError> {
        let response = match progress {
            Some(progress) => self.client.request_with_progress(request, progress).await?,
            None => self.client.request(request).await?,
        };

        if response.is_success() {
            return Ok(response.body);
        }

        Err(TransportError::Validation {
            status: response.status,
            body: response.body_text().map(ToString::to_string),
        })
    }
}
