//! Wire request/response types and the HTTP client seam.

use std::sync::Arc;

use super::HttpError;

/// Callback receiving upload progress as a fraction in `[0.0, 1.0]`.
pub type ProgressFn = Arc<dyn Fn(f64) + Send + Sync>;

/// A fully-formed HTTP request ready to transmit.
///
/// Built once per call from a [`RequestDescriptor`](crate::router::RequestDescriptor);
/// each attempt works on a fresh clone that only the
/// [`RequestAdapter`](super::RequestAdapter) mutates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method
    pub method: http::Method,
    /// Target URL, query string included
    pub url: url::Url,
    /// HTTP headers to send
    pub headers: http::HeaderMap,
    /// Optional request body
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Creates a new HTTP request with the given method and URL.
    ///
    /// Headers are initialized to an empty map and body is `None`.
    #[must_use]
    pub fn new(method: http::Method, url: url::Url) -> Self {
        Self {
            method,
            url,
            headers: http::HeaderMap::new(),
            body: None,
        }
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets a header, replacing any existing values for the name.
    #[must_use]
    pub fn with_header(mut self, name: http::HeaderName, value: http::HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns the body length in bytes (0 when there is no body).
    #[must_use]
    pub fn body_len(&self) -> usize {
        self.body.as_ref().map_or(0, Vec::len)
    }
}

/// An HTTP response received from a server.
///
/// The body is fully buffered into memory.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: http::StatusCode,
    /// Response headers
    pub headers: http::HeaderMap,
    /// Response body (fully buffered)
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a new HTTP response.
    #[must_use]
    pub const fn new(status: http::StatusCode, headers: http::HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns true if the status code indicates success (2xx).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the body as a UTF-8 string, if valid.
    #[must_use]
    pub fn body_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

/// Trait for transmitting HTTP requests.
///
/// Abstracts the HTTP library so the transport pipeline can be driven by
/// mock clients in tests.
///
/// # Example
///
/// ```ignore
/// use netlayer::transport::{HttpClient, HttpRequest, HttpResponse, HttpError};
///
/// struct MockClient {
///     response: HttpResponse,
/// }
///
/// impl HttpClient for MockClient {
///     async fn request(&self, _req: HttpRequest) -> Result<HttpResponse, HttpError> {
///         Ok(self.response.clone())
///     }
/// }
/// ```
pub trait HttpClient: Send + Sync {
    /// Sends an HTTP request and returns the response.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] when:
    /// - Network connection fails ([`HttpError::Connection`])
    /// - Request times out ([`HttpError::Timeout`])
    /// - URL is invalid ([`HttpError::InvalidUrl`])
    fn request(
        &self,
        req: HttpRequest,
    ) -> impl std::future::Future<Output = Result<HttpResponse, HttpError>> + Send;

    /// Sends an HTTP request, reporting body upload progress.
    ///
    /// The default implementation cannot observe the bytes on the wire and
    /// reports `1.0` once the response has arrived.
    ///
    /// # Errors
    ///
    /// Same as [`HttpClient::request`].
    fn request_with_progress(
        &self,
        req: HttpRequest,
        progress: ProgressFn,
    ) -> impl std::future::Future<Output = Result<HttpResponse, HttpError>> + Send {
        async move {
            let response = self.request(req).await?;
            progress(1.0);
            Ok(response)
        }
    }
}
