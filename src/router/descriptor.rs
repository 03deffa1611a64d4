//! Declarative endpoint description and its conversion to a wire request.

use http::header::CONTENT_TYPE;
use http::{HeaderName, HeaderValue};
use url::Url;

use crate::transport::HttpRequest;

use super::encoding::{form_encode, query_pairs};
use super::{ContentType, Headers, RequestBuildError};

/// JSON object holding request parameters.
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// HTTP methods a descriptor can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Trace,
    Delete,
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Patch => Self::PATCH,
            Method::Trace => Self::TRACE,
            Method::Delete => Self::DELETE,
        }
    }
}

/// How body-capable methods encode `params` when `is_url_encoded` is off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParameterEncoding {
    /// JSON object body.
    #[default]
    Json,
    /// `application/x-www-form-urlencoded` body.
    Form,
    /// URL query string, no body.
    Query,
}

/// Everything needed to build one endpoint call.
///
/// # Parameter placement
///
/// | method              | flag set            | placement                         |
/// |---------------------|---------------------|-----------------------------------|
/// | GET, DELETE         | `is_query_string`   | `query_params` in the query       |
/// | GET, DELETE         | otherwise           | `params` in the query             |
/// | POST, PUT, PATCH    | `is_url_encoded`    | `params` as a form body           |
/// | POST, PUT, PATCH    | otherwise           | `params` per `encoding`           |
/// | TRACE               | -                   | none                              |
///
/// GET and DELETE never carry a body. `is_url_encoded` takes precedence
/// over `encoding`.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub base_url: String,
    pub path: String,
    pub method: Method,
    pub headers: Option<Headers>,
    pub params: Option<Parameters>,
    pub query_params: Option<Parameters>,
    pub encoding: ParameterEncoding,
    pub is_url_encoded: bool,
    pub is_query_string: bool,
}

impl RequestDescriptor {
    /// Creates a descriptor with no headers, no parameters and JSON encoding.
    #[must_use]
    pub fn new(method: Method, base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            path: path.into(),
            method,
            headers: None,
            params: None,
            query_params: None,
            encoding: ParameterEncoding::default(),
            is_url_encoded: false,
            is_query_string: false,
        }
    }

    /// Sets the declared headers.
    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Sets the generic parameters.
    #[must_use]
    pub fn with_params(mut self, params: Parameters) -> Self {
        self.params = Some(params);
        self
    }

    /// Sets the query-only parameters, used by GET/DELETE with `is_query_string`.
    #[must_use]
    pub fn with_query_params(mut self, params: Parameters) -> Self {
        self.query_params = Some(params);
        self
    }

    /// Sets the body encoding used when `is_url_encoded` is off.
    #[must_use]
    pub const fn with_encoding(mut self, encoding: ParameterEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Selects a form body for body-capable methods.
    #[must_use]
    pub const fn url_encoded(mut self, enabled: bool) -> Self {
        self.is_url_encoded = enabled;
        self
    }

    /// Selects `query_params` over `params` for GET/DELETE.
    #[must_use]
    pub const fn query_string(mut self, enabled: bool) -> Self {
        self.is_query_string = enabled;
        self
    }

    /// Builds the wire request.
    ///
    /// # Errors
    ///
    /// - [`RequestBuildError::InvalidUrl`] if the base URL does not parse or
    ///   cannot carry a path
    /// - [`RequestBuildError::InvalidHeaderName`] /
    ///   [`RequestBuildError::InvalidHeaderValue`] for malformed headers
    /// - [`RequestBuildError::Serialization`] if a JSON body cannot be written
    pub fn to_wire_request(&self) -> Result<HttpRequest, RequestBuildError> {
        let url = self.resolve_url()?;
        let mut request = HttpRequest::new(self.method.into(), url);

        if let Some(headers) = &self.headers {
            for (name, value) in headers.iter() {
                let (name, value) = parse_header(name, value)?;
                request.headers.insert(name, value);
            }
        }

        match self.method {
            Method::Get | Method::Delete => {
                let params = if self.is_query_string {
                    self.query_params.as_ref()
                } else {
                    self.params.as_ref()
                };
                encode_query(&mut request.url, params);
            }
            Method::Post | Method::Put | Method::Patch => {
                if self.is_url_encoded {
                    encode_form(&mut request, self.params.as_ref());
                } else {
                    match self.encoding {
                        ParameterEncoding::Json => encode_json(&mut request, self.params.as_ref())?,
                        ParameterEncoding::Form => encode_form(&mut request, self.params.as_ref()),
                        ParameterEncoding::Query => {
                            encode_query(&mut request.url, self.params.as_ref());
                        }
                    }
                }
            }
            Method::Trace => {}
        }

        Ok(request)
    }

    fn resolve_url(&self) -> Result<Url, RequestBuildError> {
        let invalid = |reason: String| RequestBuildError::InvalidUrl {
            url: self.base_url.clone(),
            reason,
        };

        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| invalid("URL cannot be a base".to_string()))?;
            segments
                .pop_if_empty()
                .extend(self.path.split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), RequestBuildError> {
    let header_name =
        HeaderName::from_bytes(name.as_bytes()).map_err(|e| RequestBuildError::InvalidHeaderName {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
    let header_value =
        HeaderValue::from_str(value).map_err(|e| RequestBuildError::InvalidHeaderValue {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
    Ok((header_name, header_value))
}

fn non_empty(params: Option<&Parameters>) -> Option<&Parameters> {
    params.filter(|p| !p.is_empty())
}

fn encode_query(url: &mut Url, params: Option<&Parameters>) {
    if let Some(params) = non_empty(params) {
        url.query_pairs_mut().extend_pairs(query_pairs(params));
    }
}

fn encode_form(request: &mut HttpRequest, params: Option<&Parameters>) {
    if let Some(params) = non_empty(params) {
        set_default_content_type(request, ContentType::UrlEncoded);
        request.body = Some(form_encode(params).into_bytes());
    }
}

fn encode_json(
    request: &mut HttpRequest,
    params: Option<&Parameters>,
) -> Result<(), RequestBuildError> {
    if let Some(params) = params {
        set_default_content_type(request, ContentType::Json);
        request.body = Some(serde_json::to_vec(params)?);
    }
    Ok(())
}

fn set_default_content_type(request: &mut HttpRequest, content_type: ContentType) {
    if !request.headers.contains_key(CONTENT_TYPE) {
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type.as_str()));
    }
}
