//! Immutable header builder over a closed set of recognised header kinds.

use std::collections::BTreeMap;

/// Accumulated request headers keyed by lower-cased header name.
///
/// Insertion uses update-or-insert semantics: the last value written for a
/// given name wins. Iteration order is sorted by name, which keeps wire
/// requests built from the same headers byte-identical.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: BTreeMap<String, String>,
}

impl Headers {
    /// Creates an empty header map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a header. The name is lower-cased.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Returns the value for `name`, matched case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns true if a header with `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no headers are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// `connection` header values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    KeepAlive,
    Close,
}

/// `accept` header values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    /// `*/*`
    Any,
    /// `application/json`
    Json,
    /// `application/json; charset=utf-8`
    JsonUtf8,
    /// `text/plain`
    PlainText,
    /// `application/json, text/plain, */*`
    Combined,
}

/// `content-type` header values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    JsonUtf8,
    UrlEncoded,
    Multipart,
}

/// `accept-encoding` header values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptEncoding {
    Gzip,
    Compress,
    Deflate,
    Br,
    Identity,
    Any,
}

/// `accept-language` header values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptLanguage {
    En,
    Fa,
    Any,
}

/// `authorization` header values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    /// `Basic <credentials>`; credentials are passed through as given.
    Basic(String),
    /// `Bearer <token>`
    Bearer(String),
}

impl Connection {
    const fn as_str(self) -> &'static str {
        match self {
            Self::KeepAlive => "keep-alive",
            Self::Close => "close",
        }
    }
}

impl Accept {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Any => "*/*",
            Self::Json => "application/json",
            Self::JsonUtf8 => "application/json; charset=utf-8",
            Self::PlainText => "text/plain",
            Self::Combined => "application/json, text/plain, */*",
        }
    }
}

impl ContentType {
    /// Returns the header value for this content type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::JsonUtf8 => "application/json; charset=utf-8",
            Self::UrlEncoded => "application/x-www-form-urlencoded; charset=utf-8",
            Self::Multipart => "multipart/form-data",
        }
    }
}

impl AcceptEncoding {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Compress => "compress",
            Self::Deflate => "deflate",
            Self::Br => "br",
            Self::Identity => "identity",
            Self::Any => "*",
        }
    }
}

impl AcceptLanguage {
    const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fa => "fa",
            Self::Any => "*",
        }
    }
}

impl Authorization {
    fn value(&self) -> String {
        match self {
            Self::Basic(credentials) => format!("Basic {credentials}"),
            Self::Bearer(token) => format!("Bearer {token}"),
        }
    }
}

/// One recognised header: a fixed name plus a value from a closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    Connection(Connection),
    Accept(Accept),
    ContentType(ContentType),
    AcceptEncoding(AcceptEncoding),
    AcceptLanguage(AcceptLanguage),
    Authorization(Authorization),
}

impl Header {
    /// The lower-cased header name this kind always maps to.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Accept(_) => "accept",
            Self::ContentType(_) => "content-type",
            Self::AcceptEncoding(_) => "accept-encoding",
            Self::AcceptLanguage(_) => "accept-language",
            Self::Authorization(_) => "authorization",
        }
    }

    /// The header value.
    #[must_use]
    pub fn value(&self) -> String {
        match self {
            Self::Connection(v) => v.as_str().to_string(),
            Self::Accept(v) => v.as_str().to_string(),
            Self::ContentType(v) => v.as_str().to_string(),
            Self::AcceptEncoding(v) => v.as_str().to_string(),
            Self::AcceptLanguage(v) => v.as_str().to_string(),
            Self::Authorization(v) => v.value(),
        }
    }
}

macro_rules! impl_from_kind {
    ($($kind:ident),* $(,)?) => {
        $(
            impl From<$kind> for Header {
                fn from(value: $kind) -> Self {
                    Self::$kind(value)
                }
            }
        )*
    };
}

impl_from_kind!(
    Connection,
    Accept,
    ContentType,
    AcceptEncoding,
    AcceptLanguage,
    Authorization,
);

/// Value builder for [`Headers`].
///
/// Every `with*` call consumes the builder and returns a new one, so there
/// is no shared mutable state between call sites.
///
/// # Example
///
/// ```
/// use netlayer::router::{Accept, AcceptEncoding, HeaderBuilder};
///
/// let headers = HeaderBuilder::new()
///     .with(Accept::Json)
///     .with(AcceptEncoding::Gzip)
///     .with_custom("X-Request-Source", "mobile")
///     .build();
///
/// assert_eq!(headers.get("accept"), Some("application/json"));
/// assert_eq!(headers.get("x-request-source"), Some("mobile"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBuilder {
    headers: Headers,
}

impl HeaderBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a recognised header, replacing any previous value for its name.
    #[must_use]
    pub fn with(mut self, header: impl Into<Header>) -> Self {
        let header = header.into();
        self.headers.insert(header.name(), header.value());
        self
    }

    /// Sets an arbitrary header. Name and value are accepted verbatim.
    #[must_use]
    pub fn with_custom(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns the accumulated headers. The builder keeps its state.
    #[must_use]
    pub fn build(&self) -> Headers {
        self.headers.clone()
    }
}
