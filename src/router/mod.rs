//! Request construction layer.
//!
//! This module provides:
//! - An immutable header builder over closed header kinds ([`HeaderBuilder`])
//! - Declarative endpoint descriptors ([`RequestDescriptor`])
//! - The API's concrete endpoints ([`Route`])

mod descriptor;
mod encoding;
mod error;
mod headers;
mod route;


pub use descriptor::{Method, ParameterEncoding, Parameters, RequestDescriptor};
pub use encoding::{form_encode, query_pairs};
pub use error::RequestBuildError;
pub use headers::{
    Accept, AcceptEncoding, AcceptLanguage, Authorization, Connection, ContentType, Header,
    HeaderBuilder, Headers,
};
pub use route::{REGISTER_PATH, RegisterRequest, Route};
