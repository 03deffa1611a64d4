//! Transport layer: turns request descriptors into decoded results.
//!
//! This module provides types and traits for:
//! - Wire requests and responses ([`HttpRequest`], [`HttpResponse`])
//! - Abstracting HTTP clients ([`HttpClient`]) and the production
//!   implementation ([`ReqwestClient`])
//! - Decorating requests before each attempt ([`RequestAdapter`], [`BearerAdapter`])
//! - Bounded retries ([`RetryPolicy`])
//! - Cancelable calls ([`Call`], [`CancelHandle`])
//! - The shared pipeline itself ([`Transport`])

mod auth;
mod call;
mod client;
mod error;
mod http;
mod multipart;
mod pipeline;
mod retry;

#[cfg(test)]
mod pipeline_tests;

pub use auth::{
    BearerAdapter, FileToken, NoToken, NoopAdapter, RequestAdapter, SharedToken, StaticToken,
    TokenSource, expand_tilde,
};
pub use call::{Call, CallResult, CancelHandle};
pub use client::ReqwestClient;
pub use error::{HttpError, TransportError};
pub use http::{HttpClient, HttpRequest, HttpResponse, ProgressFn};
pub use multipart::{MultipartBody, sniff_content_type};
pub use pipeline::{CachePolicy, Transport, TransportConfig};
pub use retry::{RetryDecision, RetryPolicy};
