//! netlayer: client networking layer
//!
//! A library for talking to a JSON API through one shared transport that
//! injects bearer tokens per attempt, retries within a fixed budget and
//! delivers results to a designated context as observable state.
//!
//! - [`router`] describes endpoints and turns them into wire requests
//! - [`transport`] sends them with adaptation, validation, decoding and retries
//! - [`services`] exposes one typed method per endpoint
//! - [`session`] owns the transport and services
//! - [`viewmodel`] republishes call outcomes as `{loading, error, result}`

pub mod config;
pub mod dispatch;
pub mod router;
pub mod services;
pub mod session;
pub mod time;
pub mod transport;
pub mod viewmodel;
