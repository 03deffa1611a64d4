//! Error type for turning a descriptor into a wire request.

use thiserror::Error;

/// Error type for [`RequestDescriptor::to_wire_request`](super::RequestDescriptor::to_wire_request).
#[derive(Debug, Error)]
pub enum RequestBuildError {
    /// Base URL plus path does not form a valid URL.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The offending base URL string
        url: String,
        /// Reason for invalidity
        reason: String,
    },

    /// A declared header name is not a valid HTTP token.
    #[error("Invalid header name '{name}': {reason}")]
    InvalidHeaderName {
        /// The invalid header name
        name: String,
        /// Reason for invalidity
        reason: String,
    },

    /// A declared header value contains forbidden bytes.
    #[error("Invalid header value for '{name}': {reason}")]
    InvalidHeaderValue {
        /// The header name
        name: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Parameters could not be serialized into a JSON body.
    #[error("Failed to serialize parameters: {0}")]
    Serialization(#[from] serde_json::Error),
}
