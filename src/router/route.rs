//! Concrete endpoints of the API.

use serde::{Deserialize, Serialize};

use super::{
    Accept, AcceptEncoding, Connection, ContentType, HeaderBuilder, Method, Parameters,
    RequestDescriptor,
};

/// Path of the registration endpoint, relative to the base URL.
pub const REGISTER_PATH: &str = "/api/v1/authentication/register";

/// Body of a registration call.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

impl RegisterRequest {
    /// Creates a registration request.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    fn to_params(&self) -> Parameters {
        let mut params = Parameters::new();
        params.insert("username".to_string(), self.username.clone().into());
        params.insert("password".to_string(), self.password.clone().into());
        params
    }
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One logical API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `POST /api/v1/authentication/register` with a JSON body.
    Register(RegisterRequest),
}

impl Route {
    /// Describes this call against `base_url`.
    ///
    /// The `authorization` header is left to the request adapter so a
    /// refreshed token reaches every attempt.
    #[must_use]
    pub fn descriptor(&self, base_url: &str) -> RequestDescriptor {
        match self {
            Self::Register(request) => {
                let headers = HeaderBuilder::new()
                    .with(Accept::Json)
                    .with(AcceptEncoding::Gzip)
                    .with(Connection::KeepAlive)
                    .with(ContentType::JsonUtf8)
                    .build();

                RequestDescriptor::new(Method::Post, base_url, REGISTER_PATH)
                    .with_headers(headers)
                    .with_params(request.to_params())
            }
        }
    }
}
