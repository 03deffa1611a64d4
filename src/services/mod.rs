//! Endpoint services: one typed method per server operation.

mod register;


pub use register::{RegisterService, RegistrationResult};
