//! Service Layer
//!
//! `MatrixService` implements `MatrixApi` on top of the outbound ports.

pub mod inflight;
pub mod matrix_service;
pub mod request;

pub use inflight::InFlight;
pub use matrix_service::MatrixService;
pub use request::{Channel, RequestToken, RequestTracker};
