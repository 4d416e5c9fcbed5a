//! HTTP middleware for the relay

pub mod cors;
pub mod request_id;

pub use cors::{cors_middleware, preflight};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
