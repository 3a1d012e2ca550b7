//! Observability module - request correlation for log records.

pub mod request_id;

pub use request_id::{RequestId, RequestIdMiddleware};
