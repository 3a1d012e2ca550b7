//! # Repo Shared
//!
//! Wire types shared between the server and client SDKs.
//! Everything here is part of the public API contract and must stay
//! backwards compatible.

pub mod response;

pub use response::{ErrorResponse, ErrorResponseCode};
