//! # Repo Core
//!
//! The domain layer of the repository API.
//! This crate holds the failure taxonomy raised by request-handling code and
//! the status snapshots returned while a table or asynchronous job is still
//! being processed. It has no HTTP dependencies.

pub mod domain;
pub mod error;

pub use error::{BoxError, Failure, FailureKind};
