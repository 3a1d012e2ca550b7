//! Middleware modules.

pub mod error;
pub mod stack_status;
pub mod translation;
