//! Extractor configuration - binding errors become failures.
//!
//! actix reports malformed bodies, bad query strings and unparsable path
//! segments with its own error types. These handlers convert them so they
//! reach the client through the same translator as every other failure.

use actix_web::{
    HttpRequest,
    error::{JsonPayloadError, PathError, QueryPayloadError, UrlencodedError},
    web,
};
use repo_core::Failure;

use crate::middleware::error::ApiError;

/// JSON body extractor limited to `limit` bytes.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req: &HttpRequest| ApiError::from(json_failure(err)).into())
}

/// URL-encoded form extractor limited to `limit` bytes.
pub fn form_config(limit: usize) -> web::FormConfig {
    web::FormConfig::default()
        .limit(limit)
        .error_handler(|err, _req: &HttpRequest| ApiError::from(form_failure(err)).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req: &HttpRequest| ApiError::from(query_failure(err)).into())
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req: &HttpRequest| ApiError::from(path_failure(err)).into())
}

pub fn json_failure(err: JsonPayloadError) -> Failure {
    match err {
        JsonPayloadError::ContentType => {
            Failure::UnsupportedMediaType("Content-Type must be application/json".to_string())
        }
        JsonPayloadError::OverflowKnownLength { length, limit } => Failure::PayloadTooLarge(
            format!("Request body of {length} bytes exceeds the limit of {limit} bytes"),
        ),
        JsonPayloadError::Overflow { limit } => {
            Failure::PayloadTooLarge(format!("Request body exceeds the limit of {limit} bytes"))
        }
        JsonPayloadError::Deserialize(e) if e.is_eof() && e.line() == 1 && e.column() == 0 => {
            Failure::EmptyBody("Request body is required".to_string())
        }
        JsonPayloadError::Deserialize(e) => Failure::MalformedBody(e.to_string()),
        other => Failure::MalformedBody(other.to_string()),
    }
}

pub fn form_failure(err: UrlencodedError) -> Failure {
    match err {
        UrlencodedError::ContentType => Failure::UnsupportedMediaType(
            "Content-Type must be application/x-www-form-urlencoded".to_string(),
        ),
        UrlencodedError::Overflow { size, limit } => Failure::PayloadTooLarge(format!(
            "Request body of {size} bytes exceeds the limit of {limit} bytes"
        )),
        other => Failure::MalformedBody(other.to_string()),
    }
}

pub fn query_failure(err: QueryPayloadError) -> Failure {
    Failure::TypeMismatch(format!("Invalid query string: {err}"))
}

pub fn path_failure(err: PathError) -> Failure {
    Failure::TypeMismatch(format!("Invalid path parameter: {err}"))
}
