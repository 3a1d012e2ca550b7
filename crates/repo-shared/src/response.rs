//! Standardized error body returned by every endpoint.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Machine-readable error codes clients can act on programmatically.
///
/// New codes may be added at any time. Clients deserialize codes they do not
/// know as [`ErrorResponseCode::Unrecognized`], which keeps the original text
/// so the body serializes back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorResponseCode {
    PasswordResetViaEmailRequired,
    UserCertificationRequired,
    InvalidTableQueryFacetColumnRequest,
    /// A code introduced after this build. Never produced by the server.
    Unrecognized(String),
}

impl ErrorResponseCode {
    /// Wire name of the code.
    pub fn as_str(&self) -> &str {
        match self {
            Self::PasswordResetViaEmailRequired => "PASSWORD_RESET_VIA_EMAIL_REQUIRED",
            Self::UserCertificationRequired => "USER_CERTIFICATION_REQUIRED",
            Self::InvalidTableQueryFacetColumnRequest => "INVALID_TABLE_QUERY_FACET_COLUMN_REQUEST",
            Self::Unrecognized(code) => code,
        }
    }
}

impl From<String> for ErrorResponseCode {
    fn from(code: String) -> Self {
        match code.as_str() {
            "PASSWORD_RESET_VIA_EMAIL_REQUIRED" => Self::PasswordResetViaEmailRequired,
            "USER_CERTIFICATION_REQUIRED" => Self::UserCertificationRequired,
            "INVALID_TABLE_QUERY_FACET_COLUMN_REQUEST" => Self::InvalidTableQueryFacetColumnRequest,
            _ => Self::Unrecognized(code),
        }
    }
}

impl fmt::Display for ErrorResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorResponseCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorResponseCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// JSON error body: `{ "reason": ..., "errorCode": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Human-readable explanation, suitable for direct display.
    pub reason: String,

    /// Optional machine-readable code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorResponseCode>,
}

impl ErrorResponse {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            error_code: None,
        }
    }

    pub fn with_error_code(mut self, code: ErrorResponseCode) -> Self {
        self.error_code = Some(code);
        self
    }
}
