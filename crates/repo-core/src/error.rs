//! Failure taxonomy raised by request-handling code.
//!
//! Every unrecovered failure travels up to the request boundary unchanged and
//! is turned into an HTTP response there. Dispatch is always on
//! [`Failure::kind`], never on message text.

use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::domain::{AsynchronousJobStatus, TableStatus};

/// Boxed error used as the cause of wrapper failures.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Failures surfaced while handling a request.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Failure {
    // Accepted but not ready
    #[error("Table {} is not available yet", .0.table_id)]
    TableUnavailable(TableStatus),

    #[error("Job {} has not finished yet", .0.job_id)]
    NotReady(AsynchronousJobStatus),

    // Client input
    #[error("{0}")]
    MissingRequiredParam(String),

    #[error("{0}")]
    MalformedBody(String),

    #[error("{0}")]
    EmptyBody(String),

    #[error("{0}")]
    UnparseableQuery(String),

    #[error("{0}")]
    TypeMismatch(String),

    #[error("{0}")]
    UnknownField(String),

    #[error("{0}")]
    InvalidModel(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    InvalidPassword(String),

    #[error("{0}")]
    MethodNotAllowed(String),

    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error("{0}")]
    NotAcceptable(String),

    // Lookup
    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    AclInheritance {
        benefactor_id: String,
        message: String,
    },

    #[error("{0}")]
    EntityInTrashCan(String),

    #[error("{0}")]
    ParentInTrashCan(String),

    #[error("{method} {url} has no matching route")]
    RouteNotFound { method: String, url: String },

    // Identity and permissions
    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    TermsOfUseNotAccepted(String),

    #[error("{0}")]
    PasswordResetViaEmailRequired(String),

    #[error("{0}")]
    CertificationRequired(String),

    #[error("{0}")]
    InvalidTableQueryFacetColumn(String),

    // Conflicts and limits
    #[error("{0}")]
    NameConflict(String),

    #[error("{0}")]
    ConflictingUpdate(String),

    #[error("{0}")]
    Locked(String),

    #[error("{0}")]
    LoginLockout(String),

    #[error("{0}")]
    Deprecated(String),

    #[error("{0}")]
    TooManyRequests(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    AsyncJobFailed(String),

    // Availability
    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("{message}")]
    TemporarilyUnavailable {
        message: String,
        #[source]
        cause: Option<BoxError>,
    },

    #[error("{0}")]
    TransientDataAccess(String),

    #[error("{message}")]
    UpstreamGateway {
        message: String,
        #[source]
        cause: Option<BoxError>,
    },

    #[error("{message}")]
    UnexpectedRollback {
        message: String,
        #[source]
        cause: Option<BoxError>,
    },

    // Server faults
    #[error("{0}")]
    Datastore(String),

    #[error("{0}")]
    Servlet(String),

    #[error("{0}")]
    IllegalState(String),

    #[error("{message}")]
    NullReference { message: String, stack_trace: String },

    #[error("{source}")]
    Unclassified {
        type_name: &'static str,
        #[source]
        source: BoxError,
    },
}

impl Failure {
    /// Wrap an error this taxonomy has no specific kind for.
    pub fn unclassified<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Unclassified {
            type_name: std::any::type_name::<E>(),
            source: Box::new(err),
        }
    }

    /// A null reference fault, capturing the current backtrace as its trace.
    pub fn null_reference(message: impl Into<String>) -> Self {
        let message = message.into();
        let stack_trace = format!(
            "{}: {}\n{}",
            FailureKind::NullReference.name(),
            message,
            Backtrace::force_capture()
        );
        Self::NullReference {
            message,
            stack_trace,
        }
    }

    pub fn acl_inheritance(benefactor_id: impl Into<String>) -> Self {
        let benefactor_id = benefactor_id.into();
        Self::AclInheritance {
            message: format!("Access control list is inherited from {benefactor_id}"),
            benefactor_id,
        }
    }

    pub fn route_not_found(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self::RouteNotFound {
            method: method.into(),
            url: url.into(),
        }
    }

    pub fn temporarily_unavailable<E>(message: impl Into<String>, cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::TemporarilyUnavailable {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    pub fn upstream_gateway<E>(message: impl Into<String>, cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::UpstreamGateway {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    pub fn unexpected_rollback<E>(message: impl Into<String>, cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::UnexpectedRollback {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    /// The declared kind of this failure.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::TableUnavailable(_) => FailureKind::TableUnavailable,
            Self::NotReady(_) => FailureKind::NotReady,
            Self::MissingRequiredParam(_) => FailureKind::MissingRequiredParam,
            Self::MalformedBody(_) => FailureKind::MalformedBody,
            Self::EmptyBody(_) => FailureKind::EmptyBody,
            Self::UnparseableQuery(_) => FailureKind::UnparseableQuery,
            Self::TypeMismatch(_) => FailureKind::TypeMismatch,
            Self::UnknownField(_) => FailureKind::UnknownField,
            Self::InvalidModel(_) => FailureKind::InvalidModel,
            Self::InvalidArgument(_) => FailureKind::InvalidArgument,
            Self::InvalidPassword(_) => FailureKind::InvalidPassword,
            Self::MethodNotAllowed(_) => FailureKind::MethodNotAllowed,
            Self::UnsupportedMediaType(_) => FailureKind::UnsupportedMediaType,
            Self::NotAcceptable(_) => FailureKind::NotAcceptable,
            Self::NotFound(_) => FailureKind::NotFound,
            Self::AclInheritance { .. } => FailureKind::AclInheritance,
            Self::EntityInTrashCan(_) => FailureKind::EntityInTrashCan,
            Self::ParentInTrashCan(_) => FailureKind::ParentInTrashCan,
            Self::RouteNotFound { .. } => FailureKind::RouteNotFound,
            Self::Unauthenticated(_) => FailureKind::Unauthenticated,
            Self::Unauthorized(_) => FailureKind::Unauthorized,
            Self::TermsOfUseNotAccepted(_) => FailureKind::TermsOfUseNotAccepted,
            Self::PasswordResetViaEmailRequired(_) => FailureKind::PasswordResetViaEmailRequired,
            Self::CertificationRequired(_) => FailureKind::CertificationRequired,
            Self::InvalidTableQueryFacetColumn(_) => FailureKind::InvalidTableQueryFacetColumn,
            Self::NameConflict(_) => FailureKind::NameConflict,
            Self::ConflictingUpdate(_) => FailureKind::ConflictingUpdate,
            Self::Locked(_) => FailureKind::Locked,
            Self::LoginLockout(_) => FailureKind::LoginLockout,
            Self::Deprecated(_) => FailureKind::Deprecated,
            Self::TooManyRequests(_) => FailureKind::TooManyRequests,
            Self::PayloadTooLarge(_) => FailureKind::PayloadTooLarge,
            Self::AsyncJobFailed(_) => FailureKind::AsyncJobFailed,
            Self::ServiceUnavailable(_) => FailureKind::ServiceUnavailable,
            Self::TemporarilyUnavailable { .. } => FailureKind::TemporarilyUnavailable,
            Self::TransientDataAccess(_) => FailureKind::TransientDataAccess,
            Self::UpstreamGateway { .. } => FailureKind::UpstreamGateway,
            Self::UnexpectedRollback { .. } => FailureKind::UnexpectedRollback,
            Self::Datastore(_) => FailureKind::Datastore,
            Self::Servlet(_) => FailureKind::Servlet,
            Self::IllegalState(_) => FailureKind::IllegalState,
            Self::NullReference { .. } => FailureKind::NullReference,
            Self::Unclassified { .. } => FailureKind::Unclassified,
        }
    }

    /// The wrapped cause of a wrapper failure, one level deep.
    ///
    /// Only `TemporarilyUnavailable`, `UpstreamGateway` and
    /// `UnexpectedRollback` wrap a cause; every other kind returns `None`.
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            Self::TemporarilyUnavailable { cause, .. }
            | Self::UpstreamGateway { cause, .. }
            | Self::UnexpectedRollback { cause, .. } => cause.as_deref(),
            _ => None,
        }
    }

    /// Stack trace text, when the failure carries one.
    pub fn stack_trace(&self) -> Option<&str> {
        match self {
            Self::NullReference { stack_trace, .. } => Some(stack_trace.as_str()),
            _ => None,
        }
    }

    /// Name to report when the failure has no message of its own.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Unclassified { type_name, .. } => *type_name,
            other => other.kind().name(),
        }
    }
}

/// Declared kind of a [`Failure`], one per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    TableUnavailable,
    NotReady,
    MissingRequiredParam,
    MalformedBody,
    EmptyBody,
    UnparseableQuery,
    TypeMismatch,
    UnknownField,
    InvalidModel,
    InvalidArgument,
    InvalidPassword,
    MethodNotAllowed,
    UnsupportedMediaType,
    NotAcceptable,
    NotFound,
    AclInheritance,
    EntityInTrashCan,
    ParentInTrashCan,
    RouteNotFound,
    Unauthenticated,
    Unauthorized,
    TermsOfUseNotAccepted,
    PasswordResetViaEmailRequired,
    CertificationRequired,
    InvalidTableQueryFacetColumn,
    NameConflict,
    ConflictingUpdate,
    Locked,
    LoginLockout,
    Deprecated,
    TooManyRequests,
    PayloadTooLarge,
    AsyncJobFailed,
    ServiceUnavailable,
    TemporarilyUnavailable,
    TransientDataAccess,
    UpstreamGateway,
    UnexpectedRollback,
    Datastore,
    Servlet,
    IllegalState,
    NullReference,
    Unclassified,
}

impl FailureKind {
    pub const ALL: [FailureKind; 43] = [
        Self::TableUnavailable,
        Self::NotReady,
        Self::MissingRequiredParam,
        Self::MalformedBody,
        Self::EmptyBody,
        Self::UnparseableQuery,
        Self::TypeMismatch,
        Self::UnknownField,
        Self::InvalidModel,
        Self::InvalidArgument,
        Self::InvalidPassword,
        Self::MethodNotAllowed,
        Self::UnsupportedMediaType,
        Self::NotAcceptable,
        Self::NotFound,
        Self::AclInheritance,
        Self::EntityInTrashCan,
        Self::ParentInTrashCan,
        Self::RouteNotFound,
        Self::Unauthenticated,
        Self::Unauthorized,
        Self::TermsOfUseNotAccepted,
        Self::PasswordResetViaEmailRequired,
        Self::CertificationRequired,
        Self::InvalidTableQueryFacetColumn,
        Self::NameConflict,
        Self::ConflictingUpdate,
        Self::Locked,
        Self::LoginLockout,
        Self::Deprecated,
        Self::TooManyRequests,
        Self::PayloadTooLarge,
        Self::AsyncJobFailed,
        Self::ServiceUnavailable,
        Self::TemporarilyUnavailable,
        Self::TransientDataAccess,
        Self::UpstreamGateway,
        Self::UnexpectedRollback,
        Self::Datastore,
        Self::Servlet,
        Self::IllegalState,
        Self::NullReference,
        Self::Unclassified,
    ];

    /// Stable kebab-case name of the kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::TableUnavailable => "table-unavailable",
            Self::NotReady => "not-ready",
            Self::MissingRequiredParam => "missing-required-param",
            Self::MalformedBody => "malformed-body",
            Self::EmptyBody => "empty-body",
            Self::UnparseableQuery => "unparseable-query",
            Self::TypeMismatch => "type-mismatch",
            Self::UnknownField => "unknown-field",
            Self::InvalidModel => "invalid-model",
            Self::InvalidArgument => "invalid-argument",
            Self::InvalidPassword => "invalid-password",
            Self::MethodNotAllowed => "method-not-allowed",
            Self::UnsupportedMediaType => "unsupported-media-type",
            Self::NotAcceptable => "not-acceptable",
            Self::NotFound => "not-found",
            Self::AclInheritance => "acl-inheritance",
            Self::EntityInTrashCan => "entity-in-trash-can",
            Self::ParentInTrashCan => "parent-in-trash-can",
            Self::RouteNotFound => "route-not-found",
            Self::Unauthenticated => "unauthenticated",
            Self::Unauthorized => "unauthorized",
            Self::TermsOfUseNotAccepted => "terms-of-use-not-accepted",
            Self::PasswordResetViaEmailRequired => "password-reset-via-email-required",
            Self::CertificationRequired => "certification-required",
            Self::InvalidTableQueryFacetColumn => "invalid-table-query-facet-column",
            Self::NameConflict => "name-conflict",
            Self::ConflictingUpdate => "conflicting-update",
            Self::Locked => "locked",
            Self::LoginLockout => "login-lockout",
            Self::Deprecated => "deprecated",
            Self::TooManyRequests => "too-many-requests",
            Self::PayloadTooLarge => "payload-too-large",
            Self::AsyncJobFailed => "async-job-failed",
            Self::ServiceUnavailable => "service-unavailable",
            Self::TemporarilyUnavailable => "temporarily-unavailable",
            Self::TransientDataAccess => "transient-data-access",
            Self::UpstreamGateway => "upstream-gateway",
            Self::UnexpectedRollback => "unexpected-rollback",
            Self::Datastore => "datastore",
            Self::Servlet => "servlet",
            Self::IllegalState => "illegal-state",
            Self::NullReference => "null-reference",
            Self::Unclassified => "unclassified",
        }
    }

    /// Whether the kind reports a result that is still being produced
    /// rather than an error.
    pub fn is_pending(self) -> bool {
        matches!(self, Self::TableUnavailable | Self::NotReady)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io;

    #[test]
    fn test_kind_names_are_unique() {
        let names: HashSet<_> = FailureKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names.len(), FailureKind::ALL.len());
    }

    #[test]
    fn test_only_two_kinds_are_pending() {
        let pending: Vec<_> = FailureKind::ALL
            .iter()
            .filter(|k| k.is_pending())
            .collect();
        assert_eq!(
            pending,
            vec![&FailureKind::TableUnavailable, &FailureKind::NotReady]
        );
    }

    #[test]
    fn test_cause_unwraps_one_level() {
        let inner = Failure::NotFound("row 9 missing".to_string());
        let failure = Failure::unexpected_rollback("transaction rolled back", inner);

        assert_eq!(failure.to_string(), "transaction rolled back");
        assert_eq!(failure.cause().unwrap().to_string(), "row 9 missing");
        assert_eq!(failure.source().unwrap().to_string(), "row 9 missing");
    }

    #[test]
    fn test_cause_is_none_for_plain_kinds() {
        assert!(Failure::Datastore("db down".into()).cause().is_none());
        let bare = Failure::TemporarilyUnavailable {
            message: "try later".into(),
            cause: None,
        };
        assert!(bare.cause().is_none());
    }

    #[test]
    fn test_unclassified_remembers_type_name() {
        let failure = Failure::unclassified(io::Error::other("disk on fire"));

        assert_eq!(failure.kind(), FailureKind::Unclassified);
        assert_eq!(failure.to_string(), "disk on fire");
        assert!(failure.type_name().contains("io::error::Error"));
    }

    #[test]
    fn test_null_reference_captures_trace() {
        let failure = Failure::null_reference("value was None");
        let trace = failure.stack_trace().unwrap();

        assert!(trace.starts_with("null-reference: value was None\n"));
        assert_eq!(failure.to_string(), "value was None");
    }

    #[test]
    fn test_acl_inheritance_keeps_benefactor() {
        match Failure::acl_inheritance("syn42") {
            Failure::AclInheritance { benefactor_id, .. } => assert_eq!(benefactor_id, "syn42"),
            other => panic!("unexpected failure: {other:?}"),
        }
    }

    #[test]
    fn test_type_name_defaults_to_kind_name() {
        assert_eq!(Failure::Locked(String::new()).type_name(), "locked");
    }
}
