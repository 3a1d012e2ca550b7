//! Error translation - one status code and one JSON body per failure kind.
//!
//! Every failure that escapes a handler ends up in [`ErrorTranslator::translate`],
//! either through the [`ErrorTranslation`](super::translation::ErrorTranslation)
//! middleware or directly. The dispatch table here is what client SDKs rely on,
//! so a kind's status must never depend on where the failure was raised.

use std::error::Error as StdError;

use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, http::StatusCode};
use repo_core::domain::{AsynchronousJobStatus, TableStatus};
use repo_core::{Failure, FailureKind};
use repo_shared::{ErrorResponse, ErrorResponseCode};
use serde::Serialize;

use crate::config::DEFAULT_API_DOCS_URL;
use crate::observability::RequestId;

/// Reason returned for transient datastore contention. The underlying cause
/// is never shown to clients.
pub const TRY_AGAIN_LATER: &str = "Service temporarily unavailable, please try again later.";

/// Prefix of the reason returned for null reference faults.
pub const BUG_REPORT_PREFIX: &str =
    "Send a bug report to the platform team with this message: ";

/// Maximum number of stack trace characters echoed back to the client.
pub const MAX_STACK_TRACE_LENGTH: usize = 256;

/// Prefix of the reason returned when an entity's ACL is inherited.
pub const ACL_REDIRECT_PREFIX: &str =
    "Cannot access the ACL of an entity that inherits its permissions. The benefactor's ACL is at: ";

/// HTTP status for each failure kind.
pub fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::TableUnavailable | FailureKind::NotReady => StatusCode::ACCEPTED,

        FailureKind::MissingRequiredParam
        | FailureKind::MalformedBody
        | FailureKind::EmptyBody
        | FailureKind::UnparseableQuery
        | FailureKind::TypeMismatch
        | FailureKind::UnknownField
        | FailureKind::InvalidModel
        | FailureKind::InvalidArgument
        | FailureKind::InvalidPassword
        | FailureKind::InvalidTableQueryFacetColumn
        | FailureKind::AsyncJobFailed
        | FailureKind::UnexpectedRollback => StatusCode::BAD_REQUEST,

        FailureKind::Unauthenticated | FailureKind::PasswordResetViaEmailRequired => {
            StatusCode::UNAUTHORIZED
        }

        FailureKind::Unauthorized
        | FailureKind::TermsOfUseNotAccepted
        | FailureKind::CertificationRequired
        | FailureKind::ParentInTrashCan => StatusCode::FORBIDDEN,

        FailureKind::NotFound
        | FailureKind::AclInheritance
        | FailureKind::EntityInTrashCan
        | FailureKind::RouteNotFound => StatusCode::NOT_FOUND,

        FailureKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        FailureKind::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
        FailureKind::NameConflict => StatusCode::CONFLICT,
        FailureKind::Deprecated => StatusCode::GONE,
        FailureKind::ConflictingUpdate => StatusCode::PRECONDITION_FAILED,
        FailureKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        FailureKind::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        FailureKind::Locked | FailureKind::LoginLockout => StatusCode::LOCKED,
        FailureKind::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,

        FailureKind::Datastore
        | FailureKind::Servlet
        | FailureKind::IllegalState
        | FailureKind::NullReference
        | FailureKind::Unclassified => StatusCode::INTERNAL_SERVER_ERROR,

        FailureKind::UpstreamGateway => StatusCode::BAD_GATEWAY,

        FailureKind::ServiceUnavailable
        | FailureKind::TemporarilyUnavailable
        | FailureKind::TransientDataAccess => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Machine-readable code attached to the body, if any.
pub fn error_code_for(kind: FailureKind) -> Option<ErrorResponseCode> {
    match kind {
        FailureKind::PasswordResetViaEmailRequired => {
            Some(ErrorResponseCode::PasswordResetViaEmailRequired)
        }
        FailureKind::CertificationRequired => Some(ErrorResponseCode::UserCertificationRequired),
        FailureKind::InvalidTableQueryFacetColumn => {
            Some(ErrorResponseCode::InvalidTableQueryFacetColumnRequest)
        }
        _ => None,
    }
}

/// Server-side faults always have their full trace logged.
pub fn is_server_fault(kind: FailureKind) -> bool {
    status_for(kind).is_server_error()
}

/// How much of a failure goes into its log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogVerbosity {
    /// One line: method and URL.
    Summary,
    /// The failure, its whole cause chain and any stack trace.
    FullTrace,
}

/// Read-only facts about the inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub method: String,
    pub url: String,
    pub request_id: Option<String>,
}

impl RequestContext {
    #[cfg(test)]
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            request_id: None,
        }
    }

    /// The URL is scheme, host and path; the query string is left out.
    pub fn from_request(req: &HttpRequest) -> Self {
        let url = {
            let info = req.connection_info();
            format!("{}://{}{}", info.scheme(), info.host(), req.path())
        };

        Self {
            method: req.method().to_string(),
            url,
            request_id: req.extensions().get::<RequestId>().map(|id| id.0.clone()),
        }
    }
}

/// Progress snapshot returned with `202 Accepted`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PendingStatus {
    Table(TableStatus),
    Job(AsynchronousJobStatus),
}

/// Body of a translated response.
///
/// Pending results are kept apart from errors so callers can tell a job that
/// is still running from one that failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Error(ErrorResponse),
    Pending(PendingStatus),
}

#[cfg(test)]
impl ResponseBody {
    pub fn as_error(&self) -> Option<&ErrorResponse> {
        match self {
            Self::Error(body) => Some(body),
            Self::Pending(_) => None,
        }
    }
}

/// Outcome of translating one failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub status: StatusCode,
    pub body: ResponseBody,
    pub verbosity: LogVerbosity,
}

#[cfg(test)]
impl Translation {
    pub fn reason(&self) -> Option<&str> {
        self.body.as_error().map(|body| body.reason.as_str())
    }
}

impl Translation {
    pub fn into_response(self) -> HttpResponse {
        HttpResponse::build(self.status).json(self.body)
    }
}

/// Converts failures into HTTP responses.
///
/// Holds no mutable state; clones are shared freely between workers.
#[derive(Debug, Clone)]
pub struct ErrorTranslator {
    dev_stack: bool,
    api_docs_url: String,
}

impl Default for ErrorTranslator {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ErrorTranslator {
    pub fn new(dev_stack: bool) -> Self {
        Self {
            dev_stack,
            api_docs_url: DEFAULT_API_DOCS_URL.to_string(),
        }
    }

    pub fn with_api_docs_url(mut self, url: impl Into<String>) -> Self {
        self.api_docs_url = url.into();
        self
    }

    pub fn dev_stack(&self) -> bool {
        self.dev_stack
    }

    /// Full trace for server faults, and for everything on development stacks.
    pub fn verbosity(&self, kind: FailureKind) -> LogVerbosity {
        if kind.is_pending() {
            LogVerbosity::Summary
        } else if is_server_fault(kind) || self.dev_stack {
            LogVerbosity::FullTrace
        } else {
            LogVerbosity::Summary
        }
    }

    /// Translate a failure and emit exactly one log record for it.
    pub fn translate(&self, failure: &Failure, ctx: &RequestContext) -> Translation {
        self.translate_traced(failure, failure, ctx)
    }

    /// Translate any error. Errors that are neither a [`Failure`] nor an
    /// [`ApiError`] are treated as unclassified server faults.
    pub fn translate_error(&self, err: &(dyn StdError + 'static), ctx: &RequestContext) -> Translation {
        if let Some(failure) = err.downcast_ref::<Failure>() {
            return self.translate(failure, ctx);
        }
        if let Some(ApiError(failure)) = err.downcast_ref::<ApiError>() {
            return self.translate(failure, ctx);
        }

        let failure = Failure::Unclassified {
            type_name: FailureKind::Unclassified.name(),
            source: err.to_string().into(),
        };
        self.translate_traced(&failure, err, ctx)
    }

    /// Translate `failure`, logging the trace of `origin`.
    fn translate_traced(
        &self,
        failure: &Failure,
        origin: &(dyn StdError + 'static),
        ctx: &RequestContext,
    ) -> Translation {
        let (status, body) = self.dispatch(failure, ctx);
        let translation = Translation {
            status,
            body,
            verbosity: self.verbosity(failure.kind()),
        };
        self.log(failure, origin, ctx, &translation);
        translation
    }

    /// Status and body for a failure, without logging.
    pub fn dispatch(&self, failure: &Failure, ctx: &RequestContext) -> (StatusCode, ResponseBody) {
        let kind = failure.kind();
        let status = status_for(kind);

        let reason = match failure {
            Failure::TableUnavailable(status_snapshot) => {
                return (
                    status,
                    ResponseBody::Pending(PendingStatus::Table(status_snapshot.clone())),
                );
            }
            Failure::NotReady(job_status) => {
                return (
                    status,
                    ResponseBody::Pending(PendingStatus::Job(job_status.clone())),
                );
            }
            Failure::TransientDataAccess(_) => TRY_AGAIN_LATER.to_string(),
            Failure::AclInheritance { benefactor_id, .. } => format!(
                "{ACL_REDIRECT_PREFIX}{}",
                acl_redirect_url(&ctx.url, benefactor_id)
            ),
            Failure::RouteNotFound { method, url } => format!(
                "{method} {url} was not found. Please reference API documentation at {}",
                self.api_docs_url
            ),
            Failure::NullReference { stack_trace, .. } => bug_report_reason(stack_trace),
            other => match other.cause() {
                Some(cause) => reason_of(cause, other.type_name()),
                None => reason_of(other, other.type_name()),
            },
        };

        let mut body = ErrorResponse::new(reason);
        if let Some(code) = error_code_for(kind) {
            body = body.with_error_code(code);
        }
        (status, ResponseBody::Error(body))
    }

    fn log(
        &self,
        failure: &Failure,
        origin: &(dyn StdError + 'static),
        ctx: &RequestContext,
        translation: &Translation,
    ) {
        let kind = failure.kind();
        let request_id = ctx.request_id.as_deref().unwrap_or("-");
        let status = translation.status.as_u16();

        if kind.is_pending() {
            tracing::debug!(
                method = %ctx.method,
                url = %ctx.url,
                request_id,
                status,
                "Result not ready for {} {}",
                ctx.method,
                ctx.url
            );
            return;
        }

        match translation.verbosity {
            LogVerbosity::FullTrace => tracing::error!(
                method = %ctx.method,
                url = %ctx.url,
                request_id,
                status,
                kind = %kind,
                error_type = failure.type_name(),
                trace = %full_trace(origin, failure.stack_trace()),
                "Handling {} {}",
                ctx.method,
                ctx.url
            ),
            LogVerbosity::Summary => tracing::error!(
                method = %ctx.method,
                url = %ctx.url,
                request_id,
                status,
                "Handling {} {}",
                ctx.method,
                ctx.url
            ),
        }
    }
}

/// Error message, or `fallback` when the message is empty.
fn reason_of(err: &(dyn StdError + 'static), fallback: &str) -> String {
    let message = err.to_string();
    if message.is_empty() {
        match err.downcast_ref::<Failure>() {
            Some(failure) => failure.type_name().to_string(),
            None => fallback.to_string(),
        }
    } else {
        message
    }
}

fn bug_report_reason(stack_trace: &str) -> String {
    let excerpt: String = stack_trace.chars().take(MAX_STACK_TRACE_LENGTH).collect();
    format!("{BUG_REPORT_PREFIX}{excerpt}")
}

/// The error, every cause below it, and the stack trace if there is one.
pub fn full_trace(err: &(dyn StdError + 'static), stack_trace: Option<&str>) -> String {
    let mut trace = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        trace.push_str("\nCaused by: ");
        trace.push_str(&cause.to_string());
        source = cause.source();
    }
    if let Some(stack_trace) = stack_trace {
        trace.push('\n');
        trace.push_str(stack_trace);
    }
    trace
}

/// Location of the benefactor's ACL, relative to the URL that was requested.
///
/// `https://host/repo/v1/entity/syn2/acl` with benefactor `syn1` becomes
/// `https://host/repo/v1/entity/syn1/acl`. URLs without an `/entity` segment
/// fall back to the origin.
pub fn acl_redirect_url(request_url: &str, benefactor_id: &str) -> String {
    let base = match request_url.find("/entity/") {
        Some(idx) => &request_url[..idx],
        None => url_origin(request_url),
    };
    format!("{base}/entity/{benefactor_id}/acl")
}

fn url_origin(url: &str) -> &str {
    let authority_start = url.find("://").map(|i| i + 3).unwrap_or(0);
    match url[authority_start..].find('/') {
        Some(i) => &url[..authority_start + i],
        None => url,
    }
}

/// Failure returned from handlers. Converts with `?` from [`Failure`].
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub Failure);

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        status_for(self.0.kind())
    }

    fn error_response(&self) -> HttpResponse {
        // Rewritten with the real request context by `ErrorTranslation`.
        let (status, body) = ErrorTranslator::default().dispatch(&self.0, &RequestContext::default());
        HttpResponse::build(status).json(body)
    }
}

/// Error raised by the framework itself, outside any handler.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct FrameworkError(pub String);

impl From<&actix_web::Error> for FrameworkError {
    fn from(err: &actix_web::Error) -> Self {
        Self(err.to_string())
    }
}

/// Result type alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
