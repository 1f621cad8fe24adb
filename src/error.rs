//!
//! # Error classification
//!
//! This module is the single point where failures become wire-level
//! responses. Services and stores raise [`ApiError`]; route handlers and
//! the auth middleware attach the request context ([`RequestError`]),
//! which renders the JSON payload and writes the classification log line.
//!
//! `From` implementations classify collaborator failures (`sqlx::Error`,
//! `validator::ValidationErrors`, `jsonwebtoken::errors::Error`) so the
//! `?` operator can be used throughout.

use actix_web::{error::ResponseError, http::StatusCode, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Machine-readable code attached to request-body validation failures.
pub const VALIDATION_ERROR_CODE: &str = "VALIDATION_FAILED";

const CONSTRAINT_MESSAGE: &str = "Bad request: one of the fields violates database constraints.";

const STATUS_MAPPING_MESSAGE: &str = "Internal server error: task status mapping is misconfigured. \
     The server tried to save a status value as text instead of the database enum.";

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All failure classifications the service can produce.
///
/// Client-facing messages never carry raw database text; variants that
/// classify a database failure keep the raw detail for the log line only.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// A requested resource does not exist (HTTP 404).
    NotFound(String),
    /// A malformed or invalid request (HTTP 400).
    BadRequest(String),
    /// The request conflicts with existing state (HTTP 409).
    Conflict(String),
    /// Authentication is missing or invalid (HTTP 401).
    Unauthorized(String),
    /// Authenticated but lacking the required role (HTTP 403).
    Forbidden(String),
    /// Request-body validation failed (HTTP 400); carries the ordered
    /// field-error list.
    Validation(Vec<FieldError>),
    /// A unique/foreign-key/check/not-null violation at the database
    /// (HTTP 400). The payload is the raw database message, logged but
    /// never sent to the client.
    DataIntegrity(String),
    /// A persistence-layer misconfiguration such as the `task_status`
    /// enum/text binding mismatch (HTTP 500). Holds the client-safe
    /// message and the raw database detail for the logs.
    Misconfiguration(String, String),
    /// An internal failure with a known cause (HTTP 500). The message is
    /// logged; the client receives a generic body.
    Internal(String),
    /// Anything unclassified (HTTP 500). Holds the failure's type name,
    /// surfaced in the 500 payload for operator diagnosis, and the raw
    /// message for the logs.
    Unhandled(String, String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Validation(_) | ApiError::DataIntegrity(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Misconfiguration(_, _)
            | ApiError::Internal(_)
            | ApiError::Unhandled(_, _) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message sent to the client. Database details and internal
    /// messages are replaced by neutral text here.
    pub fn client_message(&self) -> String {
        match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg) => msg.clone(),
            ApiError::Validation(_) => "Validation failed".to_string(),
            ApiError::DataIntegrity(_) => CONSTRAINT_MESSAGE.to_string(),
            ApiError::Misconfiguration(msg, _) => msg.clone(),
            ApiError::Internal(_) | ApiError::Unhandled(_, _) => {
                "Internal server error.".to_string()
            }
        }
    }

    /// The message for the classification log line, including raw detail
    /// that must not reach the client.
    fn log_message(&self) -> String {
        match self {
            ApiError::DataIntegrity(detail) => format!("{} ({})", CONSTRAINT_MESSAGE, detail),
            ApiError::Misconfiguration(msg, detail) => format!("{} ({})", msg, detail),
            ApiError::Internal(msg) => msg.clone(),
            ApiError::Unhandled(exception, msg) => format!("{} ({})", msg, exception),
            other => other.client_message(),
        }
    }

    /// Attach the request context, producing a classified error that can
    /// be returned from a handler.
    pub fn at(self, req: &HttpRequest, controller: &'static str, handler: &'static str) -> RequestError {
        RequestError::new(
            self,
            controller,
            handler,
            req.method().as_str().to_string(),
            req.path().to_string(),
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.log_message())
    }
}

/// Classifies `sqlx` failures.
///
/// `RowNotFound` maps to `NotFound`; constraint violations and the
/// Postgres enum binding mismatch get their dedicated classifications;
/// everything else is `Unhandled` with the failure kind preserved.
impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> ApiError {
        match error {
            sqlx::Error::RowNotFound => ApiError::NotFound("Record not found".into()),
            sqlx::Error::Database(db) => {
                use sqlx::error::ErrorKind;
                let detail = db.message().to_string();
                // SQLSTATE 42804: datatype mismatch, seen when the
                // task_status column receives a text-bound value.
                if db.code().as_deref() == Some("42804")
                    || detail.contains("but expression is of type")
                {
                    return ApiError::Misconfiguration(STATUS_MAPPING_MESSAGE.into(), detail);
                }
                match db.kind() {
                    ErrorKind::UniqueViolation
                    | ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation => ApiError::DataIntegrity(detail),
                    _ => ApiError::Unhandled("DatabaseError".into(), detail),
                }
            }
            other => ApiError::Unhandled(sqlx_error_name(&other).into(), other.to_string()),
        }
    }
}

fn sqlx_error_name(error: &sqlx::Error) -> &'static str {
    match error {
        sqlx::Error::Io(_) => "Io",
        sqlx::Error::PoolTimedOut => "PoolTimedOut",
        sqlx::Error::PoolClosed => "PoolClosed",
        sqlx::Error::ColumnDecode { .. } => "ColumnDecode",
        sqlx::Error::Decode(_) => "Decode",
        sqlx::Error::Configuration(_) => "Configuration",
        _ => "DatabaseError",
    }
}

/// Converts `validator::ValidationErrors` into an ordered field-error
/// list. Field order is deterministic (field name, then message).
impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> ApiError {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldError {
                    field: (*field).to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid value for {}", field)),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));
        ApiError::Validation(fields)
    }
}

/// JWT processing failures (bad signature, expiry, malformed token).
impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(error: jsonwebtoken::errors::Error) -> ApiError {
        ApiError::Unauthorized(format!("Invalid token: {}", error))
    }
}

/// An [`ApiError`] with the originating request attached: handler
/// identity, HTTP method and path. This is the type handlers return;
/// its `ResponseError` impl renders the payload and emits exactly one
/// log line per classification (warn for 4xx, error for 5xx).
#[derive(Debug)]
pub struct RequestError {
    error: ApiError,
    controller: &'static str,
    handler: &'static str,
    method: String,
    path: String,
}

impl RequestError {
    pub fn new(
        error: ApiError,
        controller: &'static str,
        handler: &'static str,
        method: String,
        path: String,
    ) -> Self {
        Self {
            error,
            controller,
            handler,
            method,
            path,
        }
    }

    pub fn error(&self) -> &ApiError {
        &self.error
    }

    fn log(&self) {
        let status = self.error.status().as_u16();
        if let ApiError::Validation(fields) = &self.error {
            log::warn!(
                "Validation failed at {}.{} path={} errors={:?}",
                self.controller,
                self.handler,
                self.path,
                fields
            );
            return;
        }
        let line = format!(
            "[{}] {} {} @ {}.{} -> {}",
            status,
            self.method,
            self.path,
            self.controller,
            self.handler,
            self.error.log_message()
        );
        if status >= 500 {
            log::error!("{}", line);
        } else {
            log::warn!("{}", line);
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} @ {}.{}: {}",
            self.method, self.path, self.controller, self.handler, self.error
        )
    }
}

impl ResponseError for RequestError {
    fn status_code(&self) -> StatusCode {
        self.error.status()
    }

    fn error_response(&self) -> HttpResponse {
        self.log();
        let status = self.error.status();
        let body = match &self.error {
            ApiError::Validation(fields) => json!({
                "status": status.as_u16(),
                "error": "Bad Request",
                "message": "Validation failed",
                "path": self.path,
                "timestamp": Utc::now().to_rfc3339(),
                "errorCode": VALIDATION_ERROR_CODE,
                "errors": fields,
            }),
            ApiError::Unhandled(exception, _) => json!({
                "controller": self.controller,
                "controllerMethod": self.handler,
                "method": self.method,
                "path": self.path,
                "message": self.error.client_message(),
                "status": status.as_u16(),
                "timestamp": Utc::now().to_rfc3339(),
                "exception": exception,
            }),
            _ => json!({
                "controller": self.controller,
                "controllerMethod": self.handler,
                "method": self.method,
                "path": self.path,
                "message": self.error.client_message(),
                "status": status.as_u16(),
                "timestamp": Utc::now().to_rfc3339(),
            }),
        };
        HttpResponse::build(status).json(body)
    }
}

/// Maps request-body deserialization failures to 400, with a dedicated
/// message for invalid task-status literals.
pub fn json_error_handler(
    err: actix_web::error::JsonPayloadError,
    req: &HttpRequest,
) -> actix_web::Error {
    use actix_web::error::JsonPayloadError;
    let message = match &err {
        JsonPayloadError::Deserialize(e) => {
            let detail = e.to_string();
            if detail.contains("unknown variant") && detail.contains("expected one of `TODO`") {
                "Invalid task status. Accepted values: TODO, IN_PROGRESS, DONE.".to_string()
            } else {
                "Invalid request payload.".to_string()
            }
        }
        _ => "Invalid request payload.".to_string(),
    };
    ApiError::BadRequest(message)
        .at(req, "request", "body")
        .into()
}

/// Maps path-parameter type mismatches to 400.
pub fn path_error_handler(
    err: actix_web::error::PathError,
    req: &HttpRequest,
) -> actix_web::Error {
    ApiError::BadRequest(format!("Invalid path parameter: {}", err))
        .at(req, "request", "path")
        .into()
}

/// Maps query-parameter type mismatches to 400.
pub fn query_error_handler(
    err: actix_web::error::QueryPayloadError,
    req: &HttpRequest,
) -> actix_web::Error {
    ApiError::BadRequest(format!("Invalid query parameters: {}", err))
        .at(req, "request", "query")
        .into()
}
