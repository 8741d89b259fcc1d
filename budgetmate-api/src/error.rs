/// Error handling for the API server
///
/// Handlers return [`ApiResult`]. Every error becomes a JSON body of the
/// form:
///
/// ```json
/// { "error": "not_found", "message": "Transaction not found" }
/// ```
///
/// Validation failures add a `details` array with one entry per field.
/// Internal errors are logged and reported to the client without detail.
///
/// # Example
///
/// ```
/// use budgetmate_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler(found: bool) -> ApiResult<Json<Value>> {
///     if !found {
///         return Err(ApiError::NotFound("Goal not found".to_string()));
///     }
///     Ok(Json(json!({ "ok": true })))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use budgetmate_shared::auth::password::PasswordError;
use budgetmate_shared::fanout::FanOutError;
use budgetmate_shared::voting::VoteError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    /// 400
    BadRequest(String),

    /// 401
    Unauthorized(String),

    /// 404; also used for rows of another family
    NotFound(String),

    /// 409, e.g. duplicate email or subscription name
    Conflict(String),

    /// 422
    ValidationError(Vec<ValidationErrorDetail>),

    /// 500
    InternalError(String),

    /// 503
    ServiceUnavailable(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    pub field: String,
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable code, e.g. `bad_request`
    pub error: String,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Single-field validation failure
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail::new(field, message)])
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => {
                let message = errors
                    .first()
                    .map(|e| e.message.clone())
                    .unwrap_or_else(|| "Request validation failed".to_string());
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "validation_error",
                    message,
                    Some(errors),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => match db_err.constraint() {
                Some("users_email_key") => {
                    ApiError::Conflict("Email already registered".to_string())
                }
                Some("subscriptions_family_name_key") => {
                    ApiError::Conflict("Subscription already exists".to_string())
                }
                Some(constraint) if db_err.is_unique_violation() => {
                    ApiError::Conflict(format!("Constraint violation: {}", constraint))
                }
                Some(_) if db_err.is_check_violation() => {
                    ApiError::BadRequest("Value out of range".to_string())
                }
                _ => ApiError::InternalError(format!("Database error: {}", db_err)),
            },
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<FanOutError<sqlx::Error>> for ApiError {
    fn from(err: FanOutError<sqlx::Error>) -> Self {
        match err {
            FanOutError::Task(e) => e.into(),
            FanOutError::Join(msg) => ApiError::InternalError(format!("Aggregation failed: {}", msg)),
        }
    }
}

impl From<VoteError> for ApiError {
    fn from(err: VoteError) -> Self {
        match err {
            VoteError::Validation(msg) => ApiError::BadRequest(msg),
            VoteError::NotFound => ApiError::NotFound("Purchase request not found".to_string()),
            VoteError::Closed(_) => ApiError::Conflict(err.to_string()),
            VoteError::Database(e) => e.into(),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut errors: Vec<ValidationErrorDetail> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(errors)
    }
}
