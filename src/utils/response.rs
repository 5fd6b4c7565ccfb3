use rocket::Request;
use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder, Response};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::Map;
use rocket_okapi::okapi::openapi3::{MediaType, RefOr, Response as OpenApiResponse, Responses};
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::response::OpenApiResponderInner;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::io::Cursor;

use crate::services::ServiceError;

/// -----------------------------
/// Generic API response
/// -----------------------------
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            message: None,
            code: None,
            data: Some(data),
        }
    }

    pub fn success_with_message(message: impl Into<String>, data: T) -> Self {
        ApiResponse {
            success: true,
            message: Some(message.into()),
            code: None,
            data: Some(data),
        }
    }

    pub fn error(code: &str, message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            message: Some(message),
            code: Some(code.to_string()),
            data: None,
        }
    }
}

/// -----------------------------
/// API Error
/// -----------------------------
#[derive(Debug, Serialize, JsonSchema)]
pub struct ApiError {
    #[schemars(skip)]
    #[serde(skip_serializing)]
    pub status: Status,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    fn new(status: Status, code: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(Status::BadRequest, "invalid-argument", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(Status::Unauthorized, "unauthenticated", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(Status::Forbidden, "permission-denied", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Status::NotFound, "not-found", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(Status::Conflict, "already-exists", message)
    }

    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::new(Status::PreconditionFailed, "failed-precondition", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(Status::InternalServerError, "internal", message)
    }

    /// Callable-protocol status name, e.g. `PERMISSION_DENIED`.
    pub fn status_name(&self) -> String {
        self.code.replace('-', "_").to_uppercase()
    }
}

/// Internal failures are logged with a correlation id; the client only sees
/// the id.
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unauthenticated(m) => ApiError::unauthorized(m),
            ServiceError::InvalidArgument(m) => ApiError::bad_request(m),
            ServiceError::PermissionDenied(m) => ApiError::forbidden(m),
            ServiceError::NotFound(m) => ApiError::not_found(m),
            ServiceError::AlreadyExists(m) => ApiError::conflict(m),
            ServiceError::FailedPrecondition(m) => ApiError::precondition_failed(m),
            ServiceError::Internal(e) => {
                let reference = uuid::Uuid::new_v4();
                log::error!(target: "internhub::internal", "[{}] {}", reference, e);
                ApiError::internal_error(format!("Internal server error (reference: {})", reference))
            }
        }
    }
}

fn json_response(status: Status, body: String) -> response::Result<'static> {
    Response::build()
        .status(status)
        .header(ContentType::JSON)
        .sized_body(body.len(), Cursor::new(body))
        .ok()
}

/// -----------------------------
/// Rocket Responder
/// -----------------------------
impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let body = serde_json::to_string(&ApiResponse::<()>::error(self.code, self.message))
            .unwrap_or_else(|_| r#"{"success":false,"message":"Internal error"}"#.to_string());

        json_response(self.status, body)
    }
}

fn error_responses(schema: rocket_okapi::okapi::openapi3::SchemaObject) -> Responses {
    let mut content = Map::new();
    content.insert(
        "application/json".to_owned(),
        MediaType {
            schema: Some(schema),
            ..Default::default()
        },
    );

    let mut responses = Responses::default();
    for (code, description) in [
        ("400", "Invalid argument"),
        ("401", "Unauthenticated"),
        ("403", "Permission denied"),
        ("404", "Not found"),
        ("409", "Already exists"),
        ("412", "Failed precondition"),
        ("500", "Internal server error"),
    ] {
        responses.responses.insert(
            code.to_string(),
            RefOr::Object(OpenApiResponse {
                description: description.to_string(),
                content: content.clone(),
                ..Default::default()
            }),
        );
    }
    responses
}

/// -----------------------------
/// OpenAPI integration
/// -----------------------------
impl OpenApiResponderInner for ApiError {
    fn responses(generator: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let schema = generator.json_schema::<ApiResponse<()>>();
        Ok(error_responses(schema))
    }
}

/// -----------------------------
/// Callable envelope
/// -----------------------------
/// `{"result": ...}` on success, `{"error": {status, message, code}}` on
/// failure, with the HTTP status of the error code.
pub enum CallableResponse {
    Result(Value),
    Error(ApiError),
}

impl CallableResponse {
    pub fn ok<T: Serialize>(value: T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => CallableResponse::Result(value),
            Err(e) => {
                let reference = uuid::Uuid::new_v4();
                log::error!(target: "internhub::internal", "[{}] serialize result: {}", reference, e);
                CallableResponse::Error(ApiError::internal_error(format!(
                    "Internal server error (reference: {})",
                    reference
                )))
            }
        }
    }
}

impl From<ApiError> for CallableResponse {
    fn from(err: ApiError) -> Self {
        CallableResponse::Error(err)
    }
}

impl From<ServiceError> for CallableResponse {
    fn from(err: ServiceError) -> Self {
        CallableResponse::Error(err.into())
    }
}

impl<'r> Responder<'r, 'static> for CallableResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let (status, body) = match self {
            CallableResponse::Result(value) => (Status::Ok, json!({ "result": value })),
            CallableResponse::Error(err) => (
                err.status,
                json!({
                    "error": {
                        "status": err.status_name(),
                        "message": err.message,
                        "code": err.code,
                    }
                }),
            ),
        };
        json_response(status, body.to_string())
    }
}
