use axum::{
    response::{IntoResponse, Response},
    Json,
};
use reqwest::StatusCode;
use serde_json::json;

#[derive(Debug)]
pub enum BaseError {
    ParamInvalid(Option<String>),
    MissingFields {
        message: String,
        required_fields: Vec<&'static str>,
        received_fields: Vec<String>,
    },
    NotFound(Option<String>),
    DatabaseFatal(Option<String>),
    ProviderFatal(Option<String>),
    StoreError(Option<String>),
}

impl From<crate::service::app_state::AppStoreError> for BaseError {
    fn from(err: crate::service::app_state::AppStoreError) -> Self {
        BaseError::StoreError(Some(err.to_string()))
    }
}

impl From<diesel::result::Error> for BaseError {
    fn from(err: diesel::result::Error) -> Self {
        BaseError::DatabaseFatal(Some(err.to_string()))
    }
}

impl IntoResponse for BaseError {
    fn into_response(self) -> Response {
        match self {
            BaseError::ParamInvalid(msg) => {
                let body = Json(json!({
                    "message": msg.unwrap_or("request params invalid".to_string()),
                }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            BaseError::MissingFields {
                message,
                required_fields,
                received_fields,
            } => {
                let body = Json(json!({
                    "message": message,
                    "requiredFields": required_fields,
                    "receivedFields": received_fields,
                }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            BaseError::NotFound(msg) => {
                let body = Json(json!({
                    "message": msg.unwrap_or("Resource not found".to_string()),
                }));
                (StatusCode::NOT_FOUND, body).into_response()
            }
            BaseError::DatabaseFatal(msg) => {
                let body = Json(json!({
                    "message": "Database operation failed",
                    "error": msg.unwrap_or("database unknown error".to_string()),
                }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
            BaseError::ProviderFatal(msg) => {
                let body = Json(json!({
                    "message": "Provider request failed",
                    "error": msg.unwrap_or("provider unknown error".to_string()),
                }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
            BaseError::StoreError(msg) => {
                let body = Json(json!({
                    "message": "Application state error",
                    "error": msg.unwrap_or("cache/store operation failed".to_string()),
                }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}
