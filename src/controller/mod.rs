use axum::{
    http::{self, HeaderValue},
    response::IntoResponse,
    routing::get,
    Json,
};
use log::warn;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

use crate::config::CONFIG;
use crate::database::try_connection;
// db_execute! resolves `_postgres_model`/`_sqlite_model` at the call site;
// test_db touches no model items, so any db_object! module's pair satisfies it.
use crate::database::user::{_postgres_model, _sqlite_model};
use crate::db_execute;
use crate::service::app_state::{create_state_router, StateRouter};
use crate::utils::MessageResponse;

use api_token::create_api_token_router;
use assistant::create_assistant_router;
use chat_message::create_chat_message_router;
use chat_session::create_chat_session_router;
use chatbot::create_chatbot_router;
use user::create_user_router;
use user_type::create_user_type_router;

mod api_token;
mod assistant;
mod chat_message;
mod chat_session;
mod chatbot;
mod error;
mod user;
mod user_type;

pub use error::BaseError;

/// Checks that every `required` key is present and non-null in `body`.
/// The 400 body carries both the full required list and the keys received.
pub(crate) fn validate_required(body: &Value, required: &'static [&'static str]) -> Result<(), BaseError> {
    let received_fields: Vec<String> = body
        .as_object()
        .map(|obj| obj.keys().cloned().collect())
        .unwrap_or_default();
    let missing: Vec<&str> = required
        .iter()
        .filter(|field| body.get(**field).is_none_or(Value::is_null))
        .copied()
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    Err(BaseError::MissingFields {
        message: format!("Missing required fields: {}", missing.join(", ")),
        required_fields: required.to_vec(),
        received_fields,
    })
}

pub(crate) fn parse_payload<T: DeserializeOwned>(body: Value) -> Result<T, BaseError> {
    serde_json::from_value(body)
        .map_err(|e| BaseError::ParamInvalid(Some(format!("invalid request body: {}", e))))
}

async fn test_db() -> Result<MessageResponse, BaseError> {
    let conn = &mut try_connection()?;
    db_execute!(conn, {
        diesel::sql_query("SELECT 1").execute(conn).map_err(|e| {
            BaseError::DatabaseFatal(Some(format!("Database connection test failed: {}", e)))
        })?;
    });
    Ok(MessageResponse::new("Database connection successful"))
}

pub fn create_router() -> StateRouter {
    create_state_router()
        .merge(create_user_router())
        .merge(create_user_type_router())
        .merge(create_chatbot_router())
        .merge(create_chat_session_router())
        .merge(create_chat_message_router())
        .merge(create_api_token_router())
        .merge(create_assistant_router())
        .route("/test-db", get(test_db))
}

pub fn cors_layer() -> CorsLayer {
    match &CONFIG.web_origin {
        Some(origin) => match origin.parse::<HeaderValue>() {
            Ok(origin) => CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(Any)
                .allow_headers(Any),
            Err(e) => {
                warn!("Invalid web_origin '{}': {}; allowing any origin", origin, e);
                CorsLayer::permissive()
            }
        },
        None => CorsLayer::permissive(),
    }
}

pub async fn handle_404() -> impl IntoResponse {
    (
        http::StatusCode::NOT_FOUND,
        Json(json!({"message": "Not found"})),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn validate_required_passes_when_all_fields_present() {
        let body = json!({"email": "a@b.com", "name": "A", "extra": 1});
        assert!(validate_required(&body, &["email", "name"]).is_ok());
    }

    #[test]
    fn validate_required_reports_missing_and_received_fields() {
        let body = json!({"name": "bot"});
        let err = validate_required(&body, &["name", "model"]).unwrap_err();

        match err {
            BaseError::MissingFields {
                message,
                required_fields,
                received_fields,
            } => {
                assert_eq!(message, "Missing required fields: model");
                assert_eq!(required_fields, vec!["name", "model"]);
                assert_eq!(received_fields, vec!["name".to_string()]);
            }
            other => panic!("expected MissingFields, got {:?}", other),
        }
    }

    #[test]
    fn validate_required_treats_null_as_missing() {
        let body = json!({"email": null, "name": "A"});
        assert!(validate_required(&body, &["email", "name"]).is_err());
    }

    #[test]
    fn parse_payload_rejects_wrong_types() {
        #[derive(Debug, Deserialize)]
        struct Payload {
            #[allow(dead_code)]
            count: i64,
        }

        let err = parse_payload::<Payload>(json!({"count": "not a number"})).unwrap_err();
        assert!(matches!(err, BaseError::ParamInvalid(Some(_))));
    }
}

#[cfg(test)]
mod router_tests {
    use super::*;
    use crate::service::app_state::AppState;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use std::sync::Arc;
    use tower::util::ServiceExt;
    use uuid::Uuid;

    fn test_app() -> Router {
        create_state_router()
            .nest("/api", create_router())
            .fallback(handle_404)
            .with_state(Arc::new(AppState::new()))
    }

    async fn request(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    /// User → chatbot → session chain for the tests that need live
    /// foreign keys. Returns the session id.
    async fn create_session_fixture(app: &Router) -> String {
        let (status, body) = request(
            app,
            Method::POST,
            "/api/users",
            Some(json!({
                "email": format!("{}@example.com", Uuid::new_v4()),
                "name": "Fixture User",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let user_id = body["id"].as_str().unwrap().to_string();

        let (status, body) = request(
            app,
            Method::POST,
            "/api/chatbots",
            Some(json!({"name": "Fixture Bot", "model": "gpt-4"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let chatbot_id = body["id"].as_str().unwrap().to_string();

        let (status, body) = request(
            app,
            Method::POST,
            "/api/chat/sessions",
            Some(json!({
                "user_id": user_id,
                "chatbot_id": chatbot_id,
                "title": "Algebra help",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn unknown_route_returns_404_json() {
        let app = test_app();
        let (status, body) = request(&app, Method::GET, "/api/does-not-exist", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"message": "Not found"}));
    }

    #[tokio::test]
    async fn users_post_missing_email_returns_400_with_field_lists() {
        let app = test_app();
        let (status, body) =
            request(&app, Method::POST, "/api/users", Some(json!({"name": "A"}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing required fields: email");
        assert_eq!(body["requiredFields"], json!(["email", "name"]));
        assert_eq!(body["receivedFields"], json!(["name"]));
    }

    #[tokio::test]
    async fn chatbots_post_missing_model_returns_400_with_field_lists() {
        let app = test_app();
        let (status, body) =
            request(&app, Method::POST, "/api/chatbots", Some(json!({"name": "tutor"}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing required fields: model");
        assert_eq!(body["requiredFields"], json!(["name", "model"]));
        assert_eq!(body["receivedFields"], json!(["name"]));
    }

    #[tokio::test]
    async fn user_create_then_get_round_trips() {
        let app = test_app();
        let email = format!("{}@example.com", Uuid::new_v4());

        let (status, body) = request(
            &app,
            Method::POST,
            "/api/users",
            Some(json!({
                "email": email,
                "name": "Round Trip",
                "password_hash": "h",
                "user_type": "free",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "User created successfully");
        let id = body["id"].as_str().unwrap().to_string();

        let (status, body) =
            request(&app, Method::GET, &format!("/api/users/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], email.as_str());
        assert_eq!(body["name"], "Round Trip");
        assert_eq!(body["user_type"], "free");
    }

    #[tokio::test]
    async fn sessions_list_for_unknown_user_is_empty() {
        let app = test_app();
        let uri = format!("/api/chat/sessions?userId={}", Uuid::new_v4());
        let (status, body) = request(&app, Method::GET, &uri, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn token_delete_unknown_id_returns_404() {
        let app = test_app();
        let uri = format!("/api/tokens/{}", Uuid::new_v4());
        let (status, body) = request(&app, Method::DELETE, &uri, None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"message": "API token not found"}));
    }

    #[tokio::test]
    async fn token_activation_demotes_provider_sibling() {
        let app = test_app();

        let (status, body) = request(
            &app,
            Method::POST,
            "/api/tokens",
            Some(json!({"name": "first", "value": "v1", "provider": "other", "is_active": true})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let first_id = body["id"].as_str().unwrap().to_string();

        let (status, body) = request(
            &app,
            Method::POST,
            "/api/tokens",
            Some(json!({"name": "second", "value": "v2", "provider": "other", "is_active": true})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let second_id = body["id"].as_str().unwrap().to_string();

        let (_, first) =
            request(&app, Method::GET, &format!("/api/tokens/{}", first_id), None).await;
        let (_, second) =
            request(&app, Method::GET, &format!("/api/tokens/{}", second_id), None).await;
        assert_eq!(first["is_active"], json!(false));
        assert_eq!(second["is_active"], json!(true));
    }

    #[tokio::test]
    async fn messages_listed_in_timestamp_order() {
        let app = test_app();
        let session_id = create_session_fixture(&app).await;

        for (content, timestamp) in [("third", 3000), ("first", 1000), ("second", 2000)] {
            let (status, _) = request(
                &app,
                Method::POST,
                "/api/chat/messages",
                Some(json!({
                    "session_id": session_id,
                    "role": "user",
                    "content": content,
                    "timestamp": timestamp,
                })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) = request(
            &app,
            Method::GET,
            &format!("/api/chat/messages/{}", session_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let messages = body.as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["content"], "first");
        assert_eq!(messages[1]["content"], "second");
        assert_eq!(messages[2]["content"], "third");
    }

    #[tokio::test]
    async fn messages_for_unknown_session_return_404() {
        let app = test_app();
        let uri = format!("/api/chat/messages/{}", Uuid::new_v4());
        let (status, body) = request(&app, Method::GET, &uri, None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"message": "Chat session not found"}));
    }

    #[tokio::test]
    async fn session_update_preserves_absent_fields() {
        let app = test_app();
        let session_id = create_session_fixture(&app).await;

        let (status, body) = request(
            &app,
            Method::PUT,
            &format!("/api/chat/sessions/{}", session_id),
            Some(json!({"status": "archived"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Chat session updated successfully");

        let (status, body) = request(
            &app,
            Method::GET,
            &format!("/api/chat/sessions/{}", session_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Algebra help");
        assert_eq!(body["status"], "archived");
    }

    #[tokio::test]
    async fn assistant_completions_without_active_token_returns_400() {
        let app = test_app();
        let (status, body) = request(
            &app,
            Method::POST,
            "/api/assistant/completions",
            Some(json!({
                "messages": [{"role": "user", "content": "hello"}],
                "provider": "deepseek",
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "no active token found for provider: deepseek");
    }

    #[tokio::test]
    async fn assistant_completions_unknown_chatbot_returns_404() {
        let app = test_app();
        let (status, body) = request(
            &app,
            Method::POST,
            "/api/assistant/completions",
            Some(json!({"messages": [], "chatbotId": Uuid::new_v4().to_string()})),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"message": "Chatbot not found"}));
    }

    #[tokio::test]
    async fn test_db_route_reports_success() {
        let app = test_app();
        let (status, body) = request(&app, Method::GET, "/api/test-db", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "Database connection successful"}));
    }
}
