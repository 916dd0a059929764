use axum::{
    extract::{Path, Query},
    routing::{delete, get, post, put},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use super::BaseError;
use crate::database::chat_session::{ChatSession, NewChatSession, UpdateChatSessionData};
use crate::database::DbResult;
use crate::service::app_state::{create_state_router, StateRouter};
use crate::utils::{generate_id, CreatedResponse, MessageResponse};

#[derive(Deserialize)]
struct SessionListQuery {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

#[derive(Deserialize)]
struct CreateChatSessionRequest {
    user_id: String,
    chatbot_id: String,
    title: Option<String>,
    status: Option<String>,
    metadata: Option<Value>,
}

#[derive(Deserialize)]
struct UpdateChatSessionRequest {
    title: Option<String>,
    status: Option<String>,
    metadata: Option<Value>,
}

async fn list_sessions(Query(query): Query<SessionListQuery>) -> DbResult<Json<Vec<ChatSession>>> {
    let sessions = match query.user_id {
        Some(user_id) => ChatSession::list_by_user(&user_id)?,
        None => ChatSession::list_all()?,
    };
    Ok(Json(sessions))
}

async fn get_session(Path(id): Path<String>) -> DbResult<Json<ChatSession>> {
    let session = ChatSession::get_by_id(&id)?
        .ok_or_else(|| BaseError::NotFound(Some("Chat session not found".to_string())))?;
    Ok(Json(session))
}

async fn create_session(
    Json(payload): Json<CreateChatSessionRequest>,
) -> Result<CreatedResponse, BaseError> {
    let now = Utc::now().timestamp_millis();
    let new_session = NewChatSession {
        id: generate_id(),
        user_id: payload.user_id,
        chatbot_id: payload.chatbot_id,
        title: payload.title.unwrap_or_default(),
        status: payload.status.unwrap_or_else(|| "active".to_string()),
        metadata: payload.metadata.map(|m| m.to_string()),
        created_at: now,
        updated_at: now,
    };

    let created = ChatSession::create(&new_session)?;
    Ok(CreatedResponse::new("Chat session created successfully", created.id))
}

async fn update_session(
    Path(id): Path<String>,
    Json(payload): Json<UpdateChatSessionRequest>,
) -> Result<MessageResponse, BaseError> {
    let update_data = UpdateChatSessionData {
        title: payload.title,
        status: payload.status,
        metadata: payload.metadata.map(|m| m.to_string()),
    };

    let affected = ChatSession::update(&id, &update_data)?;
    if affected == 0 {
        return Err(BaseError::NotFound(Some("Chat session not found".to_string())));
    }
    Ok(MessageResponse::new("Chat session updated successfully"))
}

async fn delete_session(Path(id): Path<String>) -> Result<MessageResponse, BaseError> {
    let affected = ChatSession::delete(&id)?;
    if affected == 0 {
        return Err(BaseError::NotFound(Some("Chat session not found".to_string())));
    }
    Ok(MessageResponse::new("Chat session deleted successfully"))
}

pub fn create_chat_session_router() -> StateRouter {
    create_state_router().nest(
        "/chat/sessions",
        create_state_router()
            .route("/", get(list_sessions))
            .route("/", post(create_session))
            .route("/{id}", get(get_session))
            .route("/{id}", put(update_session))
            .route("/{id}", delete(delete_session)),
    )
}
