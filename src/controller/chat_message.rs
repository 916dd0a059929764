use axum::{
    extract::Path,
    routing::{get, post},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use super::BaseError;
use crate::database::chat_message::{ChatMessage, NewChatMessage};
use crate::database::chat_session::ChatSession;
use crate::database::DbResult;
use crate::schema::enum_def::MessageRole;
use crate::service::app_state::{create_state_router, StateRouter};
use crate::utils::{generate_id, CreatedResponse};

#[derive(Deserialize)]
struct CreateChatMessageRequest {
    session_id: String,
    role: Option<MessageRole>,
    content: String,
    metadata: Option<Value>,
    timestamp: Option<i64>,
}

/// History endpoint: the path id is a session id, not a message id.
async fn list_session_messages(
    Path(session_id): Path<String>,
) -> DbResult<Json<Vec<ChatMessage>>> {
    if ChatSession::get_by_id(&session_id)?.is_none() {
        return Err(BaseError::NotFound(Some("Chat session not found".to_string())));
    }
    Ok(Json(ChatMessage::list_by_session(&session_id)?))
}

async fn create_message(
    Json(payload): Json<CreateChatMessageRequest>,
) -> Result<CreatedResponse, BaseError> {
    let now = Utc::now().timestamp_millis();
    let new_message = NewChatMessage {
        id: generate_id(),
        session_id: payload.session_id,
        role: payload.role.unwrap_or_default(),
        content: payload.content,
        metadata: payload.metadata.map(|m| m.to_string()),
        timestamp: payload.timestamp.unwrap_or(now),
        created_at: now,
        updated_at: now,
    };

    let created = ChatMessage::create(&new_message)?;
    Ok(CreatedResponse::new("Chat message created successfully", created.id))
}

pub fn create_chat_message_router() -> StateRouter {
    create_state_router().nest(
        "/chat/messages",
        create_state_router()
            .route("/", post(create_message))
            .route("/{session_id}", get(list_session_messages)),
    )
}
