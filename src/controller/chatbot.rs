use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json,
};
use chrono::Utc;
use log::warn;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::{parse_payload, validate_required, BaseError};
use crate::database::chatbot::{Chatbot, NewChatbot, UpdateChatbotData};
use crate::database::DbResult;
use crate::schema::enum_def::ProviderKind;
use crate::service::app_state::{create_state_router, AppState, StateRouter};
use crate::utils::{generate_id, CreatedResponse, MessageResponse};

const REQUIRED_FIELDS: &[&str] = &["name", "model"];
const RESPONSE_LANGUAGES: [&str; 4] = ["zh-HK", "en", "zh-CN", "zh-TW"];

#[derive(Deserialize)]
struct CreateChatbotRequest {
    name: String,
    model: String,
    provider: Option<ProviderKind>,
    daily_limit: Option<i32>,
    max_tokens: Option<i32>,
    has_file_access: Option<bool>,
    system_prompt: Option<String>,
    welcome_message: Option<String>,
    knowledge_base: Option<String>,
    knowledge_base_enabled: Option<bool>,
    response_language: Option<String>,
    temperature: Option<f64>,
    emoji_mode: Option<bool>,
    role: Option<String>,
    principles: Option<String>,
    interaction_examples: Option<String>,
    status: Option<String>,
}

#[derive(Deserialize)]
struct UpdateChatbotRequest {
    name: Option<String>,
    model: Option<String>,
    provider: Option<ProviderKind>,
    daily_limit: Option<i32>,
    max_tokens: Option<i32>,
    has_file_access: Option<bool>,
    system_prompt: Option<String>,
    welcome_message: Option<String>,
    knowledge_base: Option<String>,
    knowledge_base_enabled: Option<bool>,
    response_language: Option<String>,
    temperature: Option<f64>,
    emoji_mode: Option<bool>,
    role: Option<String>,
    principles: Option<String>,
    interaction_examples: Option<String>,
    status: Option<String>,
}

async fn list_chatbots() -> DbResult<Json<Vec<Chatbot>>> {
    Ok(Json(Chatbot::list_all()?))
}

async fn get_chatbot(Path(id): Path<String>) -> DbResult<Json<Chatbot>> {
    let chatbot = Chatbot::get_by_id(&id)?
        .ok_or_else(|| BaseError::NotFound(Some("Chatbot not found".to_string())))?;
    Ok(Json(chatbot))
}

async fn create_chatbot(
    State(app_state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<CreatedResponse, BaseError> {
    validate_required(&body, REQUIRED_FIELDS)?;
    let payload: CreateChatbotRequest = parse_payload(body)?;

    let response_language = payload.response_language.unwrap_or_else(|| "zh-TW".to_string());
    if !RESPONSE_LANGUAGES.contains(&response_language.as_str()) {
        return Err(BaseError::ParamInvalid(Some(format!(
            "unsupported response language: {}",
            response_language
        ))));
    }

    let temperature = payload.temperature.unwrap_or(0.7);
    if !(0.0..=1.0).contains(&temperature) {
        return Err(BaseError::ParamInvalid(Some(
            "temperature must be between 0 and 1".to_string(),
        )));
    }

    let daily_limit = payload.daily_limit.unwrap_or(50);
    if daily_limit <= 0 {
        return Err(BaseError::ParamInvalid(Some(
            "daily_limit must be a positive integer".to_string(),
        )));
    }

    let max_tokens = payload.max_tokens.unwrap_or(2000);
    if max_tokens <= 0 {
        return Err(BaseError::ParamInvalid(Some(
            "max_tokens must be a positive integer".to_string(),
        )));
    }

    // a disabled knowledge base never keeps a reference
    let knowledge_base_enabled = payload.knowledge_base_enabled.unwrap_or(false);
    let knowledge_base = if knowledge_base_enabled {
        payload.knowledge_base
    } else {
        None
    };

    let now = Utc::now().timestamp_millis();
    let new_chatbot = NewChatbot {
        id: generate_id(),
        name: payload.name,
        model: payload.model,
        provider: payload.provider.unwrap_or_default(),
        daily_limit,
        max_tokens,
        has_file_access: payload.has_file_access.unwrap_or(false),
        system_prompt: payload.system_prompt.unwrap_or_default(),
        welcome_message: payload.welcome_message,
        knowledge_base,
        knowledge_base_enabled,
        response_language,
        temperature,
        emoji_mode: payload.emoji_mode.unwrap_or(false),
        role: payload.role.unwrap_or_default(),
        principles: payload.principles.unwrap_or_default(),
        interaction_examples: payload.interaction_examples.unwrap_or_default(),
        status: payload.status.unwrap_or_else(|| "active".to_string()),
        created_at: now,
        updated_at: now,
    };

    let created = Chatbot::create(&new_chatbot)?;
    if let Err(e) = app_state.invalidate_chatbot(&created.id).await {
        warn!("Failed to invalidate chatbot cache for {}: {}", &created.id, e);
    }
    Ok(CreatedResponse::new("Chatbot created successfully", created.id))
}

async fn update_chatbot(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateChatbotRequest>,
) -> Result<MessageResponse, BaseError> {
    // disabling the knowledge base clears the stored reference
    let knowledge_base = match payload.knowledge_base_enabled {
        Some(false) => Some(None),
        _ => payload.knowledge_base.map(Some),
    };

    let update_data = UpdateChatbotData {
        name: payload.name,
        model: payload.model,
        provider: payload.provider,
        daily_limit: payload.daily_limit,
        max_tokens: payload.max_tokens,
        has_file_access: payload.has_file_access,
        system_prompt: payload.system_prompt,
        welcome_message: payload.welcome_message,
        knowledge_base,
        knowledge_base_enabled: payload.knowledge_base_enabled,
        response_language: payload.response_language,
        temperature: payload.temperature,
        emoji_mode: payload.emoji_mode,
        role: payload.role,
        principles: payload.principles,
        interaction_examples: payload.interaction_examples,
        status: payload.status,
    };

    let affected = Chatbot::update(&id, &update_data)?;
    if affected == 0 {
        return Err(BaseError::NotFound(Some("Chatbot not found".to_string())));
    }

    if let Err(e) = app_state.invalidate_chatbot(&id).await {
        warn!("Failed to invalidate chatbot cache for {}: {}", &id, e);
    }
    Ok(MessageResponse::new("Chatbot updated successfully"))
}

async fn delete_chatbot(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<MessageResponse, BaseError> {
    let affected = Chatbot::delete(&id)?;
    if affected == 0 {
        return Err(BaseError::NotFound(Some("Chatbot not found".to_string())));
    }

    if let Err(e) = app_state.invalidate_chatbot(&id).await {
        warn!("Failed to invalidate chatbot cache for {}: {}", &id, e);
    }
    Ok(MessageResponse::new("Chatbot deleted successfully"))
}

pub fn create_chatbot_router() -> StateRouter {
    create_state_router().nest(
        "/chatbots",
        create_state_router()
            .route("/", get(list_chatbots))
            .route("/", post(create_chatbot))
            .route("/{id}", get(get_chatbot))
            .route("/{id}", put(update_chatbot))
            .route("/{id}", delete(delete_chatbot)),
    )
}
