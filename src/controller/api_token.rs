use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json,
};
use chrono::Utc;
use log::warn;
use serde::Deserialize;
use std::sync::Arc;

use super::BaseError;
use crate::database::api_token::{ApiToken, NewApiToken, UpdateApiTokenData};
use crate::database::DbResult;
use crate::schema::enum_def::ProviderKind;
use crate::service::app_state::{create_state_router, AppState, StateRouter};
use crate::utils::{generate_id, CreatedResponse, MessageResponse};

#[derive(Deserialize)]
struct CreateApiTokenRequest {
    name: String,
    value: String,
    provider: Option<ProviderKind>,
    is_active: Option<bool>,
    user_id: Option<String>,
}

#[derive(Deserialize)]
struct UpdateApiTokenRequest {
    name: Option<String>,
    value: Option<String>,
    provider: Option<ProviderKind>,
    is_active: Option<bool>,
    user_id: Option<String>,
}

async fn invalidate_provider(app_state: &AppState, provider: &ProviderKind) {
    if let Err(e) = app_state.invalidate_active_token(provider).await {
        warn!("Failed to invalidate active token cache for {}: {}", provider, e);
    }
}

async fn list_tokens() -> DbResult<Json<Vec<ApiToken>>> {
    Ok(Json(ApiToken::list_all()?))
}

async fn get_token(Path(id): Path<String>) -> DbResult<Json<ApiToken>> {
    let token = ApiToken::get_by_id(&id)?
        .ok_or_else(|| BaseError::NotFound(Some("API token not found".to_string())))?;
    Ok(Json(token))
}

async fn create_token(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateApiTokenRequest>,
) -> Result<CreatedResponse, BaseError> {
    let now = Utc::now().timestamp_millis();
    let new_token = NewApiToken {
        id: generate_id(),
        name: payload.name,
        value: payload.value,
        provider: payload.provider.unwrap_or_default(),
        is_active: payload.is_active.unwrap_or(false),
        user_id: payload.user_id,
        usage_count: 0,
        created_at: now,
        updated_at: now,
    };

    let created = ApiToken::create(&new_token)?;
    // an active insert may have demoted the cached sibling
    invalidate_provider(&app_state, &created.provider).await;
    Ok(CreatedResponse::new("API token created successfully", created.id))
}

async fn update_token(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateApiTokenRequest>,
) -> Result<MessageResponse, BaseError> {
    let existing = ApiToken::get_by_id(&id)?
        .ok_or_else(|| BaseError::NotFound(Some("API token not found".to_string())))?;
    let new_provider = payload.provider.clone();

    let update_data = UpdateApiTokenData {
        name: payload.name,
        value: payload.value,
        provider: payload.provider,
        is_active: payload.is_active,
        user_id: payload.user_id,
    };

    let affected = ApiToken::update(&id, &update_data)?;
    if affected == 0 {
        return Err(BaseError::NotFound(Some("API token not found".to_string())));
    }

    invalidate_provider(&app_state, &existing.provider).await;
    if let Some(provider) = new_provider {
        if provider != existing.provider {
            invalidate_provider(&app_state, &provider).await;
        }
    }
    Ok(MessageResponse::new("API token updated successfully"))
}

async fn delete_token(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<MessageResponse, BaseError> {
    let existing = ApiToken::get_by_id(&id)?
        .ok_or_else(|| BaseError::NotFound(Some("API token not found".to_string())))?;

    let affected = ApiToken::delete(&id)?;
    if affected == 0 {
        return Err(BaseError::NotFound(Some("API token not found".to_string())));
    }

    invalidate_provider(&app_state, &existing.provider).await;
    Ok(MessageResponse::new("API token deleted successfully"))
}

pub fn create_api_token_router() -> StateRouter {
    create_state_router().nest(
        "/tokens",
        create_state_router()
            .route("/", get(list_tokens))
            .route("/", post(create_token))
            .route("/{id}", get(get_token))
            .route("/{id}", put(update_token))
            .route("/{id}", delete(delete_token)),
    )
}
