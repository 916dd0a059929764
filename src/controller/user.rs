use axum::{
    extract::Path,
    routing::{delete, get, post, put},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use super::{parse_payload, validate_required, BaseError};
use crate::database::user::{NewUser, UpdateUserData, User};
use crate::database::user_type::UserType;
use crate::database::DbResult;
use crate::service::app_state::{create_state_router, StateRouter};
use crate::utils::{generate_id, CreatedResponse, MessageResponse};

const REQUIRED_FIELDS: &[&str] = &["email", "name"];
const BUILTIN_USER_TYPES: [&str; 3] = ["free", "premium", "admin"];

#[derive(Deserialize)]
struct CreateUserRequest {
    email: String,
    name: String,
    password_hash: Option<String>,
    user_type: Option<String>,
    status: Option<String>,
}

#[derive(Deserialize)]
struct UpdateUserRequest {
    email: Option<String>,
    name: Option<String>,
    password_hash: Option<String>,
    user_type: Option<String>,
    status: Option<String>,
    last_login: Option<i64>,
}

async fn list_users() -> DbResult<Json<Vec<User>>> {
    Ok(Json(User::list_all()?))
}

async fn get_user(Path(id): Path<String>) -> DbResult<Json<User>> {
    let user = User::get_by_id(&id)?
        .ok_or_else(|| BaseError::NotFound(Some("User not found".to_string())))?;
    Ok(Json(user))
}

async fn create_user(Json(body): Json<Value>) -> Result<CreatedResponse, BaseError> {
    validate_required(&body, REQUIRED_FIELDS)?;
    let payload: CreateUserRequest = parse_payload(body)?;

    // user_type must be a built-in tier or an existing UserType row
    let user_type = payload.user_type.unwrap_or_else(|| "free".to_string());
    if !BUILTIN_USER_TYPES.contains(&user_type.as_str())
        && UserType::get_by_id(&user_type)?.is_none()
    {
        return Err(BaseError::ParamInvalid(Some(format!(
            "unknown user type: {}",
            user_type
        ))));
    }

    let now = Utc::now().timestamp_millis();
    let new_user = NewUser {
        id: generate_id(),
        email: payload.email,
        name: payload.name,
        password_hash: payload.password_hash,
        user_type,
        status: payload.status.unwrap_or_else(|| "active".to_string()),
        created_at: now,
        updated_at: now,
    };

    let created = User::create(&new_user)?;
    Ok(CreatedResponse::new("User created successfully", created.id))
}

async fn update_user(
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<MessageResponse, BaseError> {
    let update_data = UpdateUserData {
        email: payload.email,
        name: payload.name,
        password_hash: payload.password_hash,
        user_type: payload.user_type,
        status: payload.status,
        last_login: payload.last_login,
    };

    let affected = User::update(&id, &update_data)?;
    if affected == 0 {
        return Err(BaseError::NotFound(Some("User not found".to_string())));
    }
    Ok(MessageResponse::new("User updated successfully"))
}

async fn delete_user(Path(id): Path<String>) -> Result<MessageResponse, BaseError> {
    let affected = User::delete(&id)?;
    if affected == 0 {
        return Err(BaseError::NotFound(Some("User not found".to_string())));
    }
    Ok(MessageResponse::new("User deleted successfully"))
}

pub fn create_user_router() -> StateRouter {
    create_state_router().nest(
        "/users",
        create_state_router()
            .route("/", get(list_users))
            .route("/", post(create_user))
            .route("/{id}", get(get_user))
            .route("/{id}", put(update_user))
            .route("/{id}", delete(delete_user)),
    )
}
