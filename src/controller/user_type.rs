use axum::{
    extract::Path,
    routing::{delete, get, post, put},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use super::BaseError;
use crate::database::user_type::{NewUserType, UpdateUserTypeData, UserType};
use crate::database::DbResult;
use crate::service::app_state::{create_state_router, StateRouter};
use crate::utils::{generate_id, CreatedResponse, MessageResponse};

const PAGE_ALL: &str = "all";
const KNOWN_PAGES: [&str; 11] = [
    "/chat",
    "/assignments",
    "/content",
    "/language",
    "/notes",
    "/exam-generator",
    "/question-database",
    "/chat-history",
    "/token-management",
    "/admin/chatbots",
    "/admin/users",
];

#[derive(Deserialize)]
struct CreateUserTypeRequest {
    name: String,
    description: Option<String>,
    accessible_pages: Option<Vec<String>>,
    is_enabled: Option<bool>,
}

#[derive(Deserialize)]
struct UpdateUserTypeRequest {
    name: Option<String>,
    description: Option<String>,
    accessible_pages: Option<Vec<String>>,
    is_enabled: Option<bool>,
}

/// `accessible_pages` is either exactly `["all"]` or a subset of the known
/// page identifiers, never a mix.
fn validate_accessible_pages(pages: &[String]) -> Result<(), BaseError> {
    if pages.iter().any(|page| page == PAGE_ALL) {
        if pages.len() > 1 {
            return Err(BaseError::ParamInvalid(Some(
                "accessible_pages cannot combine \"all\" with specific pages".to_string(),
            )));
        }
        return Ok(());
    }

    if let Some(unknown) = pages.iter().find(|page| !KNOWN_PAGES.contains(&page.as_str())) {
        return Err(BaseError::ParamInvalid(Some(format!(
            "unknown page identifier: {}",
            unknown
        ))));
    }
    Ok(())
}

fn encode_pages(pages: Vec<String>) -> String {
    serde_json::Value::from(pages).to_string()
}

async fn list_user_types() -> DbResult<Json<Vec<UserType>>> {
    Ok(Json(UserType::list_all()?))
}

async fn get_user_type(Path(id): Path<String>) -> DbResult<Json<UserType>> {
    let user_type = UserType::get_by_id(&id)?
        .ok_or_else(|| BaseError::NotFound(Some("User type not found".to_string())))?;
    Ok(Json(user_type))
}

async fn create_user_type(
    Json(payload): Json<CreateUserTypeRequest>,
) -> Result<CreatedResponse, BaseError> {
    let accessible_pages = match payload.accessible_pages {
        Some(pages) => {
            validate_accessible_pages(&pages)?;
            encode_pages(pages)
        }
        None => "[]".to_string(),
    };

    let now = Utc::now().timestamp_millis();
    let new_user_type = NewUserType {
        id: generate_id(),
        name: payload.name,
        description: payload.description,
        accessible_pages,
        is_enabled: payload.is_enabled.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };

    let created = UserType::create(&new_user_type)?;
    Ok(CreatedResponse::new("User type created successfully", created.id))
}

async fn update_user_type(
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserTypeRequest>,
) -> Result<MessageResponse, BaseError> {
    let accessible_pages = match payload.accessible_pages {
        Some(pages) => {
            validate_accessible_pages(&pages)?;
            Some(encode_pages(pages))
        }
        None => None,
    };

    let update_data = UpdateUserTypeData {
        name: payload.name,
        description: payload.description,
        accessible_pages,
        is_enabled: payload.is_enabled,
    };

    let affected = UserType::update(&id, &update_data)?;
    if affected == 0 {
        return Err(BaseError::NotFound(Some("User type not found".to_string())));
    }
    Ok(MessageResponse::new("User type updated successfully"))
}

async fn delete_user_type(Path(id): Path<String>) -> Result<MessageResponse, BaseError> {
    let affected = UserType::delete(&id)?;
    if affected == 0 {
        return Err(BaseError::NotFound(Some("User type not found".to_string())));
    }
    Ok(MessageResponse::new("User type deleted successfully"))
}

pub fn create_user_type_router() -> StateRouter {
    create_state_router().nest(
        "/user-types",
        create_state_router()
            .route("/", get(list_user_types))
            .route("/", post(create_user_type))
            .route("/{id}", get(get_user_type))
            .route("/{id}", put(update_user_type))
            .route("/{id}", delete(delete_user_type)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn all_alone_is_valid() {
        assert!(validate_accessible_pages(&pages(&["all"])).is_ok());
    }

    #[test]
    fn all_mixed_with_pages_is_rejected() {
        let err = validate_accessible_pages(&pages(&["all", "/chat"])).unwrap_err();
        assert!(matches!(err, BaseError::ParamInvalid(Some(_))));
    }

    #[test]
    fn known_subset_is_valid() {
        assert!(validate_accessible_pages(&pages(&["/chat", "/notes"])).is_ok());
    }

    #[test]
    fn unknown_page_is_rejected_by_name() {
        let err = validate_accessible_pages(&pages(&["/chat", "/bogus"])).unwrap_err();
        match err {
            BaseError::ParamInvalid(Some(message)) => {
                assert_eq!(message, "unknown page identifier: /bogus");
            }
            other => panic!("expected ParamInvalid, got {:?}", other),
        }
    }

    #[test]
    fn empty_list_is_valid() {
        assert!(validate_accessible_pages(&[]).is_ok());
    }

    #[test]
    fn pages_encode_as_compact_json() {
        assert_eq!(encode_pages(pages(&["/chat", "/notes"])), r#"["/chat","/notes"]"#);
        assert_eq!(encode_pages(Vec::new()), "[]");
    }
}
