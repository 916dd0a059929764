use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::controller::BaseError;
use crate::database::api_token::ApiToken;
use crate::schema::enum_def::ProviderKind;
use crate::service::app_state::AppState;

pub mod deepseek;
pub mod openai;
pub mod prompts;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Resolve the active credential for `provider`, dispatch to its client, and
/// account the usage. Fails before any upstream call when no credential is
/// active.
pub async fn generate_chat_response(
    app_state: &AppState,
    messages: &[ChatMessage],
    model: &str,
    provider: &ProviderKind,
    temperature: Option<f64>,
    max_tokens: Option<i32>,
) -> Result<String, BaseError> {
    let token = app_state.get_active_token(provider).await?.ok_or_else(|| {
        BaseError::ParamInvalid(Some(format!(
            "no active token found for provider: {}",
            provider
        )))
    })?;

    debug!("dispatching completion to {} (model {})", provider, model);
    let reply = match provider {
        ProviderKind::Openai => {
            openai::chat_completion(&token.value, messages, model, temperature, max_tokens).await?
        }
        ProviderKind::Deepseek => {
            deepseek::generate_response(messages, model, temperature, max_tokens).await
        }
        ProviderKind::Other => {
            return Err(BaseError::ParamInvalid(Some(format!(
                "unsupported provider: {}",
                provider
            ))));
        }
    };

    if let Err(e) = ApiToken::record_usage(&token.id) {
        warn!("Failed to record usage for token {}: {:?}", &token.id, e);
    }

    Ok(reply)
}
