use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use log::{debug, info, warn};
use thiserror::Error;

use crate::config::CONFIG;
use crate::database::api_token::ApiToken;
use crate::database::chatbot::Chatbot;
use crate::schema::enum_def::ProviderKind;

use super::cache::memory::MemoryCacheBackend;
use super::cache::repository::CacheRepository;
use super::cache::types::{CacheApiToken, CacheChatbot, CacheEntry};
use super::cache::CacheError;

enum CacheKey<'a> {
    ChatbotById(&'a str),
    ActiveToken(&'a ProviderKind),
}

impl<'a> ToString for CacheKey<'a> {
    fn to_string(&self) -> String {
        match self {
            CacheKey::ChatbotById(id) => format!("chatbot:id:{}", id),
            CacheKey::ActiveToken(provider) => format!("token:active:{}", provider),
        }
    }
}

type CacheRepo<T> = CacheRepository<T, MemoryCacheBackend<T>>;

#[derive(Clone)]
pub struct AppState {
    // chatbot_id -> CacheChatbot
    chatbot_cache: CacheRepo<CacheChatbot>,

    // provider -> CacheApiToken (the single active token per provider)
    active_token_cache: CacheRepo<CacheApiToken>,

    // Config for negative caching TTL
    negative_cache_ttl: Duration,
}

impl AppState {
    pub fn new() -> Self {
        let negative_cache_ttl = CONFIG.cache.negative_ttl();
        let ttl = Some(CONFIG.cache.ttl());

        Self {
            chatbot_cache: CacheRepository::new(
                MemoryCacheBackend::with_capacity(CONFIG.cache.capacity),
                ttl,
            ),
            active_token_cache: CacheRepository::new(MemoryCacheBackend::new(), ttl),
            negative_cache_ttl,
        }
    }

    /// Warm both caches from the database. Errors are logged per table and
    /// skipped so one bad table does not block startup.
    pub async fn reload(&self) {
        info!("Reloading AppState: Starting cache refresh...");
        let mut stats: HashMap<&'static str, usize> = HashMap::new();

        match Chatbot::list_all() {
            Ok(bots) => {
                stats.insert("Chatbots", bots.len());
                for bot in bots {
                    let cache_item = CacheChatbot::from(bot);
                    let _ = self
                        .chatbot_cache
                        .set_positive(&CacheKey::ChatbotById(&cache_item.id).to_string(), &cache_item)
                        .await;
                }
            }
            Err(e) => warn!("Failed to load chatbots during reload: {:?}", e),
        }

        match ApiToken::list_all() {
            Ok(tokens) => {
                let active: Vec<ApiToken> = tokens.into_iter().filter(|t| t.is_active).collect();
                stats.insert("Active API tokens", active.len());
                for token in active {
                    let cache_item = CacheApiToken::from(token);
                    let _ = self
                        .active_token_cache
                        .set_positive(&CacheKey::ActiveToken(&cache_item.provider).to_string(), &cache_item)
                        .await;
                }
            }
            Err(e) => warn!("Failed to load API tokens during reload: {:?}", e),
        }

        info!("AppState reloaded successfully. Cache details:\n{:#?}", stats);
    }

    // ============================================================================================
    // chatbot_id -> CacheChatbot
    // ============================================================================================
    pub async fn get_chatbot(&self, id: &str) -> Result<Option<Arc<CacheChatbot>>, AppStoreError> {
        let cache_key = CacheKey::ChatbotById(id).to_string();

        match self.chatbot_cache.get_entry(&cache_key).await? {
            Some(entry) => match &*entry {
                CacheEntry::Positive(value) => {
                    debug!("cache hit (positive): {}", &cache_key);
                    Ok(Some(value.clone()))
                }
                CacheEntry::Negative => {
                    debug!("cache hit (negative): {}", &cache_key);
                    Ok(None)
                }
            },
            None => {
                debug!("cache miss: {}", &cache_key);
                if let Ok(Some(db_bot)) = Chatbot::get_by_id(id) {
                    let cache_item = CacheChatbot::from(db_bot);
                    self.chatbot_cache.set_positive(&cache_key, &cache_item).await?;
                    Ok(Some(Arc::new(cache_item)))
                } else {
                    self.chatbot_cache.set_negative(&cache_key, self.negative_cache_ttl).await?;
                    Ok(None)
                }
            }
        }
    }

    pub async fn invalidate_chatbot(&self, id: &str) -> Result<(), AppStoreError> {
        let cache_key = CacheKey::ChatbotById(id).to_string();
        debug!("invalidate: {}", &cache_key);
        Ok(self.chatbot_cache.delete(&cache_key).await?)
    }

    // ============================================================================================
    // provider -> CacheApiToken
    // ============================================================================================
    pub async fn get_active_token(
        &self,
        provider: &ProviderKind,
    ) -> Result<Option<Arc<CacheApiToken>>, AppStoreError> {
        let cache_key = CacheKey::ActiveToken(provider).to_string();

        match self.active_token_cache.get_entry(&cache_key).await? {
            Some(entry) => match &*entry {
                CacheEntry::Positive(value) => {
                    debug!("cache hit (positive): {}", &cache_key);
                    Ok(Some(value.clone()))
                }
                CacheEntry::Negative => {
                    debug!("cache hit (negative): {}", &cache_key);
                    Ok(None)
                }
            },
            None => {
                debug!("cache miss: {}", &cache_key);
                if let Ok(Some(db_token)) = ApiToken::get_active_by_provider(provider) {
                    let cache_item = CacheApiToken::from(db_token);
                    self.active_token_cache.set_positive(&cache_key, &cache_item).await?;
                    Ok(Some(Arc::new(cache_item)))
                } else {
                    self.active_token_cache
                        .set_negative(&cache_key, self.negative_cache_ttl)
                        .await?;
                    Ok(None)
                }
            }
        }
    }

    pub async fn invalidate_active_token(&self, provider: &ProviderKind) -> Result<(), AppStoreError> {
        let cache_key = CacheKey::ActiveToken(provider).to_string();
        debug!("invalidate: {}", &cache_key);
        Ok(self.active_token_cache.delete(&cache_key).await?)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Error)]
pub enum AppStoreError {
    #[error("Cache error: {0}")]
    CacheError(String),
}

impl From<CacheError> for AppStoreError {
    fn from(e: CacheError) -> Self {
        AppStoreError::CacheError(e.to_string())
    }
}

pub async fn create_app_state() -> Arc<AppState> {
    let app_state = Arc::new(AppState::new());
    app_state.reload().await;
    app_state
}

pub type StateRouter = Router<Arc<AppState>>;

pub fn create_state_router() -> StateRouter {
    Router::<Arc<AppState>>::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn unknown_chatbot_resolves_to_none_and_is_negatively_cached() {
        let state = AppState::new();
        let id = Uuid::new_v4().to_string();

        assert!(state.get_chatbot(&id).await.unwrap().is_none());
        // second lookup is served by the negative entry
        assert!(state.get_chatbot(&id).await.unwrap().is_none());

        state.invalidate_chatbot(&id).await.unwrap();
    }

    #[tokio::test]
    async fn provider_without_tokens_has_no_active_token() {
        let state = AppState::new();

        let token = state.get_active_token(&ProviderKind::Deepseek).await.unwrap();
        assert!(token.is_none());
    }
}
