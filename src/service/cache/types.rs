use std::sync::Arc;

use crate::database::api_token::ApiToken;
use crate::database::chatbot::Chatbot;
use crate::schema::enum_def::ProviderKind;

/// Cache entry that distinguishes between positive and negative results.
/// Negative entries remember that a lookup came back empty so repeated
/// misses do not keep hitting the database.
#[derive(PartialEq, Debug, Clone)]
pub enum CacheEntry<T: Clone> {
    /// Positive cache entry containing actual data
    Positive(Arc<T>),
    /// Negative cache entry indicating data doesn't exist
    Negative,
}

impl<T: Clone> CacheEntry<T> {
    /// Create a positive cache entry
    pub fn positive(data: T) -> Self {
        CacheEntry::Positive(Arc::new(data))
    }

    /// Create a negative cache entry
    pub fn negative() -> Self {
        CacheEntry::Negative
    }

    /// Get the data if this is a positive entry
    pub fn data(&self) -> Option<Arc<T>> {
        match self {
            CacheEntry::Positive(data) => Some(data.clone()),
            CacheEntry::Negative => None,
        }
    }
}

/// Chatbot projection kept in cache, only the fields the chat path reads
#[derive(Debug, Clone, PartialEq)]
pub struct CacheChatbot {
    pub id: String,
    pub model: String,
    pub provider: ProviderKind,
    pub max_tokens: i32,
    pub system_prompt: String,
    pub temperature: f64,
}

impl From<Chatbot> for CacheChatbot {
    fn from(bot: Chatbot) -> Self {
        CacheChatbot {
            id: bot.id,
            model: bot.model,
            provider: bot.provider,
            max_tokens: bot.max_tokens,
            system_prompt: bot.system_prompt,
            temperature: bot.temperature,
        }
    }
}

/// Active token projection, enough to authenticate an upstream call
#[derive(Debug, Clone, PartialEq)]
pub struct CacheApiToken {
    pub id: String,
    pub value: String,
    pub provider: ProviderKind,
}

impl From<ApiToken> for CacheApiToken {
    fn from(token: ApiToken) -> Self {
        CacheApiToken {
            id: token.id,
            value: token.value,
            provider: token.provider,
        }
    }
}
