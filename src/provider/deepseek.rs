use chrono::Utc;
use log::debug;
use std::time::Duration;

use super::ChatMessage;

const DEFAULT_MODEL: &str = "deepseek-chat";
const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_TOKENS: i32 = 2000;
const SIMULATED_LATENCY: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct DeepSeekResponse {
    pub id: String,
    pub choices: Vec<DeepSeekChoice>,
    pub usage: DeepSeekUsage,
}

#[derive(Debug)]
pub struct DeepSeekChoice {
    pub message: ChatMessage,
    pub finish_reason: String,
}

#[derive(Debug)]
pub struct DeepSeekUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Simulated DeepSeek client. There is no real SDK behind this; it sleeps to
/// mimic network latency and fabricates a reply quoting the last user
/// message. Token usage is estimated at roughly one token per 4 characters.
pub struct DeepSeekClient {
    model: String,
    temperature: f64,
    max_tokens: i32,
    latency: Duration,
}

impl DeepSeekClient {
    pub fn new(model: Option<&str>, temperature: Option<f64>, max_tokens: Option<i32>) -> Self {
        DeepSeekClient {
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
            temperature: temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            latency: SIMULATED_LATENCY,
        }
    }

    #[cfg(test)]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub async fn chat_completion(&self, messages: &[ChatMessage]) -> DeepSeekResponse {
        debug!(
            "DeepSeek simulated call: model={}, temperature={}, max_tokens={}, {} messages",
            &self.model,
            self.temperature,
            self.max_tokens,
            messages.len()
        );

        tokio::time::sleep(self.latency).await;

        let last_user_message = messages.iter().rev().find(|m| m.role == "user");
        let content = match last_user_message {
            Some(message) => format!(
                "This is a simulated response from DeepSeek AI to: \"{}\"",
                message.content
            ),
            None => "This is a simulated response from DeepSeek AI.".to_string(),
        };

        let prompt_tokens: u64 = messages
            .iter()
            .map(|m| m.content.chars().count() as u64 / 4)
            .sum();
        let completion_tokens = content.chars().count() as u64 / 4;

        DeepSeekResponse {
            id: format!("deepseek-{}", Utc::now().timestamp_millis()),
            choices: vec![DeepSeekChoice {
                message: ChatMessage {
                    role: "assistant".to_string(),
                    content,
                },
                finish_reason: "stop".to_string(),
            }],
            usage: DeepSeekUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
        }
    }
}

pub async fn generate_response(
    messages: &[ChatMessage],
    model: &str,
    temperature: Option<f64>,
    max_tokens: Option<i32>,
) -> String {
    let client = DeepSeekClient::new(Some(model), temperature, max_tokens);
    let response = client.chat_completion(messages).await;
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant_client() -> DeepSeekClient {
        DeepSeekClient::new(None, None, None).with_latency(Duration::ZERO)
    }

    #[tokio::test]
    async fn reply_quotes_the_last_user_message() {
        let client = instant_client();
        let messages = vec![
            ChatMessage::user("first question"),
            ChatMessage {
                role: "assistant".to_string(),
                content: "an answer".to_string(),
            },
            ChatMessage::user("second question"),
        ];

        let response = client.chat_completion(&messages).await;

        assert_eq!(
            response.choices[0].message.content,
            "This is a simulated response from DeepSeek AI to: \"second question\""
        );
        assert_eq!(response.choices[0].finish_reason, "stop");
        assert!(response.id.starts_with("deepseek-"));
    }

    #[tokio::test]
    async fn reply_without_user_messages_uses_fallback_text() {
        let client = instant_client();
        let messages = vec![ChatMessage::system("be helpful")];

        let response = client.chat_completion(&messages).await;

        assert_eq!(
            response.choices[0].message.content,
            "This is a simulated response from DeepSeek AI."
        );
    }

    #[tokio::test]
    async fn usage_counts_one_token_per_four_characters() {
        let client = instant_client();
        let messages = vec![ChatMessage::user("x".repeat(40))];

        let response = client.chat_completion(&messages).await;

        assert_eq!(response.usage.prompt_tokens, 10);
        assert_eq!(
            response.usage.total_tokens,
            response.usage.prompt_tokens + response.usage.completion_tokens
        );
    }
}
