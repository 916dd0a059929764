use log::debug;
use serde::{Deserialize, Serialize};

use super::ChatMessage;
use crate::config::CONFIG;
use crate::controller::BaseError;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: String,
}

/// One non-streaming chat-completions call against the configured
/// OpenAI-compatible endpoint. The reply is the first choice's content.
pub async fn chat_completion(
    api_key: &str,
    messages: &[ChatMessage],
    model: &str,
    temperature: Option<f64>,
    max_tokens: Option<i32>,
) -> Result<String, BaseError> {
    let url = format!(
        "{}/chat/completions",
        CONFIG.openai_endpoint.trim_end_matches('/')
    );
    let request = ChatCompletionRequest {
        model,
        messages,
        temperature,
        max_tokens,
    };

    debug!("[openai] POST {} model={}", &url, model);

    let client = reqwest::Client::new();
    let response = client
        .post(&url)
        .bearer_auth(api_key)
        .json(&request)
        .send()
        .await
        .map_err(|e| BaseError::ProviderFatal(Some(format!("OpenAI request failed: {}", e))))?;

    let status = response.status();
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        return Err(BaseError::ProviderFatal(Some(format!(
            "OpenAI API returned status {}: {}",
            status, detail
        ))));
    }

    let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
        BaseError::ProviderFatal(Some(format!("Failed to parse OpenAI response: {}", e)))
    })?;

    completion
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| BaseError::ProviderFatal(Some("OpenAI response contained no choices".to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_omits_absent_tuning_fields() {
        let messages = vec![ChatMessage::user("hi")];
        let request = ChatCompletionRequest {
            model: "gpt-4",
            messages: &messages,
            temperature: None,
            max_tokens: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "gpt-4");
        assert!(value.get("temperature").is_none());
        assert!(value.get("max_tokens").is_none());
    }

    #[test]
    fn request_serializes_tuning_fields_when_present() {
        let messages = vec![ChatMessage::user("hi")];
        let request = ChatCompletionRequest {
            model: "gpt-4",
            messages: &messages,
            temperature: Some(0.3),
            max_tokens: Some(100),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["temperature"], 0.3);
        assert_eq!(value["max_tokens"], 100);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hi");
    }

    #[test]
    fn response_takes_first_choice_content() {
        let body = json!({
            "id": "chatcmpl-1",
            "choices": [
                {"message": {"role": "assistant", "content": "hello there"}, "finish_reason": "stop"},
                {"message": {"role": "assistant", "content": "ignored"}, "finish_reason": "stop"}
            ]
        });

        let parsed: ChatCompletionResponse = serde_json::from_value(body).unwrap();
        let content = parsed.choices.into_iter().next().unwrap().message.content;
        assert_eq!(content, "hello there");
    }

    #[test]
    fn response_without_choices_parses_to_empty_list() {
        let parsed: ChatCompletionResponse = serde_json::from_value(json!({"id": "x"})).unwrap();
        assert!(parsed.choices.is_empty());
    }
}
