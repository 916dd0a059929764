use axum::{extract::State, routing::post, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::BaseError;
use crate::provider::{generate_chat_response, prompts, ChatMessage};
use crate::schema::enum_def::ProviderKind;
use crate::service::app_state::{create_state_router, AppState, StateRouter};

const DEFAULT_MODEL: &str = "gpt-4";

#[derive(Deserialize)]
struct CompletionsRequest {
    messages: Vec<ChatMessage>,
    model: Option<String>,
    provider: Option<ProviderKind>,
    #[serde(rename = "chatbotId")]
    chatbot_id: Option<String>,
}

#[derive(Deserialize)]
struct EvaluateRequest {
    #[serde(rename = "assignmentText")]
    assignment_text: String,
    criteria: String,
}

#[derive(Deserialize)]
struct MaterialRequest {
    subject: String,
    topic: String,
    difficulty: String,
    #[serde(rename = "learningStyle")]
    learning_style: String,
}

#[derive(Deserialize)]
struct NotesRequest {
    notes: String,
}

#[derive(Deserialize)]
struct PracticeRequest {
    language: String,
    level: String,
    message: String,
}

/// Free-form completion. Explicit request fields win over the chatbot
/// configuration pulled in through `chatbotId`.
async fn completions(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CompletionsRequest>,
) -> Result<Json<Value>, BaseError> {
    let mut messages = payload.messages;
    let mut model = payload.model;
    let mut provider = payload.provider;
    let mut temperature = None;
    let mut max_tokens = None;

    if let Some(chatbot_id) = payload.chatbot_id {
        let chatbot = app_state
            .get_chatbot(&chatbot_id)
            .await?
            .ok_or_else(|| BaseError::NotFound(Some("Chatbot not found".to_string())))?;

        model.get_or_insert_with(|| chatbot.model.clone());
        provider.get_or_insert(chatbot.provider.clone());
        temperature = Some(chatbot.temperature);
        max_tokens = Some(chatbot.max_tokens);
        if !chatbot.system_prompt.is_empty()
            && !messages.iter().any(|m| m.role == "system")
        {
            messages.insert(0, ChatMessage::system(chatbot.system_prompt.clone()));
        }
    }

    let model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let provider = provider.unwrap_or_default();

    let reply =
        generate_chat_response(&app_state, &messages, &model, &provider, temperature, max_tokens)
            .await?;
    Ok(Json(json!({ "reply": reply })))
}

/// Runs a prebuilt prompt as a single user message against OpenAI.
async fn run_template(
    app_state: &AppState,
    prompt: String,
    temperature: f64,
) -> Result<Json<Value>, BaseError> {
    let messages = vec![ChatMessage::user(prompt)];
    let reply = generate_chat_response(
        app_state,
        &messages,
        DEFAULT_MODEL,
        &ProviderKind::Openai,
        Some(temperature),
        None,
    )
    .await?;
    Ok(Json(json!({ "reply": reply })))
}

async fn evaluate(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<EvaluateRequest>,
) -> Result<Json<Value>, BaseError> {
    let prompt = prompts::evaluate_assignment(&payload.assignment_text, &payload.criteria);
    run_template(&app_state, prompt, 0.3).await
}

async fn material(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<MaterialRequest>,
) -> Result<Json<Value>, BaseError> {
    let prompt = prompts::learning_material(
        &payload.subject,
        &payload.topic,
        &payload.difficulty,
        &payload.learning_style,
    );
    run_template(&app_state, prompt, 0.5).await
}

async fn notes(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<NotesRequest>,
) -> Result<Json<Value>, BaseError> {
    let prompt = prompts::enhance_notes(&payload.notes);
    run_template(&app_state, prompt, 0.4).await
}

async fn practice(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<PracticeRequest>,
) -> Result<Json<Value>, BaseError> {
    let prompt = prompts::language_practice(&payload.language, &payload.level, &payload.message);
    run_template(&app_state, prompt, 0.7).await
}

pub fn create_assistant_router() -> StateRouter {
    create_state_router().nest(
        "/assistant",
        create_state_router()
            .route("/completions", post(completions))
            .route("/evaluate", post(evaluate))
            .route("/material", post(material))
            .route("/notes", post(notes))
            .route("/practice", post(practice)),
    )
}
