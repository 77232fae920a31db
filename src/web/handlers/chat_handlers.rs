// src/web/handlers/chat_handlers.rs
use crate::analytics::{AnalyticsRecorder, InteractionRecord, SessionContext};
use crate::assistant::{fallback_answer, AssistantClient, AssistantError, DEFAULT_INSTRUCTIONS};
use crate::config::AppConfig;
use crate::database::Database;
use crate::web::types::*;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info, warn};

fn chat_error(e: AssistantError) -> ApiError {
    let status = Status::from_code(e.status_code()).unwrap_or(Status::InternalServerError);
    ApiError::new(status, "Failed to process chat message", e.to_string())
}

pub async fn chat_handler(
    request: Json<ChatRequest>,
    config: &State<AppConfig>,
    db: &State<Database>,
) -> Result<Json<ChatResponse>, ApiError> {
    let timer = std::time::Instant::now();
    let request = request.into_inner();

    let (thread_id, message) = match (
        request.thread_id.filter(|t| !t.trim().is_empty()),
        request.message.filter(|m| !m.trim().is_empty()),
    ) {
        (Some(thread_id), Some(message)) => (thread_id, message),
        _ => return Err(ApiError::bad_request("Thread ID and message are required")),
    };

    let client = AssistantClient::from_env(&config.assistant).map_err(chat_error)?;
    client.ensure_configured().map_err(chat_error)?;

    info!("Processing chat request for thread {}", thread_id);

    let recorder = AnalyticsRecorder::new(db.pool());
    let ctx = SessionContext::new(request.session_id, request.user_agent);

    // A/B instruction prompt; analytics failures never block the chat.
    let variant = match recorder.active_prompt_variant().await {
        Ok(variant) => variant,
        Err(e) => {
            warn!("Prompt variant lookup failed: {}", e);
            None
        }
    };
    let (instructions, variant_id) = match variant {
        Some(v) => (v.prompt_content, Some(v.id)),
        None => (DEFAULT_INSTRUCTIONS.to_string(), None),
    };

    let assistant_message = match client.chat(&thread_id, &message, &instructions).await {
        Ok(text) => text,
        Err(AssistantError::EmptyResponse) => {
            // Degrade to a topic-matched canned answer instead of failing.
            warn!("Empty upstream response, serving fallback answer");
            fallback_answer(&message).to_string()
        }
        Err(e) => {
            error!("Chat request failed: {}", e);
            let record = InteractionRecord {
                thread_id: Some(thread_id.clone()),
                user_message: message.clone(),
                assistant_message: None,
                response_time_ms: Some(timer.elapsed().as_millis() as i64),
                success: false,
                error_message: Some(e.to_string()),
                prompt_variant_id: variant_id,
            };
            if let Err(log_err) = recorder.record_interaction(&ctx, &record).await {
                warn!("Failed to record failed interaction: {}", log_err);
            }
            return Err(chat_error(e));
        }
    };

    let record = InteractionRecord {
        thread_id: Some(thread_id),
        user_message: message,
        assistant_message: Some(assistant_message.clone()),
        response_time_ms: Some(timer.elapsed().as_millis() as i64),
        success: true,
        error_message: None,
        prompt_variant_id: variant_id,
    };
    let interaction_id = match recorder.record_interaction(&ctx, &record).await {
        Ok(id) => Some(id),
        Err(e) => {
            warn!("Failed to record interaction: {}", e);
            None
        }
    };

    Ok(Json(ChatResponse {
        assistant_message,
        interaction_id,
    }))
}

pub async fn create_thread_handler(
    config: &State<AppConfig>,
) -> Result<Json<ThreadResponse>, ApiError> {
    let client = AssistantClient::from_env(&config.assistant).map_err(|e| {
        ApiError::new(
            Status::InternalServerError,
            "Failed to create thread",
            e.to_string(),
        )
    })?;

    match client.create_thread().await {
        Ok(thread_id) => Ok(Json(ThreadResponse { thread_id })),
        Err(e) => {
            error!("Thread creation failed: {}", e);
            Err(ApiError::new(
                Status::InternalServerError,
                "Failed to create thread",
                e.to_string(),
            ))
        }
    }
}
