// src/web/handlers/analytics_handlers.rs
use crate::analytics::{AnalyticsRecorder, PopularQuestion, UsageSummary};
use crate::database::Database;
use crate::web::types::*;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::error;

const DEFAULT_QUESTION_LIMIT: i64 = 10;

pub async fn record_satisfaction_handler(
    request: Json<SatisfactionRequest>,
    db: &State<Database>,
) -> Result<Json<ActionResponse>, ApiError> {
    let recorder = AnalyticsRecorder::new(db.pool());

    match recorder
        .record_satisfaction(&request.interaction_id, request.satisfaction)
        .await
    {
        Ok(true) => Ok(Json(ActionResponse {
            success: true,
            message: None,
        })),
        Ok(false) => Ok(Json(ActionResponse {
            success: false,
            message: Some("Unknown interaction id".to_string()),
        })),
        Err(e) => {
            error!("Failed to record satisfaction: {}", e);
            Err(ApiError::new(
                Status::InternalServerError,
                "Failed to record satisfaction",
                e.to_string(),
            ))
        }
    }
}

pub async fn popular_questions_handler(
    limit: Option<i64>,
    db: &State<Database>,
) -> Result<Json<Vec<PopularQuestion>>, ApiError> {
    let limit = limit.unwrap_or(DEFAULT_QUESTION_LIMIT).clamp(1, 100);

    AnalyticsRecorder::new(db.pool())
        .popular_questions(limit)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Failed to list popular questions: {}", e);
            ApiError::new(
                Status::InternalServerError,
                "Failed to list popular questions",
                e.to_string(),
            )
        })
}

pub async fn usage_summary_handler(
    db: &State<Database>,
) -> Result<Json<UsageSummary>, ApiError> {
    AnalyticsRecorder::new(db.pool())
        .usage_summary()
        .await
        .map(Json)
        .map_err(|e| {
            error!("Failed to compute usage summary: {}", e);
            ApiError::new(
                Status::InternalServerError,
                "Failed to compute usage summary",
                e.to_string(),
            )
        })
}
