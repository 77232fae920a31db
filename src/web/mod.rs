// src/web/mod.rs
pub mod handlers;
pub mod types;

pub use handlers::*;
pub use types::*;

use crate::config::AppConfig;
use crate::database::Database;
use anyhow::Result;
use chrono::Utc;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{catchers, get, options, post, routes, Request, Response, State};
use tracing::info;

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
    }
}

// API Routes

#[post("/chat", data = "<request>")]
pub async fn chat(
    request: Json<ChatRequest>,
    config: &State<AppConfig>,
    db: &State<Database>,
) -> Result<Json<ChatResponse>, ApiError> {
    handlers::chat_handler(request, config, db).await
}

#[post("/thread")]
pub async fn create_thread(config: &State<AppConfig>) -> Result<Json<ThreadResponse>, ApiError> {
    handlers::create_thread_handler(config).await
}

#[post("/scraper/run")]
pub async fn run_scraper(
    config: &State<AppConfig>,
    db: &State<Database>,
) -> (Status, Json<crate::market::ScrapeOutcome>) {
    handlers::run_scraper_handler(config, db).await
}

#[post("/analyzer/run")]
pub async fn run_analyzer(
    config: &State<AppConfig>,
    db: &State<Database>,
) -> (Status, Json<AnalyzeResponse>) {
    handlers::run_analyzer_handler(config, db).await
}

#[post("/analytics/satisfaction", data = "<request>")]
pub async fn record_satisfaction(
    request: Json<SatisfactionRequest>,
    db: &State<Database>,
) -> Result<Json<ActionResponse>, ApiError> {
    handlers::record_satisfaction_handler(request, db).await
}

#[get("/analytics/questions?<limit>")]
pub async fn popular_questions(
    limit: Option<i64>,
    db: &State<Database>,
) -> Result<Json<Vec<crate::analytics::PopularQuestion>>, ApiError> {
    handlers::popular_questions_handler(limit, db).await
}

#[get("/analytics/summary")]
pub async fn usage_summary(
    db: &State<Database>,
) -> Result<Json<crate::analytics::UsageSummary>, ApiError> {
    handlers::usage_summary_handler(db).await
}

#[get("/health")]
pub async fn health(db: &State<Database>) -> Result<Json<&'static str>, ApiError> {
    db.health_check().await.map_err(|e| {
        ApiError::new(
            Status::InternalServerError,
            "Database unavailable",
            e.to_string(),
        )
    })?;
    Ok(Json("OK"))
}

#[options("/<_..>")]
pub async fn preflight() -> Status {
    Status::Ok
}

// Error catchers

#[rocket::catch(400)]
pub fn bad_request() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "Invalid request format".to_string(),
        details: "Check the request JSON and required fields".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "Internal server error".to_string(),
        details: "Try again in a few moments".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

// Main server start function
pub async fn start_web_server(config: AppConfig) -> Result<()> {
    config.ensure_directories().await?;

    let db = Database::new(&config.database_path).await?;

    info!("Starting CareerGPT API server");
    info!("Database: {}", config.database_path.display());
    info!("Assistant API: {}", config.assistant.api_base_url);

    rocket::build()
        .attach(Cors)
        .manage(config)
        .manage(db)
        .register("/api", catchers![bad_request, internal_error])
        .mount(
            "/api",
            routes![
                chat,
                create_thread,
                run_scraper,
                run_analyzer,
                record_satisfaction,
                popular_questions,
                usage_summary,
                health,
                preflight,
            ],
        )
        .launch()
        .await?;

    Ok(())
}
