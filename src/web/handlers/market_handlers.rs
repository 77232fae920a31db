// src/web/handlers/market_handlers.rs
use crate::config::AppConfig;
use crate::database::Database;
use crate::market::{JobScraper, MarketAnalyzer, ScrapeOutcome};
use crate::web::types::AnalyzeResponse;

use chrono::Utc;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::info;

pub async fn run_scraper_handler(
    config: &State<AppConfig>,
    db: &State<Database>,
) -> (Status, Json<ScrapeOutcome>) {
    let scraper = JobScraper::new(db.inner(), &config.scraper);
    let outcome = scraper.run().await;

    let status = if outcome.success {
        Status::Ok
    } else {
        Status::InternalServerError
    };
    (status, Json(outcome))
}

pub async fn run_analyzer_handler(
    config: &State<AppConfig>,
    db: &State<Database>,
) -> (Status, Json<AnalyzeResponse>) {
    info!("Starting market analysis");
    let analyzer = MarketAnalyzer::new(db.inner(), &config.analyzer);
    let summary = analyzer.analyze_all().await;

    let timestamp = Utc::now().to_rfc3339();
    if summary.locations_analyzed == 0 && summary.locations_failed > 0 {
        return (
            Status::InternalServerError,
            Json(AnalyzeResponse {
                success: false,
                message: None,
                error: Some(format!(
                    "Market analysis failed for all {} locations",
                    summary.locations_failed
                )),
                timestamp,
            }),
        );
    }

    (
        Status::Ok,
        Json(AnalyzeResponse {
            success: true,
            message: Some(format!(
                "Market analysis completed: {} locations, {} trends stored",
                summary.locations_analyzed, summary.trends_stored
            )),
            error: None,
            timestamp,
        }),
    )
}
