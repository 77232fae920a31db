// src/cli.rs
use crate::analytics::AnalyticsRecorder;
use crate::config::AppConfig;
use crate::database::Database;
use crate::market::{JobScraper, MarketAnalyzer};
use crate::web::start_web_server;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "careergpt-backend")]
#[command(about = "CareerGPT backend: assistant proxy, job scraper, market analyzer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server (default)
    Serve,
    /// Run one scraper pass against the listing API
    Scrape,
    /// Run the market analyzer for one location, or the full city loop
    Analyze {
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        days: Option<i64>,
    },
    /// Trend utilities
    Trends {
        #[command(subcommand)]
        command: TrendsCommand,
    },
    /// Manage A/B instruction prompt variants
    Variant {
        #[command(subcommand)]
        command: VariantCommand,
    },
    /// Create the database schema and exit
    Init,
}

#[derive(Subcommand)]
pub enum TrendsCommand {
    /// Export stored trends to a CSV file
    Export {
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        location: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum VariantCommand {
    /// Add an active prompt variant from a text file
    Add {
        #[arg(long)]
        name: String,
        /// Share of chat traffic routed to this variant, 0-100
        #[arg(long)]
        traffic: f64,
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        description: Option<String>,
    },
    /// List active prompt variants
    List,
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => start_web_server(config).await,

        Command::Scrape => {
            let db = Database::new(&config.database_path).await?;
            let outcome = JobScraper::new(&db, &config.scraper).run().await;
            if outcome.success {
                info!(
                    "Scrape finished: {} offers, {} new, {} updated in {} ms",
                    outcome.offers_scraped,
                    outcome.offers_new,
                    outcome.offers_updated,
                    outcome.execution_time_ms
                );
            } else {
                error!(
                    "Scrape failed: {}",
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
            Ok(())
        }

        Command::Analyze { location, days } => {
            let db = Database::new(&config.database_path).await?;
            let analyzer = MarketAnalyzer::new(&db, &config.analyzer);
            match location {
                Some(location) => {
                    let days = days.unwrap_or(config.analyzer.window_days);
                    let trends = analyzer.analyze_location(&location, days).await?;
                    info!("Stored {} trends for {}", trends.len(), location);
                }
                None => {
                    let summary = analyzer.analyze_all().await;
                    info!(
                        "Analysis finished: {} locations, {} failed, {} trends stored",
                        summary.locations_analyzed,
                        summary.locations_failed,
                        summary.trends_stored
                    );
                }
            }
            Ok(())
        }

        Command::Trends { command } => match command {
            TrendsCommand::Export { output, location } => {
                let db = Database::new(&config.database_path).await?;
                let trends = crate::database::TrendRepository::new(db.pool())
                    .list(location.as_deref())
                    .await?;

                let mut writer = csv::Writer::from_path(&output)
                    .with_context(|| format!("Failed to open {}", output.display()))?;
                let count = trends.len();
                for trend in trends {
                    writer.serialize(trend)?;
                }
                writer.flush()?;

                info!("Exported {} trends to {}", count, output.display());
                Ok(())
            }
        },

        Command::Variant { command } => {
            let db = Database::new(&config.database_path).await?;
            let recorder = AnalyticsRecorder::new(db.pool());
            match command {
                VariantCommand::Add {
                    name,
                    traffic,
                    file,
                    description,
                } => {
                    anyhow::ensure!(
                        (0.0..=100.0).contains(&traffic),
                        "traffic must be between 0 and 100"
                    );
                    let prompt = tokio::fs::read_to_string(&file)
                        .await
                        .with_context(|| format!("Failed to read {}", file.display()))?;
                    anyhow::ensure!(!prompt.trim().is_empty(), "prompt file is empty");

                    let variant = recorder
                        .add_prompt_variant(&name, description.as_deref(), prompt.trim(), traffic)
                        .await?;
                    info!(
                        "Created variant '{}' ({}) at {}% traffic",
                        variant.name, variant.id, variant.traffic_percentage
                    );
                    Ok(())
                }
                VariantCommand::List => {
                    let variants = recorder.list_prompt_variants().await?;
                    if variants.is_empty() {
                        info!("No active prompt variants; built-in instructions are used");
                    }
                    for variant in variants {
                        info!(
                            "{:<20} {:>5.1}%  {}  (created {})",
                            variant.name,
                            variant.traffic_percentage,
                            variant.id,
                            variant.created_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                    Ok(())
                }
            }
        }

        Command::Init => {
            config.ensure_directories().await?;
            let db = Database::new(&config.database_path).await?;
            db.health_check().await?;
            info!("Database initialized at {}", config.database_path.display());
            Ok(())
        }
    }
}
