// src/market/mod.rs
//! Job-market pipeline: listing ingestion (scraper) and skill-demand
//! aggregation (analyzer).

pub mod analyzer;
pub mod extract;
pub mod scraper;
pub mod types;

pub use analyzer::MarketAnalyzer;
pub use extract::SectionExtractor;
pub use scraper::JobScraper;
pub use types::ScrapeOutcome;
