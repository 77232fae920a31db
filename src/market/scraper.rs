// src/market/scraper.rs
//! JustJoin.it listing ingestion: fetch the newest offers, normalize them
//! into `JobOffer` records, upsert by offer identity, deactivate stale rows,
//! and append an audit log entry for every run.

use super::extract::SectionExtractor;
use super::types::{ListingResponse, RawOffer, ScrapeOutcome};
use crate::config::ScraperSettings;
use crate::database::{
    Database, JobOffer, JobOfferRepository, SaveCounts, ScrapingLogEntry, ScrapingLogRepository,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use tracing::{error, info};

pub const SOURCE_PORTAL: &str = "justjoin";
const SOURCE_NAME: &str = "justjoin.it";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; CareerGPT-Bot/1.0)";

pub struct JobScraper<'a> {
    db: &'a Database,
    settings: &'a ScraperSettings,
    client: Client,
    extractor: SectionExtractor,
}

impl<'a> JobScraper<'a> {
    pub fn new(db: &'a Database, settings: &'a ScraperSettings) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(settings.request_timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            db,
            settings,
            client,
            extractor: SectionExtractor::new(),
        }
    }

    /// Run one scrape cycle. Errors never escape: the result carries the
    /// failure and the run is logged either way.
    pub async fn run(&self) -> ScrapeOutcome {
        let started_at = Utc::now();
        let timer = std::time::Instant::now();

        info!("Starting job scraping run");

        let outcome = match self.scrape_and_store().await {
            Ok((scraped, counts)) => {
                info!(
                    "Scraping finished: {} offers, {} new, {} updated",
                    scraped, counts.new, counts.updated
                );
                ScrapeOutcome {
                    success: true,
                    offers_scraped: scraped as i64,
                    offers_new: counts.new as i64,
                    offers_updated: counts.updated as i64,
                    sources: vec![SOURCE_NAME.to_string()],
                    execution_time_ms: timer.elapsed().as_millis() as i64,
                    error: None,
                }
            }
            Err(e) => {
                error!("Scraping run failed: {:#}", e);
                ScrapeOutcome::failure(format!("{:#}", e), timer.elapsed().as_millis() as i64)
            }
        };

        // Audit row is best-effort, including for failed runs.
        if let Err(e) = self.log_run(&outcome, started_at).await {
            error!("Failed to record scraping log: {}", e);
        }

        outcome
    }

    async fn scrape_and_store(&self) -> Result<(usize, SaveCounts)> {
        let offers = self.fetch_listing().await?;

        let repo = JobOfferRepository::new(self.db.pool());
        let counts = repo.save_all(&offers, Utc::now()).await;

        let cutoff = Utc::now() - Duration::days(self.settings.deactivate_after_days);
        repo.deactivate_older_than(cutoff).await?;

        Ok((offers.len(), counts))
    }

    /// Fetch the most recently published listings, newest first.
    async fn fetch_listing(&self) -> Result<Vec<JobOffer>> {
        let url = format!(
            "{}/v2/user-panel/offers?page=1&sortBy=published&orderBy=DESC&perPage={}",
            self.settings.listing_base_url, self.settings.page_size
        );

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to reach listing API")?;

        if !response.status().is_success() {
            anyhow::bail!("listing API error: {}", response.status());
        }

        let listing: ListingResponse = response
            .json()
            .await
            .context("Invalid response format from listing API")?;
        let raw = listing
            .data
            .context("Invalid response format from listing API: missing data")?;

        info!("Fetched {} offers from {}", raw.len(), SOURCE_NAME);

        Ok(raw
            .into_iter()
            .map(|offer| transform_offer(&self.extractor, self.settings, offer))
            .collect())
    }

    async fn log_run(&self, outcome: &ScrapeOutcome, started_at: DateTime<Utc>) -> Result<()> {
        let entry = ScrapingLogEntry {
            source_portal: SOURCE_PORTAL.to_string(),
            status: if outcome.success { "success" } else { "error" }.to_string(),
            offers_scraped: outcome.offers_scraped,
            offers_new: outcome.offers_new,
            offers_updated: outcome.offers_updated,
            error_message: outcome.error.clone(),
            execution_time_ms: outcome.execution_time_ms,
            started_at,
            completed_at: Utc::now(),
        };
        ScrapingLogRepository::new(self.db.pool()).append(&entry).await
    }
}

/// Map a raw listing record into the normalized offer shape.
fn transform_offer(
    extractor: &SectionExtractor,
    settings: &ScraperSettings,
    raw: RawOffer,
) -> JobOffer {
    let employment = raw
        .employment_types
        .as_ref()
        .and_then(|types| types.first());
    let salary = employment.and_then(|e| e.salary.as_ref());

    let technologies = raw
        .required_skills
        .unwrap_or_default()
        .into_iter()
        .map(|skill| skill.name)
        .collect();

    let body = raw.body.unwrap_or_default();
    let external_id = raw.id.to_string();

    JobOffer {
        source_url: format!("{}/{}", settings.offer_page_base_url, external_id),
        external_id,
        title: raw.title.unwrap_or_default(),
        company: raw.company_name.unwrap_or_default(),
        location: raw.city.or(raw.workplace_type),
        salary_min: salary.and_then(|s| s.from).map(|v| v.round() as i64),
        salary_max: salary.and_then(|s| s.to).map(|v| v.round() as i64),
        salary_currency: Some(
            salary
                .and_then(|s| s.currency.clone())
                .unwrap_or_else(|| "PLN".to_string()),
        ),
        employment_type: Some(normalize_employment_type(
            employment.and_then(|e| e.kind.as_deref()),
        )),
        experience_level: Some(normalize_experience_level(raw.experience_level.as_deref())),
        requirements: extractor.requirements(&body),
        nice_to_have: extractor.nice_to_have(&body),
        // The listing API has no structured benefits section.
        benefits: Vec::new(),
        description: body,
        technologies,
        source_portal: SOURCE_PORTAL.to_string(),
        posted_date: raw.published_at.unwrap_or_else(Utc::now),
    }
}

pub fn normalize_experience_level(level: Option<&str>) -> String {
    let Some(level) = level.filter(|l| !l.is_empty()) else {
        return "unknown".to_string();
    };

    let lower = level.to_lowercase();
    if lower.contains("junior") || lower.contains("trainee") {
        "junior".to_string()
    } else if lower.contains("senior") || lower.contains("lead") {
        "senior".to_string()
    } else if lower.contains("mid") || lower.contains("regular") {
        "mid".to_string()
    } else {
        lower
    }
}

pub fn normalize_employment_type(kind: Option<&str>) -> String {
    let Some(kind) = kind.filter(|k| !k.is_empty()) else {
        return "unknown".to_string();
    };

    let lower = kind.to_lowercase();
    if lower.contains("permanent") || lower.contains("full") {
        "full-time".to_string()
    } else if lower.contains("contract") || lower.contains("b2b") {
        "contract".to_string()
    } else if lower.contains("part") {
        "part-time".to_string()
    } else if lower.contains("intern") {
        "internship".to_string()
    } else {
        lower
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn experience_level_keyword_table() {
        assert_eq!(normalize_experience_level(Some("Junior Developer")), "junior");
        assert_eq!(normalize_experience_level(Some("Trainee")), "junior");
        assert_eq!(normalize_experience_level(Some("Senior")), "senior");
        assert_eq!(normalize_experience_level(Some("Tech Lead")), "senior");
        assert_eq!(normalize_experience_level(Some("Mid")), "mid");
        assert_eq!(normalize_experience_level(Some("Regular")), "mid");
        assert_eq!(normalize_experience_level(Some("Expert")), "expert");
        assert_eq!(normalize_experience_level(None), "unknown");
        assert_eq!(normalize_experience_level(Some("")), "unknown");
    }

    #[test]
    fn employment_type_keyword_table() {
        assert_eq!(normalize_employment_type(Some("Permanent")), "full-time");
        assert_eq!(normalize_employment_type(Some("full_time")), "full-time");
        assert_eq!(normalize_employment_type(Some("B2B")), "contract");
        assert_eq!(normalize_employment_type(Some("part-time")), "part-time");
        assert_eq!(normalize_employment_type(Some("Internship")), "internship");
        assert_eq!(normalize_employment_type(Some("mandate")), "mandate");
        assert_eq!(normalize_employment_type(None), "unknown");
    }

    #[test]
    fn transforms_listing_record() {
        let payload = r#"{
            "id": "rust-dev-acme",
            "title": "Rust Developer",
            "companyName": "Acme Sp. z o.o.",
            "city": "Warszawa",
            "workplaceType": "remote",
            "experienceLevel": "Mid/Regular",
            "publishedAt": "2025-07-01T08:30:00Z",
            "requiredSkills": [{"name": "Rust"}, {"name": "PostgreSQL"}],
            "employmentTypes": [
                {"type": "b2b", "salary": {"from": 20000, "to": 28000, "currency": "pln"}}
            ],
            "body": "Wymagania: Rust, SQL. Mile widziane: Kubernetes."
        }"#;

        let raw: RawOffer = serde_json::from_str(payload).unwrap();
        let settings = ScraperSettings::default();
        let offer = transform_offer(&SectionExtractor::new(), &settings, raw);

        assert_eq!(offer.external_id, "rust-dev-acme");
        assert_eq!(offer.source_portal, SOURCE_PORTAL);
        assert_eq!(
            offer.source_url,
            "https://justjoin.it/offers/rust-dev-acme"
        );
        assert_eq!(offer.company, "Acme Sp. z o.o.");
        assert_eq!(offer.location.as_deref(), Some("Warszawa"));
        assert_eq!(offer.salary_min, Some(20000));
        assert_eq!(offer.salary_max, Some(28000));
        assert_eq!(offer.salary_currency.as_deref(), Some("pln"));
        assert_eq!(offer.employment_type.as_deref(), Some("contract"));
        assert_eq!(offer.experience_level.as_deref(), Some("mid"));
        assert_eq!(offer.technologies, vec!["Rust", "PostgreSQL"]);
        assert!(offer.requirements.contains(&"SQL".to_string()));
        assert!(offer.nice_to_have.contains(&"Kubernetes".to_string()));
    }

    #[test]
    fn transform_survives_sparse_records() {
        let raw: RawOffer = serde_json::from_str(r#"{"id": 812133}"#).unwrap();
        let settings = ScraperSettings::default();
        let offer = transform_offer(&SectionExtractor::new(), &settings, raw);

        assert_eq!(offer.external_id, "812133");
        assert_eq!(offer.title, "");
        assert_eq!(offer.location, None);
        assert_eq!(offer.salary_min, None);
        assert_eq!(offer.salary_currency.as_deref(), Some("PLN"));
        assert_eq!(offer.employment_type.as_deref(), Some("unknown"));
        assert_eq!(offer.experience_level.as_deref(), Some("unknown"));
        assert!(offer.requirements.is_empty());
        assert!(offer.benefits.is_empty());
    }
}
