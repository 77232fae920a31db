// src/database.rs
//! Database connection management, schema, and repositories for the
//! job-offer ingestion and market-trend tables.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::{info, warn};

// ===== Core Database Connection Management =====

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection with automatic setup.
    pub async fn new(database_path: &Path) -> Result<Self> {
        if let Some(parent) = database_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create database directory")?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path.display());
        let pool = SqlitePool::connect(&database_url).await.with_context(|| {
            format!("Failed to connect to database: {}", database_path.display())
        })?;

        info!(
            "Database connection established: {}",
            database_path.display()
        );

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) async fn in_memory() -> Result<Self> {
        use sqlx::sqlite::SqlitePoolOptions;

        // A pool of one connection so every query sees the same :memory: db.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get pool reference for custom operations.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check database health.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }

    /// Run database migrations.
    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS job_offers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                external_id TEXT NOT NULL,
                title TEXT NOT NULL,
                company TEXT NOT NULL,
                location TEXT,
                salary_min INTEGER,
                salary_max INTEGER,
                salary_currency TEXT,
                employment_type TEXT,
                experience_level TEXT,
                requirements TEXT NOT NULL DEFAULT '[]',
                nice_to_have TEXT NOT NULL DEFAULT '[]',
                benefits TEXT NOT NULL DEFAULT '[]',
                description TEXT NOT NULL DEFAULT '',
                technologies TEXT NOT NULL DEFAULT '[]',
                source_portal TEXT NOT NULL,
                source_url TEXT NOT NULL,
                posted_date TEXT NOT NULL,
                scraped_at TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                CONSTRAINT offer_identity UNIQUE (source_portal, external_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_job_offers_posted_date ON job_offers(posted_date);",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_job_offers_is_active ON job_offers(is_active);",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scraping_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_portal TEXT NOT NULL,
                status TEXT NOT NULL,
                offers_scraped INTEGER NOT NULL DEFAULT 0,
                offers_new INTEGER NOT NULL DEFAULT 0,
                offers_updated INTEGER NOT NULL DEFAULT 0,
                error_message TEXT,
                execution_time_ms INTEGER NOT NULL DEFAULT 0,
                started_at TEXT NOT NULL,
                completed_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS market_trends (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                skill_name TEXT NOT NULL,
                skill_category TEXT NOT NULL,
                demand_score REAL NOT NULL,
                avg_salary_min INTEGER,
                avg_salary_max INTEGER,
                job_count INTEGER NOT NULL,
                location TEXT NOT NULL,
                period_start TEXT NOT NULL,
                period_end TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_market_trends_period \
             ON market_trends(period_start, period_end, location);",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chat_interactions (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                thread_id TEXT,
                user_message TEXT NOT NULL,
                assistant_message TEXT,
                response_time_ms INTEGER,
                success BOOLEAN NOT NULL,
                error_message TEXT,
                prompt_variant_id TEXT,
                question_category TEXT,
                user_satisfaction INTEGER,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_chat_interactions_session \
             ON chat_interactions(session_id);",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL UNIQUE,
                user_agent TEXT,
                started_at TEXT NOT NULL,
                last_activity_at TEXT NOT NULL,
                total_interactions INTEGER NOT NULL DEFAULT 0,
                ended_at TEXT
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS popular_questions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question_text TEXT NOT NULL UNIQUE,
                question_category TEXT NOT NULL,
                question_count INTEGER NOT NULL DEFAULT 0,
                avg_response_time_ms REAL,
                last_asked_at TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS prompt_variants (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                prompt_content TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                traffic_percentage REAL NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Database migrations completed");
        Ok(())
    }
}

// ===== Offer Models =====

/// A normalized job offer as produced by the scraper. Identity is the
/// (source_portal, external_id) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOffer {
    pub external_id: String,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub salary_currency: Option<String>,
    pub employment_type: Option<String>,
    pub experience_level: Option<String>,
    pub requirements: Vec<String>,
    pub nice_to_have: Vec<String>,
    pub benefits: Vec<String>,
    pub description: String,
    pub technologies: Vec<String>,
    pub source_portal: String,
    pub source_url: String,
    pub posted_date: DateTime<Utc>,
}

/// Raw row shape; list columns are JSON text.
#[derive(Debug, sqlx::FromRow)]
struct JobOfferRow {
    external_id: String,
    title: String,
    company: String,
    location: Option<String>,
    salary_min: Option<i64>,
    salary_max: Option<i64>,
    salary_currency: Option<String>,
    employment_type: Option<String>,
    experience_level: Option<String>,
    requirements: String,
    nice_to_have: String,
    benefits: String,
    description: String,
    technologies: String,
    source_portal: String,
    source_url: String,
    posted_date: DateTime<Utc>,
}

fn decode_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!("Malformed list column, treating as empty: {}", e);
        Vec::new()
    })
}

impl From<JobOfferRow> for JobOffer {
    fn from(row: JobOfferRow) -> Self {
        Self {
            requirements: decode_list(&row.requirements),
            nice_to_have: decode_list(&row.nice_to_have),
            benefits: decode_list(&row.benefits),
            technologies: decode_list(&row.technologies),
            external_id: row.external_id,
            title: row.title,
            company: row.company,
            location: row.location,
            salary_min: row.salary_min,
            salary_max: row.salary_max,
            salary_currency: row.salary_currency,
            employment_type: row.employment_type,
            experience_level: row.experience_level,
            description: row.description,
            source_portal: row.source_portal,
            source_url: row.source_url,
            posted_date: row.posted_date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SaveCounts {
    pub new: u32,
    pub updated: u32,
}

// ===== Offer Repository =====

pub struct JobOfferRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> JobOfferRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert the offer, or update every mutable field when the
    /// (source_portal, external_id) pair already exists.
    pub async fn upsert(&self, offer: &JobOffer, scraped_at: DateTime<Utc>) -> Result<UpsertOutcome> {
        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM job_offers WHERE source_portal = ? AND external_id = ?",
        )
        .bind(&offer.source_portal)
        .bind(&offer.external_id)
        .fetch_optional(self.pool)
        .await?;

        let requirements = serde_json::to_string(&offer.requirements)?;
        let nice_to_have = serde_json::to_string(&offer.nice_to_have)?;
        let benefits = serde_json::to_string(&offer.benefits)?;
        let technologies = serde_json::to_string(&offer.technologies)?;

        match existing {
            Some(id) => {
                sqlx::query(
                    r#"
                    UPDATE job_offers SET
                        title = ?, company = ?, location = ?,
                        salary_min = ?, salary_max = ?, salary_currency = ?,
                        employment_type = ?, experience_level = ?,
                        requirements = ?, nice_to_have = ?, benefits = ?,
                        description = ?, technologies = ?, source_url = ?,
                        posted_date = ?, scraped_at = ?, is_active = TRUE,
                        updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&offer.title)
                .bind(&offer.company)
                .bind(&offer.location)
                .bind(offer.salary_min)
                .bind(offer.salary_max)
                .bind(&offer.salary_currency)
                .bind(&offer.employment_type)
                .bind(&offer.experience_level)
                .bind(&requirements)
                .bind(&nice_to_have)
                .bind(&benefits)
                .bind(&offer.description)
                .bind(&technologies)
                .bind(&offer.source_url)
                .bind(offer.posted_date)
                .bind(scraped_at)
                .bind(scraped_at)
                .bind(id)
                .execute(self.pool)
                .await?;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO job_offers (
                        external_id, title, company, location,
                        salary_min, salary_max, salary_currency,
                        employment_type, experience_level,
                        requirements, nice_to_have, benefits,
                        description, technologies, source_portal, source_url,
                        posted_date, scraped_at, is_active
                    )
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, TRUE)
                    "#,
                )
                .bind(&offer.external_id)
                .bind(&offer.title)
                .bind(&offer.company)
                .bind(&offer.location)
                .bind(offer.salary_min)
                .bind(offer.salary_max)
                .bind(&offer.salary_currency)
                .bind(&offer.employment_type)
                .bind(&offer.experience_level)
                .bind(&requirements)
                .bind(&nice_to_have)
                .bind(&benefits)
                .bind(&offer.description)
                .bind(&technologies)
                .bind(&offer.source_portal)
                .bind(&offer.source_url)
                .bind(offer.posted_date)
                .bind(scraped_at)
                .execute(self.pool)
                .await?;
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    /// Upsert a batch, counting new vs updated rows. Per-offer failures are
    /// logged and skipped so one bad record cannot abort a run.
    pub async fn save_all(&self, offers: &[JobOffer], scraped_at: DateTime<Utc>) -> SaveCounts {
        let mut counts = SaveCounts::default();
        for offer in offers {
            match self.upsert(offer, scraped_at).await {
                Ok(UpsertOutcome::Inserted) => counts.new += 1,
                Ok(UpsertOutcome::Updated) => counts.updated += 1,
                Err(e) => {
                    warn!("Failed to save offer {}: {}", offer.external_id, e);
                }
            }
        }
        counts
    }

    /// Mark active offers posted before the cutoff as inactive. Offers are
    /// never deleted. Returns the number of rows deactivated.
    pub async fn deactivate_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE job_offers
            SET is_active = FALSE, updated_at = ?
            WHERE posted_date < ? AND is_active = TRUE
            "#,
        )
        .bind(Utc::now())
        .bind(cutoff)
        .execute(self.pool)
        .await?;

        let deactivated = result.rows_affected();
        if deactivated > 0 {
            info!("Deactivated {} stale offers", deactivated);
        }
        Ok(deactivated)
    }

    /// Active offers posted at or after the cutoff, optionally filtered by a
    /// case-insensitive location substring.
    pub async fn active_since(
        &self,
        cutoff: DateTime<Utc>,
        location: Option<&str>,
    ) -> Result<Vec<JobOffer>> {
        let rows: Vec<JobOfferRow> = match location {
            Some(city) => {
                sqlx::query_as(
                    r#"
                    SELECT external_id, title, company, location,
                           salary_min, salary_max, salary_currency,
                           employment_type, experience_level,
                           requirements, nice_to_have, benefits,
                           description, technologies, source_portal, source_url,
                           posted_date
                    FROM job_offers
                    WHERE is_active = TRUE
                      AND posted_date >= ?
                      AND LOWER(location) LIKE '%' || ? || '%'
                    "#,
                )
                .bind(cutoff)
                .bind(city.to_lowercase())
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT external_id, title, company, location,
                           salary_min, salary_max, salary_currency,
                           employment_type, experience_level,
                           requirements, nice_to_have, benefits,
                           description, technologies, source_portal, source_url,
                           posted_date
                    FROM job_offers
                    WHERE is_active = TRUE AND posted_date >= ?
                    "#,
                )
                .bind(cutoff)
                .fetch_all(self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(JobOffer::from).collect())
    }

    pub async fn is_active(&self, source_portal: &str, external_id: &str) -> Result<Option<bool>> {
        let active: Option<bool> = sqlx::query_scalar(
            "SELECT is_active FROM job_offers WHERE source_portal = ? AND external_id = ?",
        )
        .bind(source_portal)
        .bind(external_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(active)
    }
}

// ===== Scraping Log =====

#[derive(Debug, Clone, Serialize)]
pub struct ScrapingLogEntry {
    pub source_portal: String,
    pub status: String,
    pub offers_scraped: i64,
    pub offers_new: i64,
    pub offers_updated: i64,
    pub error_message: Option<String>,
    pub execution_time_ms: i64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

pub struct ScrapingLogRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ScrapingLogRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Append one audit row per scraper invocation.
    pub async fn append(&self, entry: &ScrapingLogEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO scraping_logs (
                source_portal, status, offers_scraped, offers_new,
                offers_updated, error_message, execution_time_ms,
                started_at, completed_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.source_portal)
        .bind(&entry.status)
        .bind(entry.offers_scraped)
        .bind(entry.offers_new)
        .bind(entry.offers_updated)
        .bind(&entry.error_message)
        .bind(entry.execution_time_ms)
        .bind(entry.started_at)
        .bind(entry.completed_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scraping_logs")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

// ===== Market Trends =====

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SkillTrend {
    pub skill_name: String,
    pub skill_category: String,
    pub demand_score: f64,
    pub avg_salary_min: Option<i64>,
    pub avg_salary_max: Option<i64>,
    pub job_count: i64,
    pub location: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}

pub struct TrendRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TrendRepository<'a> {
    const INSERT_BATCH_SIZE: usize = 50;

    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Replace all trend rows for the batch's (period_start, period_end,
    /// location) with the given batch. Not a merge: prior rows for the same
    /// key are deleted first.
    pub async fn replace_for_period(&self, trends: &[SkillTrend]) -> Result<()> {
        let Some(first) = trends.first() else {
            return Ok(());
        };

        sqlx::query(
            "DELETE FROM market_trends WHERE period_start = ? AND period_end = ? AND location = ?",
        )
        .bind(first.period_start)
        .bind(first.period_end)
        .bind(&first.location)
        .execute(self.pool)
        .await?;

        for chunk in trends.chunks(Self::INSERT_BATCH_SIZE) {
            for trend in chunk {
                sqlx::query(
                    r#"
                    INSERT INTO market_trends (
                        skill_name, skill_category, demand_score,
                        avg_salary_min, avg_salary_max, job_count,
                        location, period_start, period_end
                    )
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&trend.skill_name)
                .bind(&trend.skill_category)
                .bind(trend.demand_score)
                .bind(trend.avg_salary_min)
                .bind(trend.avg_salary_max)
                .bind(trend.job_count)
                .bind(&trend.location)
                .bind(trend.period_start)
                .bind(trend.period_end)
                .execute(self.pool)
                .await?;
            }
        }

        info!(
            "Stored {} trends for {} ({} .. {})",
            trends.len(),
            first.location,
            first.period_start,
            first.period_end
        );
        Ok(())
    }

    /// All stored trends, optionally restricted to one location, ordered by
    /// demand score within each period.
    pub async fn list(&self, location: Option<&str>) -> Result<Vec<SkillTrend>> {
        let trends: Vec<SkillTrend> = match location {
            Some(loc) => {
                sqlx::query_as(
                    r#"
                    SELECT skill_name, skill_category, demand_score,
                           avg_salary_min, avg_salary_max, job_count,
                           location, period_start, period_end
                    FROM market_trends
                    WHERE location = ?
                    ORDER BY period_start DESC, demand_score DESC
                    "#,
                )
                .bind(loc)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT skill_name, skill_category, demand_score,
                           avg_salary_min, avg_salary_max, job_count,
                           location, period_start, period_end
                    FROM market_trends
                    ORDER BY location ASC, period_start DESC, demand_score DESC
                    "#,
                )
                .fetch_all(self.pool)
                .await?
            }
        };
        Ok(trends)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_offer(external_id: &str) -> JobOffer {
        JobOffer {
            external_id: external_id.to_string(),
            title: "Senior Rust Developer".to_string(),
            company: "Acme".to_string(),
            location: Some("Warszawa".to_string()),
            salary_min: Some(20000),
            salary_max: Some(28000),
            salary_currency: Some("PLN".to_string()),
            employment_type: Some("full-time".to_string()),
            experience_level: Some("senior".to_string()),
            requirements: vec!["rust".to_string(), "sql".to_string()],
            nice_to_have: vec!["kubernetes".to_string()],
            benefits: vec![],
            description: "Wymagania: Rust, SQL".to_string(),
            technologies: vec!["rust".to_string()],
            source_portal: "justjoin".to_string(),
            source_url: "https://justjoin.it/offers/1".to_string(),
            posted_date: Utc::now(),
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent_per_identity() {
        let db = Database::in_memory().await.unwrap();
        let repo = JobOfferRepository::new(db.pool());
        let offer = sample_offer("justjoin-1");
        let now = Utc::now();

        let first = repo.save_all(std::slice::from_ref(&offer), now).await;
        assert_eq!(first.new, 1);
        assert_eq!(first.updated, 0);

        let second = repo.save_all(std::slice::from_ref(&offer), now).await;
        assert_eq!(second.new, 0);
        assert_eq!(second.updated, 1);

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM job_offers WHERE external_id = ?")
                .bind(&offer.external_id)
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn same_external_id_from_other_portal_is_a_new_row() {
        let db = Database::in_memory().await.unwrap();
        let repo = JobOfferRepository::new(db.pool());
        let now = Utc::now();

        let offer = sample_offer("shared-id");
        repo.upsert(&offer, now).await.unwrap();

        let mut other = sample_offer("shared-id");
        other.source_portal = "nofluffjobs".to_string();
        assert_eq!(
            repo.upsert(&other, now).await.unwrap(),
            UpsertOutcome::Inserted
        );
    }

    #[tokio::test]
    async fn stale_offers_are_deactivated_not_deleted() {
        let db = Database::in_memory().await.unwrap();
        let repo = JobOfferRepository::new(db.pool());
        let now = Utc::now();

        let mut stale = sample_offer("old");
        stale.posted_date = now - Duration::days(45);
        let fresh = sample_offer("fresh");

        repo.upsert(&stale, now).await.unwrap();
        repo.upsert(&fresh, now).await.unwrap();

        let deactivated = repo
            .deactivate_older_than(now - Duration::days(30))
            .await
            .unwrap();
        assert_eq!(deactivated, 1);

        assert_eq!(repo.is_active("justjoin", "old").await.unwrap(), Some(false));
        assert_eq!(
            repo.is_active("justjoin", "fresh").await.unwrap(),
            Some(true)
        );

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM job_offers")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn active_since_filters_by_location_substring() {
        let db = Database::in_memory().await.unwrap();
        let repo = JobOfferRepository::new(db.pool());
        let now = Utc::now();

        let warsaw = sample_offer("w1");
        let mut krakow = sample_offer("k1");
        krakow.location = Some("Kraków".to_string());
        repo.upsert(&warsaw, now).await.unwrap();
        repo.upsert(&krakow, now).await.unwrap();

        let cutoff = now - Duration::days(30);
        let all = repo.active_since(cutoff, None).await.unwrap();
        assert_eq!(all.len(), 2);
        // Round-trip of list columns.
        assert_eq!(all[0].requirements, vec!["rust", "sql"]);

        let filtered = repo.active_since(cutoff, Some("kraków")).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].external_id, "k1");
    }

    #[tokio::test]
    async fn trend_replacement_keeps_only_latest_batch() {
        let db = Database::in_memory().await.unwrap();
        let repo = TrendRepository::new(db.pool());

        let period_start = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let period_end = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let trend = |name: &str, score: f64| SkillTrend {
            skill_name: name.to_string(),
            skill_category: "programming".to_string(),
            demand_score: score,
            avg_salary_min: Some(18000),
            avg_salary_max: Some(22000),
            job_count: 5,
            location: "all".to_string(),
            period_start,
            period_end,
        };

        repo.replace_for_period(&[trend("python", 40.0), trend("java", 25.0)])
            .await
            .unwrap();
        repo.replace_for_period(&[trend("rust", 60.0)]).await.unwrap();

        let stored = repo.list(Some("all")).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].skill_name, "rust");
        assert_eq!(stored[0].demand_score, 60.0);
        assert_eq!(stored[0].period_start, period_start);
    }

    #[tokio::test]
    async fn scraping_log_appends() {
        let db = Database::in_memory().await.unwrap();
        let repo = ScrapingLogRepository::new(db.pool());
        let now = Utc::now();

        let entry = ScrapingLogEntry {
            source_portal: "justjoin".to_string(),
            status: "error".to_string(),
            offers_scraped: 0,
            offers_new: 0,
            offers_updated: 0,
            error_message: Some("listing API error: 503".to_string()),
            execution_time_ms: 120,
            started_at: now,
            completed_at: now,
        };
        repo.append(&entry).await.unwrap();
        repo.append(&entry).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 2);
    }
}
