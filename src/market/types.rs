// src/market/types.rs
use serde::{Deserialize, Serialize};
use std::fmt;

// Wire format of the JustJoin.it public listing API. Only the fields the
// pipeline consumes are modeled; everything else is ignored.

#[derive(Debug, Deserialize)]
pub(crate) struct ListingResponse {
    pub data: Option<Vec<RawOffer>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawOffer {
    pub id: OfferId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub workplace_type: Option<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub required_skills: Option<Vec<RawSkill>>,
    #[serde(default)]
    pub employment_types: Option<Vec<RawEmployment>>,
    #[serde(default)]
    pub body: Option<String>,
}

/// Listing ids have shifted between numeric and slug form across API
/// revisions; accept both.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum OfferId {
    Text(String),
    Number(i64),
}

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OfferId::Text(s) => f.write_str(s),
            OfferId::Number(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSkill {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawEmployment {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub salary: Option<RawSalary>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSalary {
    #[serde(default)]
    pub from: Option<f64>,
    #[serde(default)]
    pub to: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Structured result of one scraper run. Serialized as-is in the trigger
/// response and mirrored into the scraping log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeOutcome {
    pub success: bool,
    pub offers_scraped: i64,
    pub offers_new: i64,
    pub offers_updated: i64,
    pub sources: Vec<String>,
    pub execution_time_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScrapeOutcome {
    pub fn failure(error: String, execution_time_ms: i64) -> Self {
        Self {
            success: false,
            offers_scraped: 0,
            offers_new: 0,
            offers_updated: 0,
            sources: Vec::new(),
            execution_time_ms,
            error: Some(error),
        }
    }
}
