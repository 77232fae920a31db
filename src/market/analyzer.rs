// src/market/analyzer.rs
//! Skill-demand aggregation over stored offers: tally skill occurrences and
//! salary midpoints within a trailing window, score demand per skill, and
//! persist the ranked result per (period, location), replacing the previous
//! batch for the same key.

use crate::config::AnalyzerSettings;
use crate::database::{Database, JobOffer, JobOfferRepository, SkillTrend, TrendRepository};
use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};
use std::collections::HashMap;
use tracing::{error, info};

/// Location marker meaning "no location filter".
pub const ALL_LOCATIONS: &str = "all";

const MIN_SKILL_OCCURRENCES: usize = 2;
const MAX_TRENDS_PER_LOCATION: usize = 100;
/// Salary midpoints at or below this are treated as data errors.
const MIN_PLAUSIBLE_SALARY: f64 = 1000.0;

/// Tech vocabulary matched against requirement text. Structured skill lists
/// from the listing API are merged on top of this.
const TECH_KEYWORDS: &[&str] = &[
    "javascript", "typescript", "python", "java", "php", "c#", "go", "rust", "swift", "kotlin",
    "react", "vue", "angular", "node.js", "express", "django", "spring", "laravel",
    "postgresql", "mysql", "mongodb", "redis", "elasticsearch",
    "docker", "kubernetes", "aws", "azure", "gcp", "jenkins", "git",
    "html", "css", "sass", "webpack", "vite", "babel",
    "rest api", "graphql", "microservices", "agile", "scrum",
    "machine learning", "ai", "data science", "analytics",
];

const CATEGORIES: &[(&str, &[&str])] = &[
    ("programming", &["javascript", "typescript", "python", "java", "php", "c#", "go", "rust", "swift", "kotlin", "c++", "ruby"]),
    ("framework", &["react", "vue", "angular", "django", "spring", "laravel", "express", "flask", "rails"]),
    ("database", &["postgresql", "mysql", "mongodb", "redis", "elasticsearch", "oracle", "sqlite"]),
    ("cloud", &["aws", "azure", "gcp", "amazon web services", "google cloud platform", "microsoft azure"]),
    ("devops", &["docker", "kubernetes", "jenkins", "gitlab", "terraform", "ansible"]),
    ("frontend", &["html", "css", "sass", "webpack", "vite", "babel", "jquery"]),
    ("mobile", &["react native", "flutter", "ios", "android", "xamarin"]),
    ("data", &["machine learning", "ai", "data science", "analytics", "tableau", "power bi"]),
    ("methodology", &["agile", "scrum", "kanban", "devops", "ci/cd"]),
];

#[derive(Debug, Default)]
pub struct AnalysisSummary {
    pub locations_analyzed: usize,
    pub locations_failed: usize,
    pub trends_stored: usize,
}

pub struct MarketAnalyzer<'a> {
    db: &'a Database,
    settings: &'a AnalyzerSettings,
}

impl<'a> MarketAnalyzer<'a> {
    pub fn new(db: &'a Database, settings: &'a AnalyzerSettings) -> Self {
        Self { db, settings }
    }

    /// Analyze one location over a trailing window and persist the result,
    /// replacing any previous trends for the same (period, location).
    pub async fn analyze_location(&self, location: &str, days: i64) -> Result<Vec<SkillTrend>> {
        info!("Analyzing skill demand for {} over {} days", location, days);

        let now = Utc::now();
        let cutoff = now - Duration::days(days);
        let filter = (location != ALL_LOCATIONS).then_some(location);

        let offers = JobOfferRepository::new(self.db.pool())
            .active_since(cutoff, filter)
            .await?;

        if offers.is_empty() {
            info!("No offers found for {}", location);
            return Ok(Vec::new());
        }

        let trends = compute_trends(
            &offers,
            location,
            cutoff.date_naive(),
            now.date_naive(),
        );

        TrendRepository::new(self.db.pool())
            .replace_for_period(&trends)
            .await?;

        info!("Generated {} skill trends for {}", trends.len(), location);
        Ok(trends)
    }

    /// Run the analysis for every configured location. A failing location is
    /// logged and skipped; the loop always completes.
    pub async fn analyze_all(&self) -> AnalysisSummary {
        let mut summary = AnalysisSummary::default();

        for location in &self.settings.locations {
            match self.analyze_location(location, self.settings.window_days).await {
                Ok(trends) => {
                    summary.locations_analyzed += 1;
                    summary.trends_stored += trends.len();
                }
                Err(e) => {
                    error!("Market analysis failed for {}: {:#}", location, e);
                    summary.locations_failed += 1;
                }
            }
        }

        summary
    }
}

#[derive(Default)]
struct SkillStats {
    count: usize,
    salaries: Vec<f64>,
}

/// Pure aggregation pass: occurrence tally, salary averaging, demand score,
/// rank, cap. Skills seen in fewer than two offers are dropped.
pub fn compute_trends(
    offers: &[JobOffer],
    location: &str,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Vec<SkillTrend> {
    let mut stats: HashMap<String, SkillStats> = HashMap::new();

    for offer in offers {
        let requirement_text = offer.requirements.join(" ");
        let skills = offer
            .technologies
            .iter()
            .cloned()
            .chain(extract_skills_from_text(&requirement_text));

        let salary_midpoint = match (offer.salary_min, offer.salary_max) {
            (Some(min), Some(max)) => Some((min + max) as f64 / 2.0),
            _ => None,
        };

        for skill in skills {
            let name = normalize_skill_name(&skill);
            if name.chars().count() < 2 {
                continue;
            }

            let entry = stats.entry(name).or_default();
            entry.count += 1;
            if let Some(salary) = salary_midpoint {
                if salary > MIN_PLAUSIBLE_SALARY {
                    entry.salaries.push(salary);
                }
            }
        }
    }

    let total_offers = offers.len();
    let mut trends: Vec<SkillTrend> = stats
        .into_iter()
        .filter(|(_, s)| s.count >= MIN_SKILL_OCCURRENCES)
        .map(|(name, s)| {
            let avg_salary = (!s.salaries.is_empty())
                .then(|| s.salaries.iter().sum::<f64>() / s.salaries.len() as f64);
            let raw_score = (s.count as f64 / total_offers as f64 * 100.0).min(100.0);

            SkillTrend {
                skill_category: categorize_skill(&name).to_string(),
                skill_name: name,
                demand_score: (raw_score * 10.0).round() / 10.0,
                avg_salary_min: avg_salary.map(|a| (a * 0.9).round() as i64),
                avg_salary_max: avg_salary.map(|a| (a * 1.1).round() as i64),
                job_count: s.count as i64,
                location: location.to_string(),
                period_start,
                period_end,
            }
        })
        .collect();

    trends.sort_by(|a, b| {
        b.demand_score
            .total_cmp(&a.demand_score)
            .then_with(|| a.skill_name.cmp(&b.skill_name))
    });
    trends.truncate(MAX_TRENDS_PER_LOCATION);
    trends
}

/// Match the static tech vocabulary against free text.
pub fn extract_skills_from_text(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let lower = text.to_lowercase();
    TECH_KEYWORDS
        .iter()
        .filter(|keyword| lower.contains(*keyword))
        .map(|keyword| keyword.to_string())
        .collect()
}

/// Collapse popular aliases onto canonical skill names.
pub fn normalize_skill_name(skill: &str) -> String {
    let normalized = skill.to_lowercase().trim().to_string();

    match normalized.as_str() {
        "js" => "javascript",
        "ts" => "typescript",
        "py" => "python",
        "node" | "nodejs" => "node.js",
        "react.js" => "react",
        "vue.js" => "vue",
        "angular.js" => "angular",
        "postgres" => "postgresql",
        "mongo" => "mongodb",
        "k8s" => "kubernetes",
        "aws" => "amazon web services",
        "gcp" => "google cloud platform",
        _ => return normalized,
    }
    .to_string()
}

pub fn categorize_skill(skill: &str) -> &'static str {
    let lower = skill.to_lowercase();

    for (category, names) in CATEGORIES {
        if names
            .iter()
            .any(|name| lower.contains(name) || name.contains(lower.as_str()))
        {
            return category;
        }
    }

    "other"
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn offer(technologies: &[&str], salary: Option<(i64, i64)>) -> JobOffer {
        JobOffer {
            external_id: "x".to_string(),
            title: "Developer".to_string(),
            company: "Acme".to_string(),
            location: Some("Warszawa".to_string()),
            salary_min: salary.map(|(min, _)| min),
            salary_max: salary.map(|(_, max)| max),
            salary_currency: Some("PLN".to_string()),
            employment_type: None,
            experience_level: None,
            requirements: Vec::new(),
            nice_to_have: Vec::new(),
            benefits: Vec::new(),
            description: String::new(),
            technologies: technologies.iter().map(|s| s.to_string()).collect(),
            source_portal: "justjoin".to_string(),
            source_url: String::new(),
            posted_date: Utc::now(),
        }
    }

    fn period() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        )
    }

    #[test]
    fn demand_scores_stay_in_bounds_and_rare_skills_are_dropped() {
        let (start, end) = period();
        let offers = vec![
            offer(&["rust", "python"], None),
            offer(&["rust"], None),
            offer(&["rust", "go"], None),
        ];

        let trends = compute_trends(&offers, ALL_LOCATIONS, start, end);

        for trend in &trends {
            assert!(trend.demand_score > 0.0 && trend.demand_score <= 100.0);
            assert!(trend.job_count >= MIN_SKILL_OCCURRENCES as i64);
        }

        let rust = trends.iter().find(|t| t.skill_name == "rust").unwrap();
        assert_eq!(rust.demand_score, 100.0);
        assert_eq!(rust.job_count, 3);

        // Single occurrences never make it into the output.
        assert!(!trends.iter().any(|t| t.skill_name == "python"));
        assert!(!trends.iter().any(|t| t.skill_name == "go"));
    }

    #[test]
    fn demand_score_rounds_to_one_decimal() {
        let (start, end) = period();
        // 2 of 3 offers mention java: 66.666... -> 66.7
        let offers = vec![
            offer(&["java"], None),
            offer(&["java"], None),
            offer(&["python", "python"], None),
        ];

        let trends = compute_trends(&offers, ALL_LOCATIONS, start, end);
        let java = trends.iter().find(|t| t.skill_name == "java").unwrap();
        assert_eq!(java.demand_score, 66.7);
    }

    #[test]
    fn salary_band_is_built_around_the_midpoint_mean() {
        let (start, end) = period();
        let offers = vec![
            offer(&["rust"], Some((18000, 22000))), // midpoint 20000
            offer(&["rust"], Some((28000, 32000))), // midpoint 30000
            offer(&["rust"], Some((100, 200))),     // implausible, ignored
        ];

        let trends = compute_trends(&offers, ALL_LOCATIONS, start, end);
        let rust = trends.iter().find(|t| t.skill_name == "rust").unwrap();
        // mean 25000 -> band [22500, 27500]
        assert_eq!(rust.avg_salary_min, Some(22500));
        assert_eq!(rust.avg_salary_max, Some(27500));
    }

    #[test]
    fn offers_without_salary_leave_band_empty() {
        let (start, end) = period();
        let offers = vec![offer(&["rust"], None), offer(&["rust"], None)];

        let trends = compute_trends(&offers, ALL_LOCATIONS, start, end);
        assert_eq!(trends[0].avg_salary_min, None);
        assert_eq!(trends[0].avg_salary_max, None);
    }

    #[test]
    fn output_is_ranked_and_capped() {
        let (start, end) = period();
        // 120 distinct skills, each in two offers.
        let names: Vec<String> = (0..120).map(|i| format!("skill{:03}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let offers = vec![offer(&refs, None), offer(&refs, None), offer(&["rust"], None)];

        let trends = compute_trends(&offers, ALL_LOCATIONS, start, end);
        assert_eq!(trends.len(), MAX_TRENDS_PER_LOCATION);
        // Ties broken by name, so ordering is deterministic.
        assert_eq!(trends[0].skill_name, "skill000");
        assert!(trends.windows(2).all(|w| w[0].demand_score >= w[1].demand_score));
    }

    #[test]
    fn skills_from_requirement_text_join_the_tally() {
        let (start, end) = period();
        let mut first = offer(&[], None);
        first.requirements = vec!["znajomość Docker i Kubernetes".to_string()];
        let mut second = offer(&[], None);
        second.requirements = vec!["Docker, Kubernetes w praktyce".to_string()];

        let trends = compute_trends(&[first, second], ALL_LOCATIONS, start, end);
        assert!(trends.iter().any(|t| t.skill_name == "docker"));
        assert!(trends.iter().any(|t| t.skill_name == "kubernetes"));
    }

    #[test]
    fn skill_aliases_collapse() {
        assert_eq!(normalize_skill_name("JS"), "javascript");
        assert_eq!(normalize_skill_name("K8s"), "kubernetes");
        assert_eq!(normalize_skill_name("nodejs"), "node.js");
        assert_eq!(normalize_skill_name("AWS"), "amazon web services");
        assert_eq!(normalize_skill_name("Rust "), "rust");
    }

    #[test]
    fn skill_categories() {
        assert_eq!(categorize_skill("rust"), "programming");
        assert_eq!(categorize_skill("react"), "framework");
        assert_eq!(categorize_skill("postgresql"), "database");
        assert_eq!(categorize_skill("kubernetes"), "devops");
        assert_eq!(categorize_skill("power bi"), "data");
        assert_eq!(categorize_skill("cobol"), "other");
    }
}
