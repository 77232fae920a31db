// src/analytics.rs
//! Best-effort chat usage analytics. Every write takes an explicit
//! `SessionContext` instead of relying on ambient client state; nothing in
//! the chat path depends on these rows existing.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

// ===== Session Context =====

/// Identity of the browser session on whose behalf analytics rows are
/// written. Callers pass it into every call; when the client sent no id a
/// fresh one is generated and travels with the interaction row.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub user_agent: Option<String>,
}

impl SessionContext {
    pub fn new(session_id: Option<String>, user_agent: Option<String>) -> Self {
        let session_id = session_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("session_{}", Uuid::new_v4()));
        Self {
            session_id,
            user_agent,
        }
    }
}

// ===== Models =====

/// One chat round-trip as seen by the proxy.
#[derive(Debug, Clone)]
pub struct InteractionRecord {
    pub thread_id: Option<String>,
    pub user_message: String,
    pub assistant_message: Option<String>,
    pub response_time_ms: Option<i64>,
    pub success: bool,
    pub error_message: Option<String>,
    pub prompt_variant_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PopularQuestion {
    pub question_text: String,
    pub question_category: String,
    pub question_count: i64,
    pub avg_response_time_ms: Option<f64>,
    pub last_asked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PromptVariant {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub prompt_content: String,
    pub is_active: bool,
    pub traffic_percentage: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

/// Computed on demand from `chat_interactions`; no rollup table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub total_interactions: i64,
    pub avg_response_time_ms: Option<f64>,
    /// Share of successful interactions, 0..=100.
    pub success_rate: Option<f64>,
    pub categories: Vec<CategoryCount>,
}

// ===== Recorder =====

pub struct AnalyticsRecorder<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AnalyticsRecorder<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist one interaction and return its id. The session touch and the
    /// popular-question tally are secondary: their failures are logged and
    /// swallowed so the primary row still lands.
    pub async fn record_interaction(
        &self,
        ctx: &SessionContext,
        record: &InteractionRecord,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let category = categorize_question(&record.user_message);
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO chat_interactions (
                id, session_id, thread_id, user_message, assistant_message,
                response_time_ms, success, error_message, prompt_variant_id,
                question_category, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&ctx.session_id)
        .bind(&record.thread_id)
        .bind(&record.user_message)
        .bind(&record.assistant_message)
        .bind(record.response_time_ms)
        .bind(record.success)
        .bind(&record.error_message)
        .bind(&record.prompt_variant_id)
        .bind(category)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await?;

        if let Err(e) = self.touch_session(ctx, now).await {
            warn!("Failed to update session {}: {}", ctx.session_id, e);
        }
        if let Err(e) = self
            .bump_popular_question(&record.user_message, category, record.response_time_ms, now)
            .await
        {
            warn!("Failed to update popular questions: {}", e);
        }

        Ok(id)
    }

    async fn touch_session(&self, ctx: &SessionContext, now: DateTime<Utc>) -> Result<()> {
        let updated = sqlx::query(
            r#"
            UPDATE user_sessions
            SET last_activity_at = ?, total_interactions = total_interactions + 1
            WHERE session_id = ?
            "#,
        )
        .bind(now)
        .bind(&ctx.session_id)
        .execute(self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            sqlx::query(
                r#"
                INSERT INTO user_sessions (
                    session_id, user_agent, started_at, last_activity_at, total_interactions
                )
                VALUES (?, ?, ?, ?, 1)
                "#,
            )
            .bind(&ctx.session_id)
            .bind(&ctx.user_agent)
            .bind(now)
            .bind(now)
            .execute(self.pool)
            .await?;
        }

        Ok(())
    }

    async fn bump_popular_question(
        &self,
        question: &str,
        category: &str,
        response_time_ms: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let normalized = normalize_question(question);
        if normalized.is_empty() {
            return Ok(());
        }

        let existing: Option<(i64, Option<f64>)> = sqlx::query_as(
            "SELECT question_count, avg_response_time_ms FROM popular_questions WHERE question_text = ?",
        )
        .bind(&normalized)
        .fetch_optional(self.pool)
        .await?;

        match existing {
            Some((count, avg)) => {
                let avg = match (avg, response_time_ms) {
                    (Some(avg), Some(rt)) => {
                        Some((avg * count as f64 + rt as f64) / (count + 1) as f64)
                    }
                    (None, Some(rt)) => Some(rt as f64),
                    (avg, None) => avg,
                };
                sqlx::query(
                    r#"
                    UPDATE popular_questions
                    SET question_count = question_count + 1,
                        avg_response_time_ms = ?,
                        last_asked_at = ?
                    WHERE question_text = ?
                    "#,
                )
                .bind(avg)
                .bind(now)
                .bind(&normalized)
                .execute(self.pool)
                .await?;
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO popular_questions (
                        question_text, question_category, question_count,
                        avg_response_time_ms, last_asked_at
                    )
                    VALUES (?, ?, 1, ?, ?)
                    "#,
                )
                .bind(&normalized)
                .bind(category)
                .bind(response_time_ms.map(|rt| rt as f64))
                .bind(now)
                .execute(self.pool)
                .await?;
            }
        }

        Ok(())
    }

    /// Attach a user rating to an earlier interaction. Returns false when the
    /// interaction id is unknown.
    pub async fn record_satisfaction(
        &self,
        interaction_id: &str,
        satisfaction: i64,
    ) -> Result<bool> {
        let updated = sqlx::query(
            "UPDATE chat_interactions SET user_satisfaction = ?, updated_at = ? WHERE id = ?",
        )
        .bind(satisfaction)
        .bind(Utc::now())
        .bind(interaction_id)
        .execute(self.pool)
        .await?
        .rows_affected();
        Ok(updated > 0)
    }

    pub async fn popular_questions(&self, limit: i64) -> Result<Vec<PopularQuestion>> {
        let questions = sqlx::query_as(
            r#"
            SELECT question_text, question_category, question_count,
                   avg_response_time_ms, last_asked_at
            FROM popular_questions
            ORDER BY question_count DESC, last_asked_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(questions)
    }

    pub async fn usage_summary(&self) -> Result<UsageSummary> {
        let (total, avg_response_time_ms, success_rate): (i64, Option<f64>, Option<f64>) =
            sqlx::query_as(
                r#"
                SELECT COUNT(*),
                       AVG(response_time_ms),
                       AVG(CASE WHEN success THEN 100.0 ELSE 0.0 END)
                FROM chat_interactions
                "#,
            )
            .fetch_one(self.pool)
            .await?;

        let categories: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT COALESCE(question_category, 'other'), COUNT(*)
            FROM chat_interactions
            GROUP BY question_category
            ORDER BY COUNT(*) DESC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(UsageSummary {
            total_interactions: total,
            avg_response_time_ms,
            success_rate,
            categories: categories
                .into_iter()
                .map(|(category, count)| CategoryCount { category, count })
                .collect(),
        })
    }

    // ===== Prompt variants =====

    /// Pick an active instruction variant, weighted by traffic percentage.
    /// None means the caller should use the built-in instructions.
    pub async fn active_prompt_variant(&self) -> Result<Option<PromptVariant>> {
        let variants = self.active_variants().await?;
        let roll = rand::thread_rng().gen_range(0.0..100.0);
        Ok(pick_variant(&variants, roll).cloned())
    }

    async fn active_variants(&self) -> Result<Vec<PromptVariant>> {
        let variants = sqlx::query_as(
            r#"
            SELECT id, name, description, prompt_content, is_active,
                   traffic_percentage, created_at
            FROM prompt_variants
            WHERE is_active = TRUE
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(self.pool)
        .await?;
        Ok(variants)
    }

    pub async fn add_prompt_variant(
        &self,
        name: &str,
        description: Option<&str>,
        prompt_content: &str,
        traffic_percentage: f64,
    ) -> Result<PromptVariant> {
        let variant = PromptVariant {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.map(String::from),
            prompt_content: prompt_content.to_string(),
            is_active: true,
            traffic_percentage,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO prompt_variants (
                id, name, description, prompt_content, is_active,
                traffic_percentage, created_at
            )
            VALUES (?, ?, ?, ?, TRUE, ?, ?)
            "#,
        )
        .bind(&variant.id)
        .bind(&variant.name)
        .bind(&variant.description)
        .bind(&variant.prompt_content)
        .bind(variant.traffic_percentage)
        .bind(variant.created_at)
        .execute(self.pool)
        .await?;

        Ok(variant)
    }

    pub async fn list_prompt_variants(&self) -> Result<Vec<PromptVariant>> {
        self.active_variants().await
    }
}

/// Weighted pick over cumulative traffic percentages; a roll past the total
/// falls back to the first variant, matching the original selection rule.
fn pick_variant(variants: &[PromptVariant], roll: f64) -> Option<&PromptVariant> {
    if variants.is_empty() {
        return None;
    }

    let mut cumulative = 0.0;
    for variant in variants {
        cumulative += variant.traffic_percentage;
        if roll <= cumulative {
            return Some(variant);
        }
    }

    variants.first()
}

/// Coarse topic classifier used for the popular-question tally and the
/// usage summary breakdown.
pub fn categorize_question(question: &str) -> &'static str {
    let lower = question.to_lowercase();

    if lower.contains("cv") || lower.contains("życiorys") {
        "cv"
    } else if lower.contains("rozmow") || lower.contains("rekrutac") {
        "interview"
    } else if lower.contains("zarobk") || lower.contains("wynagrodzeni") || lower.contains("pensj")
    {
        "salary"
    } else if lower.contains("umow") || lower.contains("urlop") || lower.contains("wypowiedzeni") {
        "labor_law"
    } else if lower.contains("karier") || lower.contains("awans") || lower.contains("rozw") {
        "career"
    } else {
        "other"
    }
}

fn normalize_question(question: &str) -> String {
    question.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    fn ctx(id: &str) -> SessionContext {
        SessionContext {
            session_id: id.to_string(),
            user_agent: Some("test-agent".to_string()),
        }
    }

    fn record(message: &str, response_time_ms: Option<i64>) -> InteractionRecord {
        InteractionRecord {
            thread_id: Some("thread_1".to_string()),
            user_message: message.to_string(),
            assistant_message: Some("odpowiedź".to_string()),
            response_time_ms,
            success: true,
            error_message: None,
            prompt_variant_id: None,
        }
    }

    fn variant(name: &str, traffic: f64) -> PromptVariant {
        PromptVariant {
            id: name.to_string(),
            name: name.to_string(),
            description: None,
            prompt_content: "prompt".to_string(),
            is_active: true,
            traffic_percentage: traffic,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn missing_session_id_gets_generated() {
        let ctx = SessionContext::new(None, None);
        assert!(ctx.session_id.starts_with("session_"));

        let ctx = SessionContext::new(Some("  ".to_string()), None);
        assert!(ctx.session_id.starts_with("session_"));

        let ctx = SessionContext::new(Some("abc".to_string()), None);
        assert_eq!(ctx.session_id, "abc");
    }

    #[test]
    fn question_categories() {
        assert_eq!(categorize_question("Jak napisać CV?"), "cv");
        assert_eq!(categorize_question("rozmowa kwalifikacyjna"), "interview");
        assert_eq!(categorize_question("Jakie są zarobki w IT?"), "salary");
        assert_eq!(categorize_question("urlop wypoczynkowy"), "labor_law");
        assert_eq!(categorize_question("zmiana kariery"), "career");
        assert_eq!(categorize_question("dzień dobry"), "other");
    }

    #[test]
    fn variant_pick_respects_cumulative_weights() {
        let variants = vec![variant("a", 30.0), variant("b", 70.0)];

        assert_eq!(pick_variant(&variants, 10.0).unwrap().name, "a");
        assert_eq!(pick_variant(&variants, 30.0).unwrap().name, "a");
        assert_eq!(pick_variant(&variants, 31.0).unwrap().name, "b");
        assert_eq!(pick_variant(&variants, 99.9).unwrap().name, "b");
        assert!(pick_variant(&[], 10.0).is_none());

        // Weights that do not add up to 100 fall back to the first variant.
        let sparse = vec![variant("a", 5.0)];
        assert_eq!(pick_variant(&sparse, 80.0).unwrap().name, "a");
    }

    #[tokio::test]
    async fn interaction_recording_touches_session_and_tally() {
        let db = Database::in_memory().await.unwrap();
        let recorder = AnalyticsRecorder::new(db.pool());
        let ctx = ctx("s1");

        let first = recorder
            .record_interaction(&ctx, &record("Jak napisać CV?", Some(1200)))
            .await
            .unwrap();
        assert!(!first.is_empty());

        recorder
            .record_interaction(&ctx, &record("Jak  napisać CV?", Some(800)))
            .await
            .unwrap();

        let (total_interactions,): (i64,) =
            sqlx::query_as("SELECT total_interactions FROM user_sessions WHERE session_id = 's1'")
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(total_interactions, 2);

        // Whitespace-normalized questions share one tally row.
        let questions = recorder.popular_questions(10).await.unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question_count, 2);
        assert_eq!(questions[0].question_category, "cv");
        assert_eq!(questions[0].avg_response_time_ms, Some(1000.0));
    }

    #[tokio::test]
    async fn satisfaction_updates_only_known_interactions() {
        let db = Database::in_memory().await.unwrap();
        let recorder = AnalyticsRecorder::new(db.pool());

        let id = recorder
            .record_interaction(&ctx("s1"), &record("pytanie", None))
            .await
            .unwrap();

        assert!(recorder.record_satisfaction(&id, 5).await.unwrap());
        assert!(!recorder.record_satisfaction("missing", 1).await.unwrap());
    }

    #[tokio::test]
    async fn usage_summary_aggregates_interactions() {
        let db = Database::in_memory().await.unwrap();
        let recorder = AnalyticsRecorder::new(db.pool());
        let ctx = ctx("s1");

        recorder
            .record_interaction(&ctx, &record("Jak napisać CV?", Some(1000)))
            .await
            .unwrap();
        let mut failed = record("inne pytanie", Some(3000));
        failed.success = false;
        failed.error_message = Some("timeout".to_string());
        recorder.record_interaction(&ctx, &failed).await.unwrap();

        let summary = recorder.usage_summary().await.unwrap();
        assert_eq!(summary.total_interactions, 2);
        assert_eq!(summary.avg_response_time_ms, Some(2000.0));
        assert_eq!(summary.success_rate, Some(50.0));
        assert_eq!(summary.categories.len(), 2);
    }

    #[tokio::test]
    async fn stored_variants_round_trip() {
        let db = Database::in_memory().await.unwrap();
        let recorder = AnalyticsRecorder::new(db.pool());

        recorder
            .add_prompt_variant("friendly", Some("warmer tone"), "Bądź cieplejszy.", 100.0)
            .await
            .unwrap();

        let picked = recorder.active_prompt_variant().await.unwrap();
        assert_eq!(picked.unwrap().name, "friendly");
    }
}
