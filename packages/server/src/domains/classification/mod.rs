//! Advisory classification of free-text issue descriptions.
//!
//! Asks the hosted model for a {category, severity} suggestion and parses
//! its answer. The suggestion is never authoritative: it lands in the
//! issue's ai_* fields (or in the categorize endpoint's response) and a
//! human accepts it through the ordinary update path, or not at all.
//!
//! The call is bounded by a timeout and every failure mode - unreachable
//! service, timeout, unparseable answer, out-of-vocabulary labels -
//! degrades to `Unavailable`. Issue creation never blocks on this.

use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::common::IssueId;
use crate::domains::issues::models::{Issue, IssueCategory, IssueSeverity};
use crate::kernel::BaseAI;

pub const CLASSIFY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Suggestion {
        category: IssueCategory,
        severity: IssueSeverity,
        confidence: Option<f64>,
    },
    Unavailable,
}

pub async fn classify_description(ai: &dyn BaseAI, description: &str) -> Classification {
    classify_with_timeout(ai, description, CLASSIFY_TIMEOUT).await
}

pub async fn classify_with_timeout(
    ai: &dyn BaseAI,
    description: &str,
    timeout: Duration,
) -> Classification {
    let prompt = build_prompt(description);
    match tokio::time::timeout(timeout, ai.complete(&prompt)).await {
        Ok(Ok(text)) => match parse_suggestion(&text) {
            Some(classification) => classification,
            None => {
                tracing::warn!(response = %text, "Unparseable classification response");
                Classification::Unavailable
            }
        },
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Classification service unavailable");
            Classification::Unavailable
        }
        Err(_) => {
            tracing::warn!("Classification call timed out");
            Classification::Unavailable
        }
    }
}

/// Classify in the background and store the advisory result on the issue.
/// Fire-and-forget: failures are logged and dropped so creation is never
/// affected.
pub fn spawn_advisory_classification(
    ai: Arc<dyn BaseAI>,
    issue_id: IssueId,
    description: String,
    pool: PgPool,
) {
    tokio::spawn(async move {
        match classify_description(ai.as_ref(), &description).await {
            Classification::Suggestion {
                category,
                severity,
                confidence,
            } => {
                let tags = [category.to_string(), severity.to_string()];
                if let Err(e) = Issue::set_classification(issue_id, confidence, &tags, &pool).await
                {
                    tracing::warn!(%issue_id, error = %e, "Failed to store classification");
                }
            }
            Classification::Unavailable => {
                tracing::debug!(%issue_id, "Issue left unclassified");
            }
        }
    });
}

fn build_prompt(description: &str) -> String {
    format!(
        r#"You are an assistant categorizing citizen-reported civic issues.
Classify the following report into one of these categories:
["roads", "water", "health", "security", "corruption", "education", "environment", "housing"]

Also assign a severity level based on urgency and community impact:
["low", "medium", "high", "critical"]

Issue:
"{}"

Return only a JSON object like this:
{{
  "category": "...",
  "severity": "...",
  "confidence": 0.0
}}"#,
        description
    )
}

#[derive(Debug, Deserialize)]
struct RawSuggestion {
    category: String,
    severity: String,
    confidence: Option<f64>,
}

/// Best-effort parse of the model's free-text answer. Tolerates code fences
/// and label casing; rejects anything outside the category/severity
/// vocabulary.
fn parse_suggestion(text: &str) -> Option<Classification> {
    let json = extract_json_object(text)?;
    let raw: RawSuggestion = serde_json::from_str(json).ok()?;
    let category: IssueCategory = raw.category.trim().to_lowercase().parse().ok()?;
    let severity: IssueSeverity = raw.severity.trim().to_lowercase().parse().ok()?;
    Some(Classification::Suggestion {
        category,
        severity,
        confidence: raw.confidence,
    })
}

fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}
