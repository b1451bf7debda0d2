use async_trait::async_trait;
use chrono::Local;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{AdvisorError, Result};
use crate::models::{
    ApiMessage, CompletionRequest, RecommendationItem, RecommendationSet, RelatedArea,
};
use crate::profile::Profile;
use crate::prompt::{PromptKind, PromptTemplate};
use crate::transport::Transport;

/// Placeholder for missing narrative fields.
pub const MISSING_TEXT: &str = "정보 없음";
/// Placeholder for missing short detail fields (audience, format, duration, credits).
pub const MISSING_DETAIL: &str = "-";

pub const NO_INTERESTS_WARNING: &str = "최소 하나 이상의 관심 분야를 선택해주세요.";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Recommender: Send + Sync {
    async fn recommend(&self, profile: &Profile) -> Result<RecommendationSet>;
}

pub struct CourseRecommender {
    tx: Arc<dyn Transport>,
    model: String,
    template: PromptTemplate,
    temperature: Option<f32>,
}

impl CourseRecommender {
    pub fn new(tx: Arc<dyn Transport>, model: String, template: PromptTemplate) -> Self {
        Self {
            tx,
            model,
            template,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    fn build_request(&self, profile: &Profile) -> CompletionRequest {
        let prompt = self.template.render(
            profile,
            PromptKind::Recommendation,
            Local::now().date_naive(),
        );
        CompletionRequest {
            model: self.model.clone(),
            messages: vec![ApiMessage::system(prompt)],
            temperature: self.temperature,
            response_format: self
                .template
                .variant()
                .json_mode()
                .then(|| serde_json::json!({"type": "json_object"})),
        }
    }
}

#[async_trait]
impl Recommender for CourseRecommender {
    async fn recommend(&self, profile: &Profile) -> Result<RecommendationSet> {
        if profile.interests.is_empty() {
            tracing::warn!("Recommendation requested without any interests selected");
            return Err(AdvisorError::validation("interests", NO_INTERESTS_WARNING));
        }

        tracing::info!(
            model = %self.model,
            interests = profile.interests.len(),
            "Requesting course recommendations"
        );

        let request = self.build_request(profile);
        let response = self.tx.chat(&request).await?;

        let content = response.first_content().ok_or_else(|| {
            AdvisorError::Service("Completion service returned no content".to_string())
        })?;

        let set = parse_recommendations(content)?;
        tracing::info!(
            courses = set.courses.len(),
            related_areas = set.related_areas.len(),
            "Parsed course recommendations"
        );
        Ok(set)
    }
}

#[derive(Debug, Deserialize)]
struct RawReply {
    recommended_courses: Vec<RawCourse>,
    #[serde(default)]
    related_areas: Option<Value>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawCourse {
    title: Option<Value>,
    category: Option<Value>,
    #[serde(alias = "target")]
    target_audience: Option<Value>,
    format: Option<Value>,
    duration: Option<Value>,
    credits: Option<Value>,
    description: Option<Value>,
    benefits: Option<Value>,
    recommendation_reason: Option<Value>,
    practical_application: Option<Value>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawRelatedArea {
    area: Option<Value>,
    relevance: Option<Value>,
    benefits: Option<Value>,
}

impl From<RawCourse> for RecommendationItem {
    fn from(raw: RawCourse) -> Self {
        Self {
            title: text_or(raw.title, MISSING_TEXT),
            category: text_or(raw.category, MISSING_TEXT),
            target_audience: text_or(raw.target_audience, MISSING_DETAIL),
            format: text_or(raw.format, MISSING_DETAIL),
            duration: text_or(raw.duration, MISSING_DETAIL),
            credits: text_or(raw.credits, MISSING_DETAIL),
            description: text_or(raw.description, MISSING_TEXT),
            benefits: text_or(raw.benefits, MISSING_TEXT),
            recommendation_reason: text_or(raw.recommendation_reason, MISSING_TEXT),
            practical_application: text_or(raw.practical_application, MISSING_TEXT),
        }
    }
}

impl From<RawRelatedArea> for RelatedArea {
    fn from(raw: RawRelatedArea) -> Self {
        Self {
            area: text_or(raw.area, MISSING_TEXT),
            relevance: text_or(raw.relevance, MISSING_TEXT),
            benefits: text_or(raw.benefits, MISSING_TEXT),
        }
    }
}

/// Renders a loosely typed JSON value as display text; null, blank or absent become `placeholder`.
fn text_or(value: Option<Value>, placeholder: &str) -> String {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Array(items)) if !items.is_empty() => items
            .into_iter()
            .map(|v| match v {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Some(obj @ Value::Object(_)) => obj.to_string(),
        _ => placeholder.to_string(),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
        if let Some(inner) = rest.trim_end().strip_suffix("```") {
            return inner.trim();
        }
    }
    trimmed
}

/// Parses the model's reply against the recommendation schema.
///
/// The number of courses is whatever the reply contains; the prompt asks for three
/// but that is not enforced here.
pub fn parse_recommendations(content: &str) -> Result<RecommendationSet> {
    let json = strip_code_fence(content);
    let raw: RawReply = serde_json::from_str(json).map_err(|e| {
        tracing::warn!("Recommendation reply did not match schema: {e}");
        AdvisorError::Parse(format!("{e}. Raw: {content}"))
    })?;

    Ok(RecommendationSet {
        courses: raw.recommended_courses.into_iter().map(Into::into).collect(),
        related_areas: related_areas(raw.related_areas),
    })
}

/// Related areas are supplementary: anything other than a list of objects is dropped.
fn related_areas(value: Option<Value>) -> Vec<RelatedArea> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<RawRelatedArea>(item).ok())
        .map(Into::into)
        .collect()
}
