use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One course suggestion restated from the model's JSON reply.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RecommendationItem {
    pub title: String,
    pub category: String,
    pub target_audience: String,
    pub format: String,
    pub duration: String,
    pub credits: String,
    pub description: String,
    pub benefits: String,
    pub recommendation_reason: String,
    pub practical_application: String,
}

/// A neighbouring field worth exploring, suggested alongside the courses.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RelatedArea {
    pub area: String,
    pub relevance: String,
    pub benefits: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct RecommendationSet {
    pub courses: Vec<RecommendationItem>,
    #[serde(default)]
    pub related_areas: Vec<RelatedArea>,
}

impl RecommendationSet {
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty() && self.related_areas.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// Append-only log of the session's chat, oldest first.
#[derive(Debug, Serialize, Clone, Default)]
#[serde(transparent)]
pub struct ChatHistory(Vec<ChatMessage>);

impl ChatHistory {
    pub fn push(&mut self, message: ChatMessage) {
        self.0.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Completion API message format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApiMessage {
    pub role: String,
    pub content: String,
}

impl ApiMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

// Completion API request format
#[derive(Debug, Serialize, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<serde_json::Value>,
}

// Completion API response format
#[derive(Debug, Deserialize, Clone)]
pub struct CompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Choice {
    pub message: ReplyMessage,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplyMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl CompletionResponse {
    /// Convenience constructor for a single-choice reply.
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice {
                message: ReplyMessage {
                    role: Some("assistant".to_string()),
                    content: Some(content.into()),
                },
            }],
        }
    }

    /// Text of the first choice; `None` when there are no choices or the content is null.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}
