use async_trait::async_trait;
use chrono::Local;
use std::sync::Arc;

use crate::error::{AdvisorError, Result};
use crate::models::{ApiMessage, CompletionRequest, RecommendationSet};
use crate::profile::Profile;
use crate::prompt::{PromptKind, PromptTemplate};
use crate::transport::Transport;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatResponder: Send + Sync {
    /// Produces the assistant's answer to one question. Prior turns are not sent.
    async fn reply(
        &self,
        question: &str,
        profile: &Profile,
        recommendations: &RecommendationSet,
    ) -> Result<String>;
}

pub struct CounselChat {
    tx: Arc<dyn Transport>,
    model: String,
    template: PromptTemplate,
    temperature: Option<f32>,
}

impl CounselChat {
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
}

#[async_trait]
impl ChatResponder for CounselChat {
    async fn reply(
        &self,
        question: &str,
        profile: &Profile,
        recommendations: &RecommendationSet,
    ) -> Result<String> {
        tracing::info!(model = %self.model, "Answering counselling question");

        let prompt = self.template.render(
            profile,
            PromptKind::Chat {
                question,
                recommendations,
            },
            Local::now().date_naive(),
        );

        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![ApiMessage::system(prompt)],
            temperature: self.temperature,
            response_format: None,
        };

        let response = self.tx.chat(&request).await?;

        match response.first_content() {
            Some(content) if !content.trim().is_empty() => Ok(content.trim().to_string()),
            _ => Err(AdvisorError::Service(
                "Completion service returned an empty answer".to_string(),
            )),
        }
    }
}
