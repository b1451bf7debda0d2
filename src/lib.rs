pub mod catalog;
pub mod chat;
pub mod config;
pub mod error;
pub mod models;
pub mod profile;
pub mod prompt;
pub mod recommend;
pub mod render;
pub mod server;
pub mod session;
pub mod transport;

use std::sync::Arc;

use crate::chat::{ChatResponder, CounselChat};
use crate::config::Config;
use crate::error::Result;
use crate::prompt::PromptTemplate;
use crate::recommend::{CourseRecommender, Recommender};
use crate::session::SessionStore;
use crate::transport::{OpenAiTransport, Transport};

/// Wires the requesters to a transport and owns the session registry.
pub struct AdvisorService {
    pub recommender: Arc<dyn Recommender>,
    pub chat: Arc<dyn ChatResponder>,
    pub sessions: SessionStore,
}

impl AdvisorService {
    /// Fails when the API key is missing.
    pub fn new(cfg: &Config) -> Result<Self> {
        let transport = Arc::new(OpenAiTransport::new(
            cfg.api_key()?.to_string(),
            &cfg.openai.base_url,
        )?);
        Ok(Self::with_transport(cfg, transport))
    }

    pub fn with_transport(cfg: &Config, transport: Arc<dyn Transport>) -> Self {
        let template = PromptTemplate::new(cfg.advisor.variant);
        let model = cfg.model();

        let recommender = CourseRecommender::new(Arc::clone(&transport), model.clone(), template)
            .with_temperature(cfg.openai.temperature);
        let chat = CounselChat::new(Arc::clone(&transport), model, template)
            .with_temperature(cfg.openai.temperature);

        tracing::info!(
            variant = ?cfg.advisor.variant,
            model = %cfg.model(),
            on_failure = ?cfg.advisor.on_recommendation_failure,
            "Advisor service configured"
        );

        Self {
            recommender: Arc::new(recommender),
            chat: Arc::new(chat),
            sessions: SessionStore::new(cfg.advisor.on_recommendation_failure),
        }
    }
}
