use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::error::{AdvisorError, Result};
use crate::prompt::PromptVariant;
use crate::session::RecommendationFailurePolicy;
use crate::transport::OPENAI_BASE_URL;

const PLACEHOLDER_API_KEY: &str = "PLACEHOLDER_OPENAI_API_KEY";

/// Main configuration structure for the course advisor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub openai: OpenAIConfig,
    #[serde(default)]
    pub advisor: AdvisorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP API binds to
    pub bind: String,
    /// Optional bearer token required on every route except /health
    pub bearer_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    /// Overrides the variant's default model when set
    pub model: Option<String>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AdvisorConfig {
    pub variant: PromptVariant,
    pub on_recommendation_failure: RecommendationFailurePolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8501".to_string(),
            bearer_token: None,
        }
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: env::var("OPENAI_API_KEY").unwrap_or_else(|_| {
                tracing::warn!("OPENAI_API_KEY not set, using placeholder");
                PLACEHOLDER_API_KEY.to_string()
            }),
            base_url: OPENAI_BASE_URL.to_string(),
            model: None,
            temperature: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            openai: OpenAIConfig::default(),
            advisor: AdvisorConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment variable overrides
    /// ALWAYS returns a config - a missing API key is reported by `api_key()`
    pub fn load() -> Self {
        let env_paths = ["../.env", ".env"];

        let mut env_loaded = false;
        for path in &env_paths {
            if dotenvy::from_path(path).is_ok() {
                tracing::info!("Loaded .env from: {}", path);
                env_loaded = true;
                break;
            }
        }

        if !env_loaded {
            tracing::warn!("No .env file found - continuing with env vars only");
        }

        let config_path =
            env::var("ADVISOR_CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            match fs::read_to_string(&config_path) {
                Ok(contents) => match Self::from_yaml(&contents) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from {}", config_path);
                        config
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to parse config file {}: {} - using defaults",
                            config_path,
                            e
                        );
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::error!(
                        "Failed to read config file {}: {} - using defaults",
                        config_path,
                        e
                    );
                    Self::default()
                }
            }
        } else {
            tracing::warn!("Config file not found at {} - using defaults", config_path);
            Self::default()
        };

        config.apply_env_overrides();

        if let Err(e) = config.validate() {
            tracing::warn!("Config validation warnings: {} - continuing anyway", e);
        }

        config
    }

    pub fn from_yaml(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Server overrides
        if let Some(bind) = lookup("ADVISOR_HTTP_BIND") {
            self.server.bind = bind;
        }
        if let Some(token) = lookup("ADVISOR_BEARER_TOKEN") {
            self.server.bearer_token = Some(token).filter(|t| !t.is_empty());
        }

        // Completion service overrides
        if let Some(api_key) = lookup("OPENAI_API_KEY") {
            self.openai.api_key = api_key;
        }
        if let Some(base_url) = lookup("OPENAI_BASE_URL") {
            self.openai.base_url = base_url;
        }
        if let Some(model) = lookup("ADVISOR_MODEL") {
            self.openai.model = Some(model).filter(|m| !m.is_empty());
        }
        if let Some(temperature) = lookup("ADVISOR_TEMPERATURE") {
            if let Ok(t) = temperature.parse() {
                self.openai.temperature = Some(t);
            }
        }

        // Advisor behaviour overrides
        if let Some(variant) = lookup("ADVISOR_VARIANT") {
            match PromptVariant::parse(&variant) {
                Some(v) => self.advisor.variant = v,
                None => tracing::warn!("Unknown ADVISOR_VARIANT '{}', keeping {:?}", variant, self.advisor.variant),
            }
        }
        if let Some(policy) = lookup("ADVISOR_ON_FAILURE") {
            match RecommendationFailurePolicy::parse(&policy) {
                Some(p) => self.advisor.on_recommendation_failure = p,
                None => tracing::warn!(
                    "Unknown ADVISOR_ON_FAILURE '{}', keeping {:?}",
                    policy,
                    self.advisor.on_recommendation_failure
                ),
            }
        }
    }

    /// Validate configuration
    fn validate(&self) -> std::result::Result<(), Box<dyn std::error::Error>> {
        if let Some(t) = self.openai.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err("openai.temperature must be between 0.0 and 2.0".into());
            }
        }
        if self.openai.base_url.trim().is_empty() {
            return Err("openai.base_url cannot be empty".into());
        }
        if self.api_key().is_err() {
            return Err("OPENAI_API_KEY environment variable must be set".into());
        }
        Ok(())
    }

    /// The completion API key. Absence is fatal for the binaries.
    pub fn api_key(&self) -> Result<&str> {
        let key = self.openai.api_key.trim();
        if key.is_empty() || key == PLACEHOLDER_API_KEY {
            return Err(AdvisorError::Config(
                "OPENAI_API_KEY is not configured; set it in the environment or a .env file"
                    .to_string(),
            ));
        }
        Ok(key)
    }

    /// Model to request: explicit override, else the variant's default.
    pub fn model(&self) -> String {
        self.openai
            .model
            .clone()
            .unwrap_or_else(|| self.advisor.variant.default_model().to_string())
    }
}
