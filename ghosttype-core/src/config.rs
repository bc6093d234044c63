//! Model-service configuration.
//!
//! The defaults point at a local Ollama process; every field can be
//! overridden through the environment.

/// Default model service base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default generation model.
pub const DEFAULT_LLM_MODEL: &str = "llama3.2:1b";

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// Endpoint and model names for the external embedding/LLM service.
#[derive(Debug, Clone)]
pub struct ModelServiceConfig {
    pub base_url: String,
    pub llm_model: String,
    pub embedding_model: String,
}

impl Default for ModelServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }
}

impl ModelServiceConfig {
    /// Build a config from the environment, falling back to the defaults.
    ///
    /// Reads `GHOSTTYPE_OLLAMA_URL`, `GHOSTTYPE_LLM_MODEL` and
    /// `GHOSTTYPE_EMBED_MODEL`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("GHOSTTYPE_OLLAMA_URL").unwrap_or(defaults.base_url),
            llm_model: std::env::var("GHOSTTYPE_LLM_MODEL").unwrap_or(defaults.llm_model),
            embedding_model: std::env::var("GHOSTTYPE_EMBED_MODEL")
                .unwrap_or(defaults.embedding_model),
        }
    }
}
