//! The seven predictors.
//!
//! Each implements [`crate::SuggestModel`] and stamps its own source tag.
//! Light predictors (`prefix`, `freq`, `markov`, `alias`, `context`) answer
//! from local state within the light deadline; heavy predictors
//! (`embedding`, `llm`) reach the external model service and are bounded
//! by the global suggestion budget.

pub mod alias;
pub mod context;
pub mod embedding;
pub mod freq;
pub mod llm;
pub mod markov;
pub mod prefix;

pub use alias::AliasModel;
pub use context::ContextModel;
pub use embedding::EmbeddingModel;
pub use freq::FreqModel;
pub use llm::LlmModel;
pub use markov::MarkovModel;
pub use prefix::PrefixModel;
