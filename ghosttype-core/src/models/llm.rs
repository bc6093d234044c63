//! Completion candidates generated by the local LLM.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ModelError;
use crate::ollama::ModelClient;
use crate::suggest::{SuggestModel, Suggestion};

pub const LLM_WEIGHT: f64 = 0.5;

/// Candidates requested per prediction.
pub const LLM_CANDIDATES: usize = 5;

pub struct LlmModel {
    client: Arc<dyn ModelClient>,
}

impl LlmModel {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }
}

fn build_prompt(input: &str) -> String {
    format!(
        "You are a command-line autocomplete engine.\n\
         Given a partial shell command, return exactly {LLM_CANDIDATES} likely completions.\n\
         Respond with each candidate on its own line. Do not add explanations or examples.\n\
         Respond with only raw shell commands. No markdown, no numbers, no quotes.\n\
         Only output valid commands. Do not invent new ones.\n\
         \n\
         Prefix: \"{input}\"\n\
         \n\
         Output:\n"
    )
}

/// Split the raw model output into one suggestion per non-empty line.
fn parse_response(response: &str) -> Vec<Suggestion> {
    response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Suggestion::new(line, 1.0, "llm"))
        .collect()
}

#[async_trait]
impl SuggestModel for LlmModel {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn learn(&self, _entries: &[String]) -> Result<(), ModelError> {
        // Generation only; nothing to learn.
        Ok(())
    }

    async fn predict(&self, input: &str) -> Result<Vec<Suggestion>, ModelError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let response = match self.client.generate(&build_prompt(input)).await {
            Ok(response) => response,
            Err(e) => {
                debug!(model = "llm", error = %e, "generate failed, returning empty");
                return Ok(Vec::new());
            }
        };

        Ok(parse_response(&response))
    }

    fn weight(&self) -> f64 {
        LLM_WEIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ollama::mock::StaticClient;

    #[test]
    fn prompt_embeds_prefix_and_candidate_count() {
        let prompt = build_prompt("git ch");
        assert!(prompt.contains("exactly 5 likely completions"));
        assert!(prompt.contains("Prefix: \"git ch\""));
    }

    #[test]
    fn parse_response_splits_and_trims_lines() {
        let suggestions = parse_response("git checkout main\n  git cherry-pick HEAD  \n\n");
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].text, "git checkout main");
        assert_eq!(suggestions[1].text, "git cherry-pick HEAD");
        assert!(suggestions.iter().all(|s| s.score == 1.0));
        assert!(suggestions.iter().all(|s| s.source == "llm"));
    }

    #[tokio::test]
    async fn predict_uses_generated_lines() {
        let client = Arc::new(StaticClient::new("git status\ngit stash\n"));
        let model = LlmModel::new(client);

        let results = model.predict("git st").await.unwrap();
        let texts: Vec<_> = results.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["git status", "git stash"]);
    }

    #[tokio::test]
    async fn predict_swallows_network_errors() {
        let model = LlmModel::new(Arc::new(StaticClient::unavailable()));
        assert!(model.predict("git").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_input_skips_the_network() {
        let client = Arc::new(StaticClient::new("anything"));
        let model = LlmModel::new(client.clone());
        assert!(model.predict("   ").await.unwrap().is_empty());
        assert_eq!(client.generate_calls(), 0);
    }
}
