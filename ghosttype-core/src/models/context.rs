//! Project-context completion from build metadata.

use std::path::Path;

use async_trait::async_trait;

use crate::error::ModelError;
use crate::project;
use crate::suggest::{SuggestModel, Suggestion};

pub const CONTEXT_WEIGHT: f64 = 1.0;

/// Suggests runnable targets (`npm run ...`, `make ...`, `mvn ...`)
/// discovered in the project root at construction time.
pub struct ContextModel {
    commands: Vec<String>,
}

impl ContextModel {
    /// Scan `root` once; the command set is static for the session.
    pub fn from_dir(root: &Path) -> Self {
        Self {
            commands: project::project_commands(root),
        }
    }
}

#[async_trait]
impl SuggestModel for ContextModel {
    fn name(&self) -> &'static str {
        "context"
    }

    async fn learn(&self, _entries: &[String]) -> Result<(), ModelError> {
        Ok(())
    }

    async fn predict(&self, input: &str) -> Result<Vec<Suggestion>, ModelError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(input))
            .map(|cmd| Suggestion::new(cmd.clone(), 1.0, "context"))
            .collect())
    }

    fn weight(&self) -> f64 {
        CONTEXT_WEIGHT
    }
}
