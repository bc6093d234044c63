//! ghosttype-core: the suggestion engine behind the ghosttype CLI.
//!
//! Given a partial command (the "prefix"), the engine fans out to a set of
//! heterogeneous predictors, merges their weighted scores and returns a
//! ranked list of full-command suggestions. Results arrive in two tiers:
//! fast local predictors first, network-backed predictors second.
//!
//! - **Store** - [`store::SqliteStore`] owns all durable state: command
//!   history with an FTS projection, shell aliases, source watermarks and
//!   embedding vectors.
//! - **History** - [`history`] parses shell history files and feeds the
//!   store through the background [`worker`]s.
//! - **Models** - the seven predictors in [`models`], all implementing
//!   [`SuggestModel`].
//! - **Ensemble** - [`ensemble::Ensemble`] schedules predictors under the
//!   light/heavy deadlines and merges their output.
//! - **Session** - [`session::SessionDriver`] tracks the live prefix and
//!   merges the two tiers for display.
//!
//! ```text
//! keystroke ──▶ SessionDriver ──▶ Ensemble ──┬─▶ light models (≤100ms) ──▶ tier 1
//!                                            └─▶ heavy models (≤2s)    ──▶ tier 2
//!                    ▲                                   │
//!                    └────────── merged view ◀───────────┘
//! ```

pub mod config;
pub mod engine;
pub mod ensemble;
pub mod error;
pub mod history;
pub mod models;
pub mod ollama;
pub mod project;
pub mod session;
pub mod shellrc;
pub mod store;
pub mod suggest;
pub mod worker;

pub use config::ModelServiceConfig;
pub use engine::{build_engine, EngineOptions, ModelInitEvent, ModelStatus};
pub use ensemble::{Ensemble, Tier, TierUpdate, LIGHT_TIMEOUT, SUGGESTION_TIMEOUT};
pub use error::{ClientError, GhosttypeError, ModelError, WorkerError};
pub use ollama::{ModelClient, OllamaClient};
pub use session::SessionDriver;
pub use store::{SqliteStore, StoreError, EMBEDDING_DIM};
pub use suggest::{Suggestion, SuggestModel};
