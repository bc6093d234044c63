//! Non-interactive mode: print the single best completion.
//!
//! This is the shell-keybinding entry point. The zsh widget replaces
//! `$BUFFER` with whatever lands on stdout, so the output is exactly one
//! suggestion or nothing.

use std::sync::Arc;

use ghosttype_core::Ensemble;

pub async fn run(engine: Arc<Ensemble>, prefix: &str) -> anyhow::Result<()> {
    let results = engine.predict(prefix).await;
    if let Some(top) = results.first() {
        println!("{}", top.text);
    }
    Ok(())
}
