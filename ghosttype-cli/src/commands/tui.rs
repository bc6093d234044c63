//! `ghosttype tui` entry point.

use std::sync::Arc;

use ghosttype_core::Ensemble;

use crate::tui::app::App;
use crate::tui::terminal::TerminalSession;

pub async fn run(engine: Arc<Ensemble>, initial: String) -> anyhow::Result<()> {
    let mut session = TerminalSession::enter()?;

    let mut app = App::new(engine, initial);
    let result = app.event_loop(session.terminal_mut()).await;

    // Leave the alternate screen before touching stdout, so the shell
    // integration captures the selection and nothing else.
    drop(session);
    result?;

    if let Some(selected) = app.selected() {
        println!("{selected}");
    }
    Ok(())
}
