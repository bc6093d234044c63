//! Terminal lifecycle for the interactive session.
//!
//! Raw mode and the alternate screen are tied to a [`TerminalSession`]
//! guard: entering takes the terminal over, dropping hands it back, so
//! every return path out of the event loop restores the shell. Panics are
//! the one path a guard cannot cover cleanly — unwinding would print the
//! panic message into the alternate screen and then erase it with the
//! screen switch. The hook installed by [`TerminalSession::enter`] records
//! the panic in the session log first (stderr is invisible while the
//! alternate screen is up, the log file in the cache directory is not),
//! releases the terminal, and only then lets the default handler print.

use std::io::{self, Stdout};
use std::panic;
use std::sync::Once;

use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

pub type GhostTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Owns the terminal for the duration of one TUI session.
pub struct TerminalSession {
    terminal: GhostTerminal,
}

impl TerminalSession {
    /// Switch the terminal into raw mode on the alternate screen and
    /// install the crash-logging panic hook.
    pub fn enter() -> io::Result<Self> {
        install_panic_hook();
        enable_raw_mode()?;
        io::stdout().execute(EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        Ok(Self { terminal })
    }

    /// The terminal to draw on.
    pub fn terminal_mut(&mut self) -> &mut GhostTerminal {
        &mut self.terminal
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        release_terminal();
    }
}

/// Best-effort return to cooked mode on the main screen. Failures are
/// ignored; there is nowhere useful left to report them.
fn release_terminal() {
    let _ = disable_raw_mode();
    let _ = io::stdout().execute(LeaveAlternateScreen);
}

/// Chain a hook in front of the default panic handler. `Once` keeps
/// repeated sessions in one process from stacking hooks.
fn install_panic_hook() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let default_hook = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            tracing::error!(panic = %info, "tui session crashed, releasing terminal");
            release_terminal();
            default_hook(info);
        }));
    });
}
