//! The interactive suggestion session.
//!
//! Owns a [`SessionDriver`] and re-launches a progressive prediction on
//! every prefix change. Emissions come back through an mpsc channel tagged
//! with the generation they were requested under; anything stale is
//! dropped by the driver before it can reach the screen.

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use ghosttype_core::ensemble::TierUpdate;
use ghosttype_core::{Ensemble, SessionDriver, Suggestion};

use super::terminal::GhostTerminal;

/// How long one render/input cycle waits for a key.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A tier emission tagged with the generation it was requested under.
struct SessionMsg {
    generation: u64,
    update: TierUpdate,
}

pub struct App {
    engine: Arc<Ensemble>,
    driver: SessionDriver,
    input: String,
    merged: Vec<Suggestion>,
    list_state: ListState,
    selected: Option<String>,
    running: bool,
    updates_tx: mpsc::Sender<SessionMsg>,
    updates_rx: mpsc::Receiver<SessionMsg>,
    inflight: Option<JoinHandle<()>>,
}

impl App {
    pub fn new(engine: Arc<Ensemble>, initial: String) -> Self {
        let (updates_tx, updates_rx) = mpsc::channel(8);
        Self {
            engine,
            driver: SessionDriver::new(),
            input: initial,
            merged: Vec::new(),
            list_state: ListState::default(),
            selected: None,
            running: true,
            updates_tx,
            updates_rx,
            inflight: None,
        }
    }

    /// The text chosen with Enter, if any.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub async fn event_loop(&mut self, terminal: &mut GhostTerminal) -> anyhow::Result<()> {
        self.sync_input();
        while self.running {
            terminal.draw(|f| self.render(f))?;

            if event::poll(POLL_INTERVAL)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }

            self.sync_input();
            self.tick();
        }
        Ok(())
    }

    /// Relaunch the prediction when the prefix changed. The previous
    /// in-flight request is aborted; dropping its stream cancels the
    /// predictor tasks it spawned.
    fn sync_input(&mut self) {
        let Some(change) = self.driver.set_input(&self.input) else {
            return;
        };

        if let Some(task) = self.inflight.take() {
            task.abort();
        }
        self.merged.clear();
        self.list_state.select(None);

        if change.prefix.is_empty() {
            return;
        }

        let engine = self.engine.clone();
        let tx = self.updates_tx.clone();
        self.inflight = Some(tokio::spawn(async move {
            let mut rx = engine.progressive_predict(&change.prefix);
            while let Some(update) = rx.recv().await {
                let msg = SessionMsg {
                    generation: change.generation,
                    update,
                };
                if tx.send(msg).await.is_err() {
                    break;
                }
            }
        }));
    }

    /// Apply any tier emissions that arrived since the last cycle.
    fn tick(&mut self) {
        let mut changed = false;
        while let Ok(msg) = self.updates_rx.try_recv() {
            if self.driver.accept(msg.generation, msg.update) {
                changed = true;
            }
        }
        if changed {
            self.merged = self.driver.merged();
            self.list_state
                .select(if self.merged.is_empty() { None } else { Some(0) });
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.running = false;
            }
            KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Enter => {
                if let Some(index) = self.list_state.selected() {
                    if let Some(suggestion) = self.merged.get(index) {
                        self.selected = Some(suggestion.text.clone());
                    }
                }
                self.running = false;
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => {
                self.input.push(c);
            }
            _ => {}
        }
    }

    fn move_selection(&mut self, delta: i64) {
        if self.merged.is_empty() {
            return;
        }
        let current = self.list_state.selected().unwrap_or(0) as i64;
        let last = self.merged.len() as i64 - 1;
        let next = (current + delta).clamp(0, last);
        self.list_state.select(Some(next as usize));
    }

    fn render(&mut self, frame: &mut Frame) {
        let [input_area, list_area, help_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let input = Paragraph::new(self.input.as_str())
            .block(Block::default().borders(Borders::ALL).title("ghosttype"));
        frame.render_widget(input, input_area);

        let items: Vec<ListItem> = self
            .merged
            .iter()
            .map(|s| ListItem::new(Line::from(s.text.clone())))
            .collect();
        let list = List::new(items)
            .highlight_style(
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, list_area, &mut self.list_state);

        let help = Paragraph::new("enter: accept   esc: quit").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, help_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        App::new(Arc::new(Ensemble::new(Vec::new())), String::new())
    }

    #[tokio::test]
    async fn typing_updates_the_input() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('g')));
        app.handle_key(key(KeyCode::Char('i')));
        app.handle_key(key(KeyCode::Char('t')));
        assert_eq!(app.input, "git");

        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.input, "gi");
    }

    #[tokio::test]
    async fn escape_quits_without_selection() {
        let mut app = app();
        app.handle_key(key(KeyCode::Esc));
        assert!(!app.running);
        assert!(app.selected().is_none());
    }

    #[tokio::test]
    async fn enter_picks_the_highlighted_suggestion() {
        let mut app = app();
        app.merged = vec![
            Suggestion::new("git push", 2.0, ""),
            Suggestion::new("git pull", 1.0, ""),
        ];
        app.list_state.select(Some(1));

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.selected(), Some("git pull"));
        assert!(!app.running);
    }

    #[tokio::test]
    async fn selection_movement_is_clamped() {
        let mut app = app();
        app.merged = vec![
            Suggestion::new("one", 1.0, ""),
            Suggestion::new("two", 1.0, ""),
        ];
        app.list_state.select(Some(0));

        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.list_state.selected(), Some(0));

        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.list_state.selected(), Some(1));
    }

    #[tokio::test]
    async fn stale_emissions_never_reach_the_screen() {
        let mut app = app();
        app.input = "git".to_string();
        app.sync_input();
        let old_generation = app.driver.generation();

        app.input = "git p".to_string();
        app.sync_input();

        app.updates_tx
            .try_send(SessionMsg {
                generation: old_generation,
                update: TierUpdate {
                    tier: ghosttype_core::Tier::Light,
                    suggestions: vec![Suggestion::new("git status", 1.0, "")],
                },
            })
            .unwrap();
        app.tick();
        assert!(app.merged.is_empty());
    }
}
