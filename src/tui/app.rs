use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::info;

use crate::app::{Action, App, Effect};
use crate::completion::{CompletionClient, HttpCompletionClient};
use crate::config::Config;
use crate::pipeline::{self, SendOutcome};
use crate::tui::{
    keys::{map_key, InputMode, KeyOutcome},
    terminal::{self, Tui},
    ui::{render_ui, DrawnLayout},
};

/// TUI-specific state
struct TuiState {
    input_mode: InputMode,
    last_tick: Instant,
}

impl Default for TuiState {
    fn default() -> Self {
        Self {
            input_mode: InputMode::Editing, // Start in editing mode
            last_tick: Instant::now(),
        }
    }
}

/// Run the TUI application
pub async fn run(config: Config) -> Result<()> {
    let client: Arc<dyn CompletionClient> = Arc::new(HttpCompletionClient::new(config.endpoint.clone()));
    info!(endpoint = %config.endpoint, "starting chat ui");

    terminal::install_panic_hook();
    let mut terminal = terminal::setup()?;

    let mut app = App::new(&config);
    let mut state = TuiState::default();

    let tick_rate = Duration::from_millis(100);
    let result = run_app(&mut terminal, &mut app, &mut state, client, tick_rate).await;

    terminal::restore(&mut terminal)?;

    result
}

/// Main application loop
async fn run_app(
    terminal: &mut Tui,
    app: &mut App,
    state: &mut TuiState,
    client: Arc<dyn CompletionClient>,
    tick_rate: Duration,
) -> Result<()> {
    let (tx, mut rx): (UnboundedSender<SendOutcome>, UnboundedReceiver<SendOutcome>) =
        mpsc::unbounded_channel();

    loop {
        let mut layout = DrawnLayout::default();
        terminal.draw(|f| layout = render_ui(f, app, state.input_mode))?;
        app.dispatch(Action::ScrollLimit(layout.max_scroll_back));

        let timeout = tick_rate
            .checked_sub(state.last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match map_key(state.input_mode, key) {
                    KeyOutcome::Quit => return Ok(()),
                    KeyOutcome::Mode(mode) => state.input_mode = mode,
                    KeyOutcome::Action(action) => {
                        if let Some(effect) = app.dispatch(action) {
                            run_effect(effect, &client, &tx);
                        }
                    }
                    KeyOutcome::Ignored => {}
                },
                Event::Mouse(mouse) => {
                    if let Some(action) = map_mouse(app, &layout, mouse) {
                        app.dispatch(action);
                    }
                }
                _ => {}
            }
        }

        // Replies land on the thread they were sent from
        while let Ok(outcome) = rx.try_recv() {
            app.dispatch(Action::SendCompleted(outcome));
        }

        if state.last_tick.elapsed() >= tick_rate {
            app.dispatch(Action::Tick);
            state.last_tick = Instant::now();
        }
    }
}

/// Clicks on the sidebar pick or delete a thread, the wheel scrolls the conversation
fn map_mouse(app: &App, layout: &DrawnLayout, mouse: MouseEvent) -> Option<Action> {
    let clicked = || {
        layout
            .thread_at(mouse.column, mouse.row)
            .and_then(|index| app.store().threads().get(index))
            .map(|thread| thread.id().to_string())
    };

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => clicked().map(Action::SelectThread),
        MouseEventKind::Down(MouseButton::Right) => clicked().map(Action::DeleteThread),
        MouseEventKind::ScrollUp => Some(Action::ScrollUp),
        MouseEventKind::ScrollDown => Some(Action::ScrollDown),
        _ => None,
    }
}

fn run_effect(effect: Effect, client: &Arc<dyn CompletionClient>, tx: &UnboundedSender<SendOutcome>) {
    match effect {
        Effect::Send(pending) => {
            pipeline::spawn(Arc::clone(client), pending, tx.clone());
        }
    }
}
