use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::chat::{ChatStore, ThreadId};
use crate::config::Config;
use crate::export::{self, ExportFormat};
use crate::notify::{Notification, Notifications};
use crate::pipeline::{self, PendingSend, SendOutcome, SendState, SendStatus};

const HISTORY_LIMIT: usize = 50;
const SCROLL_STEP: u16 = 3;

/// Text being typed plus previously submitted inputs
#[derive(Debug, Default)]
pub struct Composer {
    input: String,
    history: Vec<String>,
    history_index: usize,
}

impl Composer {
    pub fn input(&self) -> &str {
        &self.input
    }

    fn push_char(&mut self, c: char) {
        self.input.push(c);
    }

    fn backspace(&mut self) {
        self.input.pop();
    }

    /// Take the current input, remembering it for recall
    fn take(&mut self) -> String {
        let input = std::mem::take(&mut self.input);
        self.history.push(input.clone());
        if self.history.len() > HISTORY_LIMIT {
            self.history.remove(0);
        }
        self.history_index = self.history.len();
        input
    }

    fn recall_previous(&mut self) {
        if self.history.is_empty() {
            return;
        }
        if self.history_index > 0 {
            self.history_index -= 1;
            self.input = self.history[self.history_index].clone();
        }
    }

    fn recall_next(&mut self) {
        if self.history.is_empty() {
            return;
        }
        if self.history_index + 1 < self.history.len() {
            self.history_index += 1;
            self.input = self.history[self.history_index].clone();
        } else {
            self.history_index = self.history.len();
            self.input.clear();
        }
    }
}

/// Every event the UI can raise
#[derive(Debug)]
pub enum Action {
    NewThread,
    SelectThread(ThreadId),
    SelectNext,
    SelectPrevious,
    DeleteSelected,
    DeleteThread(ThreadId),
    Input(char),
    Backspace,
    HistoryPrevious,
    HistoryNext,
    Submit,
    SendCompleted(SendOutcome),
    ToggleSidebar,
    Export(ExportFormat),
    ScrollUp,
    ScrollDown,
    /// Furthest the drawn conversation can scroll up
    ScrollLimit(u16),
    Tick,
}

/// Work the runtime must carry out on behalf of the state container
#[derive(Debug)]
pub enum Effect {
    Send(PendingSend),
}

/// Whole-application state, changed only through [`App::dispatch`]
pub struct App {
    store: ChatStore,
    composer: Composer,
    send_state: SendState,
    last_status: Option<SendStatus>,
    notifications: Notifications,
    sidebar_open: bool,
    /// Rows scrolled up from the bottom of the message pane
    scroll_back: u16,
    export_dir: PathBuf,
}

impl App {
    pub fn new(config: &Config) -> Self {
        Self {
            store: ChatStore::new(),
            composer: Composer::default(),
            send_state: SendState::Idle,
            last_status: None,
            notifications: Notifications::new(config.toast_ttl),
            sidebar_open: true,
            scroll_back: 0,
            export_dir: config.export_dir.clone(),
        }
    }

    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn send_state(&self) -> &SendState {
        &self.send_state
    }

    pub fn last_status(&self) -> Option<SendStatus> {
        self.last_status
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub fn scroll_back(&self) -> u16 {
        self.scroll_back
    }

    /// The composer accepts no input while a request is in flight
    pub fn composer_enabled(&self) -> bool {
        !self.send_state.is_sending()
    }

    pub fn dispatch(&mut self, action: Action) -> Option<Effect> {
        match action {
            Action::NewThread => {
                let id = self.store.create_thread();
                debug!(thread = %id, "thread created");
                self.scroll_back = 0;
            }
            Action::SelectThread(id) => {
                if let Err(err) = self.store.select_thread(&id) {
                    debug!(error = %err, "selection ignored");
                }
                self.scroll_back = 0;
            }
            Action::SelectNext => {
                self.store.select_next();
                self.scroll_back = 0;
            }
            Action::SelectPrevious => {
                self.store.select_previous();
                self.scroll_back = 0;
            }
            Action::DeleteSelected => {
                if let Some(id) = self.store.selected_id().map(str::to_string) {
                    self.delete(&id);
                }
            }
            Action::DeleteThread(id) => self.delete(&id),
            Action::Input(c) => {
                if self.composer_enabled() {
                    self.composer.push_char(c);
                }
            }
            Action::Backspace => {
                if self.composer_enabled() {
                    self.composer.backspace();
                }
            }
            Action::HistoryPrevious => {
                if self.composer_enabled() {
                    self.composer.recall_previous();
                }
            }
            Action::HistoryNext => {
                if self.composer_enabled() {
                    self.composer.recall_next();
                }
            }
            Action::Submit => return self.submit(),
            Action::SendCompleted(outcome) => {
                let on_screen = self.store.selected_id() == Some(outcome.thread_id.as_str());
                let status = pipeline::finish(
                    &mut self.store,
                    &mut self.send_state,
                    &mut self.notifications,
                    outcome,
                );
                self.last_status = Some(status);
                if on_screen {
                    self.scroll_back = 0;
                }
            }
            Action::ToggleSidebar => self.sidebar_open = !self.sidebar_open,
            Action::Export(format) => self.export(format),
            Action::ScrollUp => self.scroll_back = self.scroll_back.saturating_add(SCROLL_STEP),
            Action::ScrollDown => self.scroll_back = self.scroll_back.saturating_sub(SCROLL_STEP),
            Action::ScrollLimit(max) => self.scroll_back = self.scroll_back.min(max),
            Action::Tick => self.notifications.prune(Instant::now()),
        }
        None
    }

    fn submit(&mut self) -> Option<Effect> {
        let input = self.composer.input().to_string();
        let pending = pipeline::begin(&mut self.store, &mut self.send_state, &input)?;
        self.composer.take();
        self.scroll_back = 0;
        Some(Effect::Send(pending))
    }

    fn delete(&mut self, id: &str) {
        match self.store.delete_thread(id) {
            Ok(thread) => info!(thread = %thread.id(), "thread deleted"),
            Err(err) => debug!(error = %err, "delete ignored"),
        }
    }

    fn export(&mut self, format: ExportFormat) {
        let Some(thread) = self.store.selected() else {
            self.notifications
                .push(Notification::error("Nothing to export", "Select a chat first."));
            return;
        };

        match export::write_export(&self.export_dir, thread, format) {
            Ok(path) => {
                info!(path = %path.display(), "chat exported");
                self.notifications
                    .push(Notification::info("Exported", path.display().to_string()));
            }
            Err(err) => {
                warn!(error = %err, "export failed");
                self.notifications
                    .push(Notification::error("Export failed", format!("{:#}", err)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::interpret_response;
    use crate::notify::Level;
    use std::time::Duration;
    use tempfile::tempdir;

    fn config(export_dir: PathBuf) -> Config {
        Config {
            endpoint: "http://localhost:8080/api/chat".to_string(),
            export_dir,
            log_file: PathBuf::from("parley.log"),
            toast_ttl: Duration::from_secs(4),
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.dispatch(Action::Input(c));
        }
    }

    fn submit(app: &mut App, text: &str) -> anyhow::Result<PendingSend> {
        type_text(app, text);
        match app.dispatch(Action::Submit) {
            Some(Effect::Send(pending)) => Ok(pending),
            None => anyhow::bail!("submit produced no send"),
        }
    }

    fn reply(pending: &PendingSend, status: u16, body: &str) -> Action {
        Action::SendCompleted(SendOutcome {
            thread_id: pending.thread_id.clone(),
            result: interpret_response(status, body),
        })
    }

    #[test]
    fn test_submit_clears_composer_and_disables_it() -> anyhow::Result<()> {
        let mut app = App::new(&config(PathBuf::from(".")));
        submit(&mut app, "hello")?;

        assert_eq!(app.composer().input(), "");
        assert!(!app.composer_enabled());

        type_text(&mut app, "ignored");
        assert_eq!(app.composer().input(), "");
        Ok(())
    }

    #[test]
    fn test_blank_submit_does_nothing() {
        let mut app = App::new(&config(PathBuf::from(".")));
        type_text(&mut app, "   ");

        assert!(app.dispatch(Action::Submit).is_none());
        assert!(app.store().is_empty());
        assert_eq!(app.composer().input(), "   ");
    }

    #[test]
    fn test_full_round_trip_through_dispatch() -> anyhow::Result<()> {
        let mut app = App::new(&config(PathBuf::from(".")));
        let pending = submit(&mut app, "hello")?;

        app.dispatch(reply(&pending, 200, r#"{"message":"hi"}"#));

        assert_eq!(app.last_status(), Some(SendStatus::Succeeded));
        assert!(app.composer_enabled());
        let thread = app.store().selected().ok_or_else(|| anyhow::anyhow!("no selection"))?;
        assert_eq!(thread.messages().len(), 2);
        assert_eq!(thread.messages()[1].content(), "hi");
        Ok(())
    }

    #[test]
    fn test_failed_send_raises_error_toast() -> anyhow::Result<()> {
        let mut app = App::new(&config(PathBuf::from(".")));
        let pending = submit(&mut app, "hello")?;

        app.dispatch(reply(&pending, 500, r#"{"error":"boom"}"#));

        assert_eq!(app.last_status(), Some(SendStatus::Failed));
        let toast = app
            .notifications()
            .visible()
            .next()
            .ok_or_else(|| anyhow::anyhow!("no toast"))?;
        assert_eq!(toast.level, Level::Error);
        assert_eq!(toast.description, "boom");
        assert_eq!(app.store().selected().map(|t| t.messages().len()), Some(1));
        Ok(())
    }

    #[test]
    fn test_history_recall() -> anyhow::Result<()> {
        let mut app = App::new(&config(PathBuf::from(".")));
        let first = submit(&mut app, "first")?;
        app.dispatch(reply(&first, 200, r#"{"message":"ok"}"#));
        let second = submit(&mut app, "second")?;
        app.dispatch(reply(&second, 200, r#"{"message":"ok"}"#));

        app.dispatch(Action::HistoryPrevious);
        assert_eq!(app.composer().input(), "second");
        app.dispatch(Action::HistoryPrevious);
        assert_eq!(app.composer().input(), "first");
        app.dispatch(Action::HistoryNext);
        assert_eq!(app.composer().input(), "second");
        app.dispatch(Action::HistoryNext);
        assert_eq!(app.composer().input(), "");
        Ok(())
    }

    #[test]
    fn test_delete_selected_clears_selection() {
        let mut app = App::new(&config(PathBuf::from(".")));
        app.dispatch(Action::NewThread);
        app.dispatch(Action::NewThread);
        assert_eq!(app.store().len(), 2);

        app.dispatch(Action::DeleteSelected);
        assert_eq!(app.store().len(), 1);
        assert!(app.store().selected_id().is_none());
    }

    #[test]
    fn test_select_and_delete_by_id() {
        let mut app = App::new(&config(PathBuf::from(".")));
        app.dispatch(Action::NewThread);
        let older = app.store().selected_id().map(str::to_string).unwrap_or_default();
        app.dispatch(Action::NewThread);
        let newer = app.store().selected_id().map(str::to_string).unwrap_or_default();

        assert_ne!(older, newer);

        app.dispatch(Action::SelectThread(older.clone()));
        assert_eq!(app.store().selected_id(), Some(older.as_str()));

        app.dispatch(Action::SelectThread("unknown".to_string()));
        assert_eq!(app.store().selected_id(), Some(older.as_str()));

        app.dispatch(Action::DeleteThread(newer));
        assert_eq!(app.store().len(), 1);
        assert_eq!(app.store().selected_id(), Some(older.as_str()));
    }

    #[test]
    fn test_send_after_deleting_selection_opens_new_thread() -> anyhow::Result<()> {
        let mut app = App::new(&config(PathBuf::from(".")));
        app.dispatch(Action::NewThread);
        app.dispatch(Action::DeleteSelected);

        let pending = submit(&mut app, "fresh start")?;
        assert_eq!(app.store().len(), 1);
        assert_eq!(app.store().selected_id(), Some(pending.thread_id.as_str()));
        Ok(())
    }

    #[test]
    fn test_export_writes_file_and_confirms() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut app = App::new(&config(dir.path().to_path_buf()));
        let pending = submit(&mut app, "export me")?;
        app.dispatch(reply(&pending, 200, r#"{"message":"done"}"#));

        app.dispatch(Action::Export(ExportFormat::Json));
        app.dispatch(Action::Export(ExportFormat::Text));

        assert!(dir.path().join(format!("chat-{}.json", pending.thread_id)).exists());
        assert!(dir.path().join(format!("chat-{}.txt", pending.thread_id)).exists());
        let titles: Vec<_> = app.notifications().visible().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Exported", "Exported"]);

        drop(dir);
        Ok(())
    }

    #[test]
    fn test_export_without_selection_warns() {
        let mut app = App::new(&config(PathBuf::from(".")));
        app.dispatch(Action::Export(ExportFormat::Json));

        let levels: Vec<Level> = app.notifications().visible().map(|n| n.level).collect();
        assert_eq!(levels, vec![Level::Error]);
    }

    #[test]
    fn test_scroll_resets_on_thread_switch() {
        let mut app = App::new(&config(PathBuf::from(".")));
        app.dispatch(Action::NewThread);
        app.dispatch(Action::NewThread);
        app.dispatch(Action::ScrollUp);
        assert_eq!(app.scroll_back(), 3);

        app.dispatch(Action::SelectNext);
        assert_eq!(app.scroll_back(), 0);
    }

    #[test]
    fn test_scroll_back_is_clamped_to_content() {
        let mut app = App::new(&config(PathBuf::from(".")));
        for _ in 0..20 {
            app.dispatch(Action::ScrollUp);
        }
        assert_eq!(app.scroll_back(), 60);

        app.dispatch(Action::ScrollLimit(4));
        assert_eq!(app.scroll_back(), 4);

        // one step down moves the view right away
        app.dispatch(Action::ScrollDown);
        assert_eq!(app.scroll_back(), 1);

        app.dispatch(Action::ScrollLimit(10));
        assert_eq!(app.scroll_back(), 1);
    }
}
