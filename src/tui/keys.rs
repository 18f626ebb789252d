use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::Action;
use crate::export::ExportFormat;

/// Input mode for the TUI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug)]
pub enum KeyOutcome {
    Action(Action),
    Mode(InputMode),
    Quit,
    Ignored,
}

/// Translate a key press into what the event loop should do
pub fn map_key(mode: InputMode, key: KeyEvent) -> KeyOutcome {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyOutcome::Quit;
    }

    match key.code {
        KeyCode::PageUp => return KeyOutcome::Action(Action::ScrollUp),
        KeyCode::PageDown => return KeyOutcome::Action(Action::ScrollDown),
        _ => {}
    }

    match mode {
        InputMode::Normal => match key.code {
            KeyCode::Char('q') => KeyOutcome::Quit,
            KeyCode::Char('e') | KeyCode::Char('i') | KeyCode::Enter => {
                KeyOutcome::Mode(InputMode::Editing)
            }
            KeyCode::Char('n') => KeyOutcome::Action(Action::NewThread),
            KeyCode::Char('j') | KeyCode::Down => KeyOutcome::Action(Action::SelectNext),
            KeyCode::Char('k') | KeyCode::Up => KeyOutcome::Action(Action::SelectPrevious),
            KeyCode::Char('d') | KeyCode::Delete => KeyOutcome::Action(Action::DeleteSelected),
            KeyCode::Char('x') => KeyOutcome::Action(Action::Export(ExportFormat::Json)),
            KeyCode::Char('t') => KeyOutcome::Action(Action::Export(ExportFormat::Text)),
            KeyCode::Char('b') => KeyOutcome::Action(Action::ToggleSidebar),
            _ => KeyOutcome::Ignored,
        },
        InputMode::Editing => match key.code {
            KeyCode::Enter => KeyOutcome::Action(Action::Submit),
            KeyCode::Esc => KeyOutcome::Mode(InputMode::Normal),
            KeyCode::Char(c) => KeyOutcome::Action(Action::Input(c)),
            KeyCode::Backspace => KeyOutcome::Action(Action::Backspace),
            KeyCode::Up => KeyOutcome::Action(Action::HistoryPrevious),
            KeyCode::Down => KeyOutcome::Action(Action::HistoryNext),
            _ => KeyOutcome::Ignored,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_ctrl_c_quits_in_any_mode() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(matches!(map_key(InputMode::Editing, key), KeyOutcome::Quit));
        assert!(matches!(map_key(InputMode::Normal, key), KeyOutcome::Quit));
    }

    #[test]
    fn test_letters_type_while_editing() {
        assert!(matches!(
            map_key(InputMode::Editing, press(KeyCode::Char('q'))),
            KeyOutcome::Action(Action::Input('q'))
        ));
        assert!(matches!(
            map_key(InputMode::Editing, press(KeyCode::Enter)),
            KeyOutcome::Action(Action::Submit)
        ));
    }

    #[test]
    fn test_normal_mode_commands() {
        assert!(matches!(map_key(InputMode::Normal, press(KeyCode::Char('q'))), KeyOutcome::Quit));
        assert!(matches!(
            map_key(InputMode::Normal, press(KeyCode::Char('n'))),
            KeyOutcome::Action(Action::NewThread)
        ));
        assert!(matches!(
            map_key(InputMode::Normal, press(KeyCode::Char('x'))),
            KeyOutcome::Action(Action::Export(ExportFormat::Json))
        ));
        assert!(matches!(
            map_key(InputMode::Normal, press(KeyCode::Char('t'))),
            KeyOutcome::Action(Action::Export(ExportFormat::Text))
        ));
        assert!(matches!(
            map_key(InputMode::Normal, press(KeyCode::Char('e'))),
            KeyOutcome::Mode(InputMode::Editing)
        ));
    }

    #[test]
    fn test_escape_leaves_editing() {
        assert!(matches!(
            map_key(InputMode::Editing, press(KeyCode::Esc)),
            KeyOutcome::Mode(InputMode::Normal)
        ));
    }
}
