//! Key and mouse bindings.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// Driver intent from a key press or click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Start,
    TogglePause,
    NextRound,
    ClearSelection,
    Restart,
    Quit,
    /// Left click at a terminal cell.
    Tap { column: u16, row: u16 },
    None,
}

/// Map a key event to an intent. Shift is tolerated; any other modifier except Ctrl+C is ignored.
pub fn key_to_intent(key: KeyEvent) -> Intent {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Intent::Quit;
    }
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Intent::None;
    }
    match code {
        KeyCode::Enter | KeyCode::Char(' ') => Intent::Start,
        KeyCode::Char('p' | 'P') => Intent::TogglePause,
        KeyCode::Char('n' | 'N') => Intent::NextRound,
        KeyCode::Esc | KeyCode::Char('c' | 'C') => Intent::ClearSelection,
        KeyCode::Char('r' | 'R') => Intent::Restart,
        KeyCode::Char('q' | 'Q') => Intent::Quit,
        _ => Intent::None,
    }
}

/// Only a left-button press counts as a tap.
pub fn mouse_to_intent(mouse: MouseEvent) -> Intent {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Intent::Tap {
            column: mouse.column,
            row: mouse.row,
        },
        _ => Intent::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn mouse(kind: MouseEventKind) -> MouseEvent {
        MouseEvent {
            kind,
            column: 12,
            row: 7,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn keys_map_to_intents() {
        let none = KeyModifiers::NONE;
        assert_eq!(key_to_intent(key(KeyCode::Enter, none)), Intent::Start);
        assert_eq!(key_to_intent(key(KeyCode::Char(' '), none)), Intent::Start);
        assert_eq!(key_to_intent(key(KeyCode::Char('p'), none)), Intent::TogglePause);
        assert_eq!(key_to_intent(key(KeyCode::Char('n'), none)), Intent::NextRound);
        assert_eq!(key_to_intent(key(KeyCode::Esc, none)), Intent::ClearSelection);
        assert_eq!(key_to_intent(key(KeyCode::Char('R'), KeyModifiers::SHIFT)), Intent::Restart);
        assert_eq!(key_to_intent(key(KeyCode::Char('q'), none)), Intent::Quit);
    }

    #[test]
    fn ctrl_c_quits_other_chords_do_nothing() {
        assert_eq!(key_to_intent(key(KeyCode::Char('c'), KeyModifiers::CONTROL)), Intent::Quit);
        assert_eq!(key_to_intent(key(KeyCode::Char('p'), KeyModifiers::ALT)), Intent::None);
    }

    #[test]
    fn only_left_press_taps() {
        assert_eq!(
            mouse_to_intent(mouse(MouseEventKind::Down(MouseButton::Left))),
            Intent::Tap { column: 12, row: 7 }
        );
        assert_eq!(mouse_to_intent(mouse(MouseEventKind::Down(MouseButton::Right))), Intent::None);
        assert_eq!(mouse_to_intent(mouse(MouseEventKind::Moved)), Intent::None);
    }
}
