//! Key mapping from terminal events to board actions.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::types::BOARD_CELLS;

/// What a key press asks the game to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Zero-based cell index, row-major.
    Choose(usize),
    Restart,
}

/// Map keyboard input to a board action.
///
/// Digits `1`-`9` pick a cell in the layout of the on-screen hints:
///
/// ```text
/// 1 2 3
/// 4 5 6
/// 7 8 9
/// ```
pub fn handle_key_event(key: KeyEvent) -> Option<InputAction> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Char(c @ '1'..='9') => {
            let index = (c as u8 - b'1') as usize;
            debug_assert!(index < BOARD_CELLS);
            Some(InputAction::Choose(index))
        }
        KeyCode::Char('r') | KeyCode::Char('R') => Some(InputAction::Restart),
        _ => None,
    }
}

/// Check if key should quit the client.
pub fn should_quit(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc)
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}
