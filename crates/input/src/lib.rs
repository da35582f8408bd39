//! Terminal input module.
//!
//! Maps `crossterm` key events into [`InputAction`]s. Independent of the
//! turn flow and of any UI framework.

pub mod map;

pub use tui_tictactoe_types as types;

pub use map::{handle_key_event, should_quit, InputAction};
