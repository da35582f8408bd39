//! Terminal front-end for the tic-tac-toe client.
//!
//! [`TermBoard`] is the visual collaborator the turn flow drives; it draws into
//! a [`FrameBuffer`], which [`TerminalRenderer`] flushes to the terminal with
//! diffed redraws. Everything except the renderer is pure and unit-tested.

pub mod board_view;
pub mod fb;
pub mod renderer;

pub use tui_tictactoe_core as core;
pub use tui_tictactoe_types as types;

pub use board_view::{Status, TermBoard};
pub use fb::{Cell, CellStyle, FrameBuffer, Rgb};
pub use renderer::{encode_diff_into, encode_full_into, TerminalRenderer};
