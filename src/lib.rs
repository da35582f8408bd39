//! TUI tic-tac-toe (workspace facade crate).
//!
//! Re-exports the member crates under short names so the binary, tests, and
//! benches can reach everything through `tui_tictactoe::{core,net,...}`.

pub use tui_tictactoe_core as core;
pub use tui_tictactoe_input as input;
pub use tui_tictactoe_net as net;
pub use tui_tictactoe_protocol as protocol;
pub use tui_tictactoe_term as term;
pub use tui_tictactoe_types as types;
