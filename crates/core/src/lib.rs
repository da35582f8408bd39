//! Core game-flow module - pure, deterministic, and testable
//!
//! This module holds the client-side turn flow: local board state, input
//! gating, and reconciliation against the authoritative server. It performs
//! **no I/O**: outgoing messages go to an [`Outbox`], visual changes go to a
//! [`BoardView`], and network events arrive through [`SessionEvents`].
//!
//! - **Single-threaded**: everything here runs on the consumer thread
//! - **Testable**: collaborators are traits, so tests use plain recorders
//! - **No game rules**: wins and draws are whatever the server says they are
//!
//! # Module Structure
//!
//! - [`turn_flow`]: the Idle / AwaitingServer / Ended state machine
//! - [`board`]: reconciliation of the shown board against a snapshot
//! - [`session`]: collaborator traits
//!
//! # Example
//!
//! ```
//! use tui_tictactoe_core::{BoardView, FlowState, Outbox, OutboxClosed, TurnFlow};
//! use tui_tictactoe_core::protocol::{Action, Message};
//! use tui_tictactoe_core::types::{BoardState, Role};
//!
//! struct NoView;
//! impl BoardView for NoView {
//!     fn cell_marked(&mut self, _: usize, _: Role) {}
//!     fn cell_cleared(&mut self, _: usize) {}
//!     fn result_announced(&mut self, _: &str) {}
//! }
//!
//! #[derive(Default)]
//! struct Queue(Vec<Message>);
//! impl Outbox for Queue {
//!     fn post(&mut self, msg: Message) -> Result<(), OutboxClosed> {
//!         self.0.push(msg);
//!         Ok(())
//!     }
//! }
//!
//! let mut flow = TurnFlow::new(NoView, Queue::default());
//! flow.choose_cell(4).unwrap();
//! assert_eq!(flow.state(), FlowState::AwaitingServer);
//!
//! let mut server_board = BoardState::new();
//! server_board.set(4, Role::X.into());
//! flow.apply(Message::new(Action::NewBoard).with_board(server_board));
//! assert_eq!(flow.state(), FlowState::Idle);
//! assert_eq!(flow.active_role(), Role::O);
//! ```

pub mod board;
pub mod session;
pub mod turn_flow;

pub use tui_tictactoe_protocol as protocol;
pub use tui_tictactoe_types as types;

pub use board::reconcile;
pub use session::{BoardView, Outbox, OutboxClosed, SessionEvents};
pub use turn_flow::{FlowState, MoveRejected, ProtocolViolation, TurnFlow};
