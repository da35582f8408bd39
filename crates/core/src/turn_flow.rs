//! Turn-flow state machine
//!
//! Gates local input so at most one move is ever waiting on the server:
//!
//! ```text
//!            choose_cell (empty cell)
//!   Idle ─────────────────────────────▶ AwaitingServer
//!    ▲                                        │
//!    │ new_board / invalid_move / unexpected  │ win_* / draw / disconnect /
//!    └────────────────────────────────────────┤ transport loss
//!                                             ▼
//!   Idle ◀──────────── restart ────────────  Ended
//! ```
//!
//! Local moves are marked optimistically and then reconciled against the
//! server's authoritative board, which reverts a rejected mark.

use tracing::{debug, error, info, warn};

use crate::board::reconcile;
use crate::protocol::{Action, ConnectError, DecodeError, DisconnectCause, Message};
use crate::session::{BoardView, Outbox, OutboxClosed, SessionEvents};
use crate::types::{BoardState, GameResult, Mark, Role, BOARD_CELLS};

/// Where the flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowState {
    Idle,
    AwaitingServer,
    Ended,
}

/// Why a local move was not sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejected {
    #[error("cell {0} is out of range")]
    OutOfRange(usize),
    #[error("cell {0} is already marked")]
    Occupied(usize),
    #[error("still waiting for the server to answer the last move")]
    AwaitingServer,
    #[error("the game is over")]
    GameOver,
    #[error(transparent)]
    Offline(#[from] OutboxClosed),
}

/// A decodable inbound message that makes no sense to a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolViolation {
    #[error("unexpected inbound action {0}")]
    UnexpectedAction(Action),
}

#[derive(Debug, Clone, Copy)]
struct PendingMove {
    index: usize,
    previous: Mark,
}

/// Client-side turn flow.
///
/// Owns the logical board and drives a [`BoardView`] and an [`Outbox`]. All
/// methods run on the consumer thread.
pub struct TurnFlow<V, O> {
    view: V,
    outbox: O,
    /// Logical board.
    board: BoardState,
    /// What the view currently shows.
    shown: BoardState,
    state: FlowState,
    result: GameResult,
    active: Role,
    pending: Option<PendingMove>,
}

impl<V: BoardView, O: Outbox> TurnFlow<V, O> {
    pub fn new(view: V, outbox: O) -> Self {
        Self {
            view,
            outbox,
            board: BoardState::new(),
            shown: BoardState::new(),
            state: FlowState::Idle,
            result: GameResult::None,
            active: Role::X,
            pending: None,
        }
    }

    /// Announce the (empty) starting board to the server.
    pub fn start(&mut self) -> Result<(), OutboxClosed> {
        info!("announcing initial state");
        self.outbox
            .post(Message::new(Action::InitialState).with_board(self.board))
    }

    /// Local input chose a cell.
    ///
    /// On success the cell is marked optimistically, a `new_move` carrying the
    /// active role and the full board is posted, and the flow waits for the
    /// server.
    pub fn choose_cell(&mut self, index: usize) -> Result<(), MoveRejected> {
        match self.state {
            FlowState::Ended => return Err(MoveRejected::GameOver),
            FlowState::AwaitingServer => return Err(MoveRejected::AwaitingServer),
            FlowState::Idle => {}
        }
        let previous = self.board.get(index).ok_or(MoveRejected::OutOfRange(index))?;
        if !previous.is_empty() {
            return Err(MoveRejected::Occupied(index));
        }

        let role = self.active;
        self.board.set(index, Mark::from(role));
        self.sync_view();
        self.pending = Some(PendingMove { index, previous });
        self.state = FlowState::AwaitingServer;

        debug!(index, role = %role, "sending move");
        if let Err(e) = self.outbox.post(Message::new_move(role, self.board)) {
            error!(error = %e, "move could not be queued");
            self.revert_pending();
            return Err(e.into());
        }
        Ok(())
    }

    /// Reset to a fresh game and tell the server.
    pub fn restart(&mut self) -> Result<(), OutboxClosed> {
        info!("restarting game");
        self.reset();
        self.outbox
            .post(Message::new(Action::RestartGame).with_board(self.board))
    }

    /// Apply one inbound message.
    pub fn apply(&mut self, msg: Message) {
        debug!(action = %msg.action, role = ?msg.role, "applying server message");

        // Any inbound message answers the outstanding move.
        let pending = self.pending.take();
        if self.state == FlowState::AwaitingServer {
            self.state = FlowState::Idle;
        }

        if self.state == FlowState::Ended && msg.action != Action::RestartGame {
            if let Some(board) = msg.board {
                self.adopt(board);
            }
            return;
        }

        match msg.action {
            Action::NewBoard => match msg.board {
                Some(board) => {
                    self.adopt(board);
                    self.active = self.active.opponent();
                }
                None => warn!("new_board without a board; ignoring"),
            },
            Action::Win(role) => {
                if let Some(board) = msg.board {
                    self.adopt(board);
                }
                self.finish(GameResult::WinByRole(role));
            }
            Action::Draw => {
                if let Some(board) = msg.board {
                    self.adopt(board);
                }
                self.finish(GameResult::Draw);
            }
            Action::InvalidMove => {
                warn!("server rejected the move");
                match msg.board {
                    Some(board) => self.adopt(board),
                    None => {
                        if let Some(p) = pending {
                            self.undo(p);
                        }
                    }
                }
            }
            Action::Disconnect => self.finish(GameResult::OpponentDisconnected),
            Action::InitialState => {
                if let Some(board) = msg.board {
                    self.adopt(board);
                }
            }
            Action::RestartGame => {
                info!("server restarted the game");
                self.reset();
            }
            Action::NewMove => {
                let violation = ProtocolViolation::UnexpectedAction(msg.action);
                warn!(%violation, "ignoring inbound message");
            }
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    /// Whether a sent move is still waiting on the server.
    pub fn is_pending(&self) -> bool {
        self.state == FlowState::AwaitingServer
    }

    pub fn result(&self) -> GameResult {
        self.result
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    /// Role the next local move is played as.
    pub fn active_role(&self) -> Role {
        self.active
    }

    /// Whether a move on `index` would currently be accepted.
    pub fn accepts_move(&self, index: usize) -> bool {
        self.state == FlowState::Idle
            && index < BOARD_CELLS
            && self.board.get(index).is_some_and(|m| m.is_empty())
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn outbox(&self) -> &O {
        &self.outbox
    }

    pub fn outbox_mut(&mut self) -> &mut O {
        &mut self.outbox
    }

    fn adopt(&mut self, board: BoardState) {
        self.board = board;
        self.sync_view();
    }

    fn sync_view(&mut self) -> usize {
        reconcile(&mut self.shown, &self.board, &mut self.view)
    }

    fn finish(&mut self, result: GameResult) {
        info!(?result, "game ended");
        self.pending = None;
        self.result = result;
        self.state = FlowState::Ended;
        if let Some(text) = result.announcement() {
            self.view.result_announced(&text);
        }
    }

    fn reset(&mut self) {
        self.board.clear();
        self.sync_view();
        self.state = FlowState::Idle;
        self.result = GameResult::None;
        self.active = Role::X;
        self.pending = None;
    }

    fn undo(&mut self, pending: PendingMove) {
        self.board.set(pending.index, pending.previous);
        self.sync_view();
    }

    /// Drop the outstanding move and reopen input.
    fn revert_pending(&mut self) {
        if let Some(p) = self.pending.take() {
            self.undo(p);
        }
        if self.state == FlowState::AwaitingServer {
            self.state = FlowState::Idle;
        }
    }
}

impl<V: BoardView, O: Outbox> SessionEvents for TurnFlow<V, O> {
    fn message_received(&mut self, msg: Message) {
        self.apply(msg);
    }

    /// Like an unrecognised action: reopen input, leave the board alone.
    fn frame_rejected(&mut self, err: DecodeError) {
        warn!(error = %err, "skipping undecodable frame");
        self.pending = None;
        if self.state == FlowState::AwaitingServer {
            self.state = FlowState::Idle;
        }
    }

    fn connect_failed(&mut self, err: ConnectError) {
        warn!(error = %err, "connect failed");
        self.view.notice(&format!("Could not connect: {}", err));
    }

    fn send_abandoned(&mut self, action: Action, err: ConnectError) {
        warn!(%action, error = %err, "send abandoned after failed reconnect");
        if action == Action::NewMove {
            self.revert_pending();
        }
        self.view
            .notice(&format!("Could not reach server, {} not sent", action));
    }

    fn connection_lost(&mut self, cause: DisconnectCause) {
        error!(cause = %cause, "connection lost");
        self.pending = None;
        if self.state != FlowState::Ended {
            self.finish(GameResult::ConnectionLost);
        }
    }
}
