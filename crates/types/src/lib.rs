//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the application.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (turn flow, terminal rendering, wire protocol).
//!
//! # Board Layout
//!
//! The board is a fixed sequence of 9 cells in row-major order:
//!
//! ```text
//!  0 | 1 | 2
//! ---+---+---
//!  3 | 4 | 5
//! ---+---+---
//!  6 | 7 | 8
//! ```
//!
//! # Protocol Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `BOARD_CELLS` | 9 | Number of cells on the board |
//! | `DEFAULT_PORT` | 9999 | Server port when nothing else is configured |
//! | `MIN_PORT` / `MAX_PORT` | 1024 / 65535 | Accepted port range |
//! | `TICK_MS` | 16 | Consumer tick interval (~60 Hz) |
//! | `DEFAULT_MAX_FRAME_BYTES` | 65536 | Cap on a single undelimited frame |
//!
//! # Examples
//!
//! ```
//! use tui_tictactoe_types::{BoardState, Mark, Role};
//!
//! let mut board = BoardState::new();
//! assert!(board.is_empty());
//!
//! board.set(4, Mark::from(Role::X));
//! assert_eq!(board.get(4), Some(Mark::X));
//! assert_eq!(board.get(9), None);
//!
//! assert_eq!(Role::from_wire("o"), Some(Role::O));
//! assert_eq!(Role::X.opponent(), Role::O);
//! ```

/// Number of cells on the board.
pub const BOARD_CELLS: usize = 9;

/// Default server port.
pub const DEFAULT_PORT: u16 = 9999;

/// Lowest accepted server port.
pub const MIN_PORT: u16 = 1024;

/// Highest accepted server port.
pub const MAX_PORT: u16 = 65535;

/// Default server host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Consumer tick interval in milliseconds (16ms ≈ 60 Hz).
pub const TICK_MS: u32 = 16;

/// Default bound on a single connect attempt.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Default cap on buffered bytes without a frame delimiter.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 64 * 1024;

/// Player role, used both as the mover and as the winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    X,
    O,
}

impl Role {
    /// Parse a role from its wire string (case-insensitive).
    ///
    /// # Examples
    ///
    /// ```
    /// use tui_tictactoe_types::Role;
    ///
    /// assert_eq!(Role::from_wire("X"), Some(Role::X));
    /// assert_eq!(Role::from_wire("o"), Some(Role::O));
    /// assert_eq!(Role::from_wire("-"), None);
    /// ```
    pub fn from_wire(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("x") {
            Some(Role::X)
        } else if s.eq_ignore_ascii_case("o") {
            Some(Role::O)
        } else {
            None
        }
    }

    /// Wire string for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::X => "X",
            Role::O => "O",
        }
    }

    /// The other role.
    pub fn opponent(&self) -> Self {
        match self {
            Role::X => Role::O,
            Role::O => Role::X,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mark {
    #[default]
    Empty,
    X,
    O,
}

impl Mark {
    /// Parse a cell encoding. Anything other than `X`/`O` reads as empty.
    ///
    /// The wire format writes empty cells as `-`; the lenient fallback matches
    /// how servers in the wild fill unknown cells.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "X" | "x" => Mark::X,
            "O" | "o" => Mark::O,
            _ => Mark::Empty,
        }
    }

    /// Cell encoding used on the wire.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Mark::Empty => "-",
            Mark::X => "X",
            Mark::O => "O",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Mark::Empty)
    }

    /// Role owning this mark, if any.
    pub fn role(&self) -> Option<Role> {
        match self {
            Mark::Empty => None,
            Mark::X => Some(Role::X),
            Mark::O => Some(Role::O),
        }
    }
}

impl From<Role> for Mark {
    fn from(role: Role) -> Self {
        match role {
            Role::X => Mark::X,
            Role::O => Mark::O,
        }
    }
}

/// Fixed 9-cell board in row-major order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BoardState {
    cells: [Mark; BOARD_CELLS],
}

impl BoardState {
    /// All-empty board.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: [Mark; BOARD_CELLS]) -> Self {
        Self { cells }
    }

    /// Cell value, or `None` when `index` is outside `0..9`.
    pub fn get(&self, index: usize) -> Option<Mark> {
        self.cells.get(index).copied()
    }

    /// Set a cell. Returns `false` (and changes nothing) for an out-of-range index.
    pub fn set(&mut self, index: usize, mark: Mark) -> bool {
        match self.cells.get_mut(index) {
            Some(cell) => {
                *cell = mark;
                true
            }
            None => false,
        }
    }

    pub fn cells(&self) -> &[Mark; BOARD_CELLS] {
        &self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Mark)> + '_ {
        self.cells.iter().copied().enumerate()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Mark::is_empty)
    }

    /// Reset every cell to empty.
    pub fn clear(&mut self) {
        self.cells = [Mark::Empty; BOARD_CELLS];
    }
}

/// Terminal marker of a game.
///
/// Once anything other than `None`, local input stays gated until a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameResult {
    #[default]
    None,
    WinByRole(Role),
    Draw,
    OpponentDisconnected,
    /// The local transport failed (write error, peer hang-up, read fault).
    ConnectionLost,
}

impl GameResult {
    pub fn is_over(&self) -> bool {
        !matches!(self, GameResult::None)
    }

    /// Text handed to the visual layer when the result is announced.
    ///
    /// # Examples
    ///
    /// ```
    /// use tui_tictactoe_types::{GameResult, Role};
    ///
    /// assert_eq!(GameResult::WinByRole(Role::O).announcement().as_deref(), Some("O Wins!"));
    /// assert_eq!(GameResult::None.announcement(), None);
    /// ```
    pub fn announcement(&self) -> Option<String> {
        match self {
            GameResult::None => None,
            GameResult::WinByRole(role) => Some(format!("{} Wins!", role)),
            GameResult::Draw => Some("It's a Draw!".to_string()),
            GameResult::OpponentDisconnected => Some("Opponent Disconnected".to_string()),
            GameResult::ConnectionLost => Some("Connection Lost".to_string()),
        }
    }
}

/// Lifecycle of the transport connection.
///
/// Owned by the connection manager; everything else only observes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Closing,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Closing => "closing",
        }
    }
}
