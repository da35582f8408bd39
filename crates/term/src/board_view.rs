//! TermBoard: the terminal's visual collaborator.
//!
//! Receives mark/clear/result/notice callbacks from the turn flow and draws
//! the 3x3 grid plus a status panel into a [`FrameBuffer`]. No I/O.

use crate::core::{BoardView, FlowState};
use crate::fb::{CellStyle, FrameBuffer, Rgb};
use crate::types::{ConnectionState, Mark, Role, BOARD_CELLS};

const ORIGIN_X: u16 = 2;
const ORIGIN_Y: u16 = 1;
/// Columns per board cell, including the separator.
const CELL_W: u16 = 4;
/// Rows per board row, including the separator.
const CELL_H: u16 = 2;

const X_STYLE: CellStyle = CellStyle::fg(Rgb::new(240, 90, 90)).bold();
const O_STYLE: CellStyle = CellStyle::fg(Rgb::new(90, 160, 240)).bold();
const HINT_STYLE: CellStyle = CellStyle::fg(Rgb::new(110, 110, 120)).dim();
const GRID_STYLE: CellStyle = CellStyle::fg(Rgb::new(160, 160, 170));
const RESULT_STYLE: CellStyle = CellStyle::fg(Rgb::new(250, 210, 80)).bold();

/// What the panel shows besides the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub connection: ConnectionState,
    pub flow: FlowState,
    pub active: Role,
}

#[derive(Debug, Default, Clone)]
pub struct TermBoard {
    marks: [Mark; BOARD_CELLS],
    result: Option<String>,
    notice: Option<String>,
}

impl TermBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self, index: usize) -> Option<Mark> {
        self.marks.get(index).copied()
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn current_notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Columns and rows [`render_into`](Self::render_into) needs.
    pub fn size_hint() -> (u16, u16) {
        (ORIGIN_X + 3 * CELL_W + 36, ORIGIN_Y + 3 * CELL_H + 6)
    }

    pub fn render_into(&self, status: &Status, fb: &mut FrameBuffer) {
        fb.clear();

        for row in 0..3u16 {
            let y = ORIGIN_Y + row * CELL_H;
            for col in 0..3u16 {
                let x = ORIGIN_X + col * CELL_W;
                let index = (row * 3 + col) as usize;
                match self.marks[index] {
                    Mark::X => fb.put_str(x + 1, y, "X", X_STYLE),
                    Mark::O => fb.put_str(x + 1, y, "O", O_STYLE),
                    Mark::Empty => fb.put_str(x + 1, y, &(index + 1).to_string(), HINT_STYLE),
                };
                if col < 2 {
                    fb.put_str(x + 3, y, "│", GRID_STYLE);
                }
            }
            if row < 2 {
                fb.put_str(ORIGIN_X, y + 1, "───┼───┼───", GRID_STYLE);
            }
        }

        let mut y = ORIGIN_Y + 3 * CELL_H;
        let turn = match status.flow {
            FlowState::Idle => format!("{} to move", status.active),
            FlowState::AwaitingServer => "waiting for server...".to_string(),
            FlowState::Ended => "game over".to_string(),
        };
        fb.put_str(
            ORIGIN_X,
            y,
            &format!("{} · {}", status.connection.as_str(), turn),
            CellStyle::PLAIN,
        );
        y += 1;

        if status.flow == FlowState::Ended {
            if let Some(text) = &self.result {
                fb.put_str(ORIGIN_X, y, text, RESULT_STYLE);
            }
        }
        y += 1;

        if let Some(text) = &self.notice {
            fb.put_str(ORIGIN_X, y, text, HINT_STYLE);
        }
        y += 2;

        fb.put_str(ORIGIN_X, y, "1-9 place  r restart  q quit", HINT_STYLE);
    }
}

impl BoardView for TermBoard {
    fn cell_marked(&mut self, index: usize, role: Role) {
        if let Some(slot) = self.marks.get_mut(index) {
            *slot = role.into();
        }
    }

    fn cell_cleared(&mut self, index: usize) {
        if let Some(slot) = self.marks.get_mut(index) {
            *slot = Mark::Empty;
        }
    }

    fn result_announced(&mut self, text: &str) {
        self.result = Some(text.to_string());
    }

    fn notice(&mut self, text: &str) {
        self.notice = Some(text.to_string());
    }
}
