//! Message codec - JSON object per frame
//!
//! A frame is one UTF-8 JSON object followed by `\n`:
//!
//! ```text
//! {"action":"new_move","role":"X","board":{"0":"-","1":"-",...,"8":"-"}}
//! ```
//!
//! The in-memory board is an ordered 9-cell sequence; on the wire it is an
//! object keyed by the cell positions `"0"`..`"8"`, each mapped to `"X"`,
//! `"O"` or `"-"`.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DecodeError;
use crate::types::{BoardState, Mark, Role, BOARD_CELLS};

/// Wire keys for the board cells, in index order.
const CELL_KEYS: [&str; BOARD_CELLS] = ["0", "1", "2", "3", "4", "5", "6", "7", "8"];

/// Recognised `action` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    InitialState,
    NewMove,
    NewBoard,
    /// `win_X` / `win_O`.
    Win(Role),
    Draw,
    InvalidMove,
    Disconnect,
    RestartGame,
}

impl Action {
    /// Parse an action string.
    ///
    /// # Examples
    ///
    /// ```
    /// use tui_tictactoe_protocol::Action;
    /// use tui_tictactoe_types::Role;
    ///
    /// assert_eq!(Action::parse("new_board"), Some(Action::NewBoard));
    /// assert_eq!(Action::parse("win_O"), Some(Action::Win(Role::O)));
    /// assert_eq!(Action::parse("win_Q"), None);
    /// assert_eq!(Action::parse("game_over"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "initial_state" => Some(Action::InitialState),
            "new_move" => Some(Action::NewMove),
            "new_board" => Some(Action::NewBoard),
            "draw" => Some(Action::Draw),
            "invalid_move" => Some(Action::InvalidMove),
            "disconnect" => Some(Action::Disconnect),
            "restart_game" => Some(Action::RestartGame),
            _ => s
                .strip_prefix("win_")
                .and_then(Role::from_wire)
                .map(Action::Win),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::InitialState => "initial_state",
            Action::NewMove => "new_move",
            Action::NewBoard => "new_board",
            Action::Win(Role::X) => "win_X",
            Action::Win(Role::O) => "win_O",
            Action::Draw => "draw",
            Action::InvalidMove => "invalid_move",
            Action::Disconnect => "disconnect",
            Action::RestartGame => "restart_game",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub action: Action,
    pub role: Option<Role>,
    pub board: Option<BoardState>,
}

impl Message {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            role: None,
            board: None,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_board(mut self, board: BoardState) -> Self {
        self.board = Some(board);
        self
    }

    /// `new_move` carrying the mover and a full board snapshot.
    pub fn new_move(role: Role, board: BoardState) -> Self {
        Self::new(Action::NewMove).with_role(role).with_board(board)
    }
}

// ============== Encoding ==============

#[derive(Serialize)]
struct OutgoingMessage<'a> {
    action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    board: Option<WireBoard<'a>>,
}

struct WireBoard<'a>(&'a BoardState);

impl Serialize for WireBoard<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(BOARD_CELLS))?;
        for (index, mark) in self.0.iter() {
            map.serialize_entry(CELL_KEYS[index], mark.as_wire())?;
        }
        map.end()
    }
}

/// Append one encoded frame (JSON + `\n`) to `out`.
pub fn encode_into(msg: &Message, out: &mut Vec<u8>) -> serde_json::Result<()> {
    let wire = OutgoingMessage {
        action: msg.action.as_str(),
        role: msg.role.as_ref().map(Role::as_str),
        board: msg.board.as_ref().map(WireBoard),
    };
    serde_json::to_writer(&mut *out, &wire)?;
    out.push(b'\n');
    Ok(())
}

/// Encode a message into a complete frame, delimiter included.
///
/// # Examples
///
/// ```
/// use tui_tictactoe_protocol::{encode, Action, Message};
///
/// let frame = encode(&Message::new(Action::Draw)).unwrap();
/// assert_eq!(frame, b"{\"action\":\"draw\"}\n");
/// ```
pub fn encode(msg: &Message) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(160);
    encode_into(msg, &mut out)?;
    Ok(out)
}

// ============== Decoding ==============

#[derive(Deserialize)]
struct IncomingMessage {
    action: String,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    board: Option<LenientBoard>,
}

/// Board decoded from the keyed wire object.
///
/// Keys outside `"0"`..`"8"` are dropped, missing keys and unknown cell values
/// read as empty. Anything that is not an object is rejected.
struct LenientBoard(BoardState);

impl<'de> Deserialize<'de> for LenientBoard {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = LenientBoard;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "an object keyed by cell positions \"0\"..\"8\"")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut board = BoardState::new();
                while let Some((key, value)) = map.next_entry::<String, serde_json::Value>()? {
                    let mark = value.as_str().map(Mark::from_wire).unwrap_or_default();
                    match key.parse::<usize>() {
                        Ok(index) if index < BOARD_CELLS => {
                            board.set(index, mark);
                        }
                        _ => tracing::debug!(key = %key, "ignoring out-of-range board key"),
                    }
                }
                Ok(LenientBoard(board))
            }
        }

        deserializer.deserialize_map(V)
    }
}

/// Decode one frame. Trailing whitespace (including the delimiter) is allowed.
pub fn decode(frame: &[u8]) -> Result<Message, DecodeError> {
    let incoming: IncomingMessage = serde_json::from_slice(frame)?;

    let action =
        Action::parse(&incoming.action).ok_or(DecodeError::UnknownAction(incoming.action))?;

    // Servers that serialise a missing role as "" must not lose the board.
    let role = incoming.role.and_then(|s| {
        let role = Role::from_wire(&s);
        if role.is_none() {
            tracing::debug!(role = %s, "treating unrecognised role as absent");
        }
        role
    });

    Ok(Message {
        action,
        role,
        board: incoming.board.map(|b| b.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_json(cells: [&str; 9]) -> String {
        let entries: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(i, c)| format!("\"{}\":\"{}\"", i, c))
            .collect();
        format!("{{{}}}", entries.join(","))
    }

    #[test]
    fn test_encode_new_move_scenario() {
        let mut board = BoardState::new();
        board.set(4, Mark::X);
        let frame = encode(&Message::new_move(Role::X, board)).unwrap();

        assert_eq!(frame.last(), Some(&b'\n'));
        let v: serde_json::Value = serde_json::from_slice(&frame).unwrap();
        assert_eq!(v["action"], "new_move");
        assert_eq!(v["role"], "X");
        for i in 0..9 {
            let expected = if i == 4 { "X" } else { "-" };
            assert_eq!(v["board"][i.to_string()], expected, "cell {}", i);
        }
    }

    #[test]
    fn test_encode_board_keys_in_order() {
        let frame = encode(&Message::new(Action::InitialState).with_board(BoardState::new())).unwrap();
        let text = std::str::from_utf8(&frame).unwrap();
        assert_eq!(
            text,
            "{\"action\":\"initial_state\",\"board\":{\"0\":\"-\",\"1\":\"-\",\"2\":\"-\",\"3\":\"-\",\"4\":\"-\",\"5\":\"-\",\"6\":\"-\",\"7\":\"-\",\"8\":\"-\"}}\n"
        );
    }

    #[test]
    fn test_decode_win_scenario() {
        let json = format!(
            "{{\"action\":\"win_X\",\"role\":\"X\",\"board\":{}}}",
            board_json(["X", "O", "X", "O", "X", "O", "X", "O", "-"])
        );
        let msg = decode(json.as_bytes()).unwrap();
        assert_eq!(msg.action, Action::Win(Role::X));
        assert_eq!(msg.role, Some(Role::X));
        let board = msg.board.unwrap();
        assert_eq!(board.get(0), Some(Mark::X));
        assert_eq!(board.get(1), Some(Mark::O));
        assert_eq!(board.get(8), Some(Mark::Empty));
    }

    #[test]
    fn test_decode_tolerates_missing_role_and_board() {
        let msg = decode(br#"{"action":"disconnect"}"#).unwrap();
        assert_eq!(msg, Message::new(Action::Disconnect));

        let msg = decode(br#"{"action":"draw","role":null,"board":null}"#).unwrap();
        assert_eq!(msg, Message::new(Action::Draw));
    }

    #[test]
    fn test_decode_drops_out_of_range_keys() {
        let msg = decode(br#"{"action":"new_board","board":{"4":"O","9":"X","-1":"X","foo":"X"}}"#)
            .unwrap();
        let board = msg.board.unwrap();
        assert_eq!(board.get(4), Some(Mark::O));
        assert_eq!(board.iter().filter(|(_, m)| !m.is_empty()).count(), 1);
    }

    #[test]
    fn test_decode_unknown_cell_values_read_empty() {
        let msg = decode(br#"{"action":"new_board","board":{"0":"Z","1":7,"2":"O"}}"#).unwrap();
        let board = msg.board.unwrap();
        assert_eq!(board.get(0), Some(Mark::Empty));
        assert_eq!(board.get(1), Some(Mark::Empty));
        assert_eq!(board.get(2), Some(Mark::O));
    }

    #[test]
    fn test_decode_rejects_unknown_action() {
        let err = decode(br#"{"action":"game_over"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownAction(ref a) if a == "game_over"));

        let err = decode(br#"{"action":"win_Z"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownAction(_)));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(matches!(decode(b"not json"), Err(DecodeError::Malformed(_))));
        assert!(matches!(decode(br#"{"role":"X"}"#), Err(DecodeError::Malformed(_))));
        assert!(matches!(
            decode(br#"{"action":"new_board","board":["X"]}"#),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(decode(&[0xFF, 0xFE]), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_decode_empty_role_keeps_board() {
        let json = format!(
            r#"{{"action":"new_board","role":"","board":{}}}"#,
            board_json(["-", "-", "-", "-", "X", "-", "-", "-", "-"])
        );
        let msg = decode(json.as_bytes()).unwrap();
        assert_eq!(msg.action, Action::NewBoard);
        assert_eq!(msg.role, None);
        assert_eq!(msg.board.unwrap().get(4), Some(Mark::X));
    }

    #[test]
    fn test_decode_unrecognised_role_reads_as_absent() {
        let msg = decode(br#"{"action":"draw","role":"Z"}"#).unwrap();
        assert_eq!(msg.action, Action::Draw);
        assert_eq!(msg.role, None);
        assert!(matches!(
            decode(br#"{"action":"draw","role":7}"#),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_accepts_trailing_delimiter() {
        let msg = decode(b"{\"action\":\"restart_game\"}\r\n").unwrap();
        assert_eq!(msg.action, Action::RestartGame);
    }
}
