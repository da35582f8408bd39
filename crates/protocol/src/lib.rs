//! Wire protocol - line-delimited JSON between the client and the game server
//!
//! Every message is a single UTF-8 JSON object terminated by `\n`, sent over a
//! raw TCP byte stream. Both directions use the same shape:
//!
//! | field | type | required | meaning |
//! |---|---|---|---|
//! | `action` | string | yes | `initial_state`, `new_move`, `new_board`, `win_X`, `win_O`, `draw`, `invalid_move`, `disconnect`, `restart_game` |
//! | `role` | string | no | `"X"` or `"O"`: the mover or the winner |
//! | `board` | object | no | keys `"0"`..`"8"`, values `"X"`, `"O"` or `"-"` |
//!
//! # Example Flow
//!
//! ```text
//! Client -> Server: {"action":"initial_state","board":{"0":"-",...,"8":"-"}}
//! Client -> Server: {"action":"new_move","role":"X","board":{"0":"-",...,"4":"X",...}}
//! Server -> Client: {"action":"new_board","board":{"0":"-",...,"4":"X",...}}
//! Server -> Client: {"action":"win_X","role":"X","board":{...}}
//! ```
//!
//! # Modules
//!
//! - [`codec`]: [`Message`] encoding/decoding
//! - [`framing`]: [`FrameReader`], tolerant of fragmented reads
//! - [`error`]: error taxonomy shared with the transport layer
//!
//! # Testing
//!
//! A server can be faked with netcat:
//!
//! ```bash
//! nc -l 9999
//! {"action":"new_board","board":{"0":"-","1":"-","2":"-","3":"-","4":"X","5":"-","6":"-","7":"-","8":"-"}}
//! ```

pub mod codec;
pub mod error;
pub mod framing;

pub use tui_tictactoe_types as types;

pub use codec::{decode, encode, encode_into, Action, Message};
pub use error::{ConnectError, DecodeError, DisconnectCause, FrameError, SendError};
pub use framing::FrameReader;
