//! Seams between the turn flow and its collaborators.
//!
//! - [`BoardView`]: the visual layer the flow drives.
//! - [`Outbox`]: where outgoing messages go (the network client, or a test double).
//! - [`SessionEvents`]: everything the network layer reports back, delivered on
//!   the consumer thread by the dispatcher.

use crate::protocol::{Action, ConnectError, DecodeError, DisconnectCause, Message};
use crate::types::Role;

/// Visual layer driven by the turn flow.
pub trait BoardView {
    fn cell_marked(&mut self, index: usize, role: Role);

    fn cell_cleared(&mut self, index: usize);

    /// Terminal result text, e.g. `"X Wins!"`.
    fn result_announced(&mut self, text: &str);

    /// Non-terminal local problem worth showing (failed connect, dropped send).
    fn notice(&mut self, _text: &str) {}
}

impl<T: BoardView + ?Sized> BoardView for &mut T {
    fn cell_marked(&mut self, index: usize, role: Role) {
        (**self).cell_marked(index, role)
    }

    fn cell_cleared(&mut self, index: usize) {
        (**self).cell_cleared(index)
    }

    fn result_announced(&mut self, text: &str) {
        (**self).result_announced(text)
    }

    fn notice(&mut self, text: &str) {
        (**self).notice(text)
    }
}

/// The outbound side has gone away; nothing can be sent any more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("outbound channel is closed")]
pub struct OutboxClosed;

/// Accepts outgoing messages without blocking the caller.
///
/// Delivery failures surface later through [`SessionEvents`].
pub trait Outbox {
    fn post(&mut self, msg: Message) -> Result<(), OutboxClosed>;
}

/// Events reported by the network layer.
pub trait SessionEvents {
    /// A decoded message, in transport order.
    fn message_received(&mut self, msg: Message);

    /// A frame arrived but did not decode. The connection stays up.
    fn frame_rejected(&mut self, err: DecodeError);

    /// An explicit connect attempt failed.
    fn connect_failed(&mut self, err: ConnectError);

    /// A send needed a reconnect and the reconnect failed; the message was dropped.
    fn send_abandoned(&mut self, action: Action, err: ConnectError);

    /// The live connection was torn down by the peer or by an I/O fault.
    fn connection_lost(&mut self, cause: DisconnectCause);
}
