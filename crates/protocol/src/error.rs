//! Error taxonomy shared by the codec, the frame reader and the transport.

use std::io;
use std::time::Duration;

/// A single frame could not be turned into a [`crate::Message`].
///
/// Decode failures are per-frame: the session keeps running.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Not JSON, not an object, or a field has the wrong shape.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// `action` is not one of the recognised action strings.
    #[error("unknown action: {0:?}")]
    UnknownAction(String),
}

/// The frame reader refused to keep buffering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("frame exceeds {limit} bytes without a delimiter")]
    Oversized { limit: usize },
}

/// Connecting to the server failed.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("connect to {addr} timed out after {timeout:?}")]
    Timeout { addr: String, timeout: Duration },

    /// Refused, unreachable, or the host did not resolve.
    #[error("connect to {addr} failed: {source}")]
    Io {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// `close()` ran while the attempt was still dialing.
    #[error("connect to {addr} cancelled")]
    Cancelled { addr: String },

    /// The connection manager has been shut down.
    #[error("connection manager is shut down")]
    Shutdown,
}

/// Writing a frame failed.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("not connected")]
    NotConnected,

    /// The write failed mid-session; the connection has been torn down.
    #[error("write failed: {0}")]
    Io(#[from] io::Error),
}

/// Why a live connection was torn down by something other than a local close.
#[derive(Debug, thiserror::Error)]
pub enum DisconnectCause {
    #[error("server closed the connection")]
    PeerClosed,

    #[error("read failed: {0}")]
    ReadFailed(#[source] io::Error),

    #[error("write failed: {0}")]
    WriteFailed(#[source] io::Error),

    #[error(transparent)]
    FrameTooLong(#[from] FrameError),
}
