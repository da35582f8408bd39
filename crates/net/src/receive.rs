//! Per-connection receive loop.
//!
//! Reads bytes, splits them into frames, decodes each frame and publishes the
//! result to the dispatcher. A bad frame is reported and skipped; only
//! cancellation, end of stream, a read error, or an oversized frame end the
//! loop.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::dispatcher::SessionHandle;
use crate::protocol::{decode, DisconnectCause, FrameError, FrameReader};

const READ_CHUNK: usize = 4096;

/// How a receive loop ended.
#[derive(Debug)]
pub enum LoopExit {
    /// The connection's cancellation token fired.
    Cancelled,
    /// Zero-length read.
    PeerClosed,
    ReadFailed(io::Error),
    FrameTooLong(FrameError),
    /// Nobody is draining events any more.
    ConsumerGone,
}

impl LoopExit {
    /// The disconnect to report to the session, if this exit is a fault.
    pub fn into_cause(self) -> Option<DisconnectCause> {
        match self {
            LoopExit::Cancelled | LoopExit::ConsumerGone => None,
            LoopExit::PeerClosed => Some(DisconnectCause::PeerClosed),
            LoopExit::ReadFailed(e) => Some(DisconnectCause::ReadFailed(e)),
            LoopExit::FrameTooLong(e) => Some(DisconnectCause::FrameTooLong(e)),
        }
    }
}

pub struct ReceiveLoop<R> {
    conn: u64,
    reader: R,
    cancel: CancellationToken,
    events: SessionHandle,
    frames: FrameReader,
}

impl<R: AsyncRead + Unpin> ReceiveLoop<R> {
    pub fn new(
        conn: u64,
        reader: R,
        cancel: CancellationToken,
        events: SessionHandle,
        max_frame_len: usize,
    ) -> Self {
        Self {
            conn,
            reader,
            cancel,
            events,
            frames: FrameReader::new(max_frame_len),
        }
    }

    /// Run until the connection ends. Teardown is the caller's job.
    pub async fn run(mut self) -> LoopExit {
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let read = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return LoopExit::Cancelled,
                r = self.reader.read(&mut buf) => r,
            };

            let n = match read {
                Ok(0) => return LoopExit::PeerClosed,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return LoopExit::ReadFailed(e),
            };
            trace!(conn = self.conn, bytes = n, "read");

            self.frames.push(&buf[..n]);
            loop {
                match self.frames.next_frame() {
                    Ok(Some(frame)) => {
                        if !self.publish(&frame) {
                            return LoopExit::ConsumerGone;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => return LoopExit::FrameTooLong(e),
                }
            }
        }
    }

    fn publish(&self, frame: &[u8]) -> bool {
        match decode(frame) {
            Ok(msg) => {
                debug!(conn = self.conn, action = %msg.action, "received");
                self.events.enqueue(move |s| s.message_received(msg))
            }
            Err(err) => {
                warn!(
                    conn = self.conn,
                    error = %err,
                    frame = %String::from_utf8_lossy(frame),
                    "skipping undecodable frame"
                );
                self.events.enqueue(move |s| s.frame_rejected(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SessionEvents;
    use crate::dispatcher::SessionDispatcher;
    use crate::protocol::{Action, ConnectError, DecodeError, Message};

    #[derive(Default)]
    struct Seen {
        actions: Vec<Action>,
        rejected: usize,
    }

    impl SessionEvents for Seen {
        fn message_received(&mut self, msg: Message) {
            self.actions.push(msg.action);
        }
        fn frame_rejected(&mut self, _err: DecodeError) {
            self.rejected += 1;
        }
        fn connect_failed(&mut self, _err: ConnectError) {}
        fn send_abandoned(&mut self, _action: Action, _err: ConnectError) {}
        fn connection_lost(&mut self, _cause: DisconnectCause) {}
    }

    #[tokio::test]
    async fn test_fragmented_reads_are_reassembled() {
        let mock = tokio_test::io::Builder::new()
            .read(b"{\"action\":\"new_")
            .read(b"board\"}\n{\"action\"")
            .read(b":\"draw\"}")
            .read(b"\n")
            .build();
        let mut dispatcher = SessionDispatcher::new();
        let exit = ReceiveLoop::new(1, mock, CancellationToken::new(), dispatcher.handle(), 1024)
            .run()
            .await;
        assert!(matches!(exit, LoopExit::PeerClosed));

        let mut seen = Seen::default();
        dispatcher.drain(&mut seen);
        assert_eq!(seen.actions, vec![Action::NewBoard, Action::Draw]);
    }

    #[tokio::test]
    async fn test_bad_frame_is_skipped_not_fatal() {
        let mock = tokio_test::io::Builder::new()
            .read(b"garbage\n{\"action\":\"bogus\"}\n{\"action\":\"disconnect\"}\n")
            .build();
        let mut dispatcher = SessionDispatcher::new();
        let exit = ReceiveLoop::new(1, mock, CancellationToken::new(), dispatcher.handle(), 1024)
            .run()
            .await;
        assert!(matches!(exit, LoopExit::PeerClosed));

        let mut seen = Seen::default();
        dispatcher.drain(&mut seen);
        assert_eq!(seen.rejected, 2);
        assert_eq!(seen.actions, vec![Action::Disconnect]);
    }

    #[tokio::test]
    async fn test_read_error_ends_loop() {
        let mock = tokio_test::io::Builder::new()
            .read(b"{\"action\":\"draw\"}\n")
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();
        let dispatcher = SessionDispatcher::new();
        let exit = ReceiveLoop::new(1, mock, CancellationToken::new(), dispatcher.handle(), 1024)
            .run()
            .await;
        match exit.into_cause() {
            Some(DisconnectCause::ReadFailed(e)) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
            other => panic!("unexpected exit: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_oversized_frame_forces_exit() {
        let mock = tokio_test::io::Builder::new().read(&[b'x'; 64]).build();
        let dispatcher = SessionDispatcher::new();
        let exit = ReceiveLoop::new(1, mock, CancellationToken::new(), dispatcher.handle(), 16)
            .run()
            .await;
        assert!(matches!(exit, LoopExit::FrameTooLong(FrameError::Oversized { limit: 16 })));
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_pending_read() {
        let (_client, server) = tokio::io::duplex(64);
        let cancel = CancellationToken::new();
        let dispatcher = SessionDispatcher::new();
        let task = tokio::spawn(
            ReceiveLoop::new(1, server, cancel.clone(), dispatcher.handle(), 1024).run(),
        );

        cancel.cancel();
        let exit = tokio::time::timeout(std::time::Duration::from_secs(2), task)
            .await
            .expect("loop did not observe cancellation")
            .unwrap();
        assert!(matches!(exit, LoopExit::Cancelled));
    }
}
