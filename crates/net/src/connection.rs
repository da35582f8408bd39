//! Connection manager
//!
//! Owns the TCP connection to the game server:
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──ok──▶ Connected
//!      ▲                        │                 │  │
//!      └────────── failed ──────┘                 │  │ close()
//!      ▲                                          │  ▼
//!      ├──────────── peer hang-up / I/O fault ────┘ Closing
//!      └────────────────────────────────────────────┘
//! ```
//!
//! Every live connection gets a generation id and its own cancellation token.
//! Whoever takes the live slot first (explicit close, write failure, or the
//! receive loop ending) performs the teardown; every later path finds the slot
//! empty, or holding a newer generation, and does nothing.
//!
//! The slot lock is only ever held for bookkeeping. Dialing and writing happen
//! outside it and race the connection's cancellation token, so `close()` can
//! always take the slot and interrupt whatever is in flight.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dispatcher::SessionHandle;
use crate::protocol::{ConnectError, DisconnectCause, SendError};
use crate::receive::{LoopExit, ReceiveLoop};
use crate::types::{ConnectionState, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_MAX_FRAME_BYTES};

/// Transport tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions {
    pub connect_timeout: Duration,
    pub max_frame_len: usize,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            max_frame_len: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

/// Write half shared between concurrent senders; its lock keeps frames whole.
type Writer = Arc<Mutex<OwnedWriteHalf>>;

struct Live {
    id: u64,
    writer: Writer,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

#[derive(Default)]
enum Slot {
    #[default]
    Empty,
    Dialing(CancellationToken),
    Live(Live),
}

impl Slot {
    /// Take the live connection, but only if it is generation `id`.
    fn take_live(&mut self, id: u64) -> Option<Live> {
        if !matches!(self, Slot::Live(live) if live.id == id) {
            return None;
        }
        match std::mem::take(self) {
            Slot::Live(live) => Some(live),
            _ => None,
        }
    }
}

struct Shared {
    slot: Mutex<Slot>,
    /// Serialises connect attempts; never taken by `close()`.
    dial: Mutex<()>,
    state: watch::Sender<ConnectionState>,
    next_id: AtomicU64,
    shut_down: AtomicBool,
    events: SessionHandle,
    options: ConnectOptions,
}

/// Cloneable handle to the single server connection.
#[derive(Clone)]
pub struct ConnectionManager {
    shared: Arc<Shared>,
}

impl ConnectionManager {
    pub fn new(events: SessionHandle, options: ConnectOptions) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot::Empty),
                dial: Mutex::new(()),
                state,
                next_id: AtomicU64::new(0),
                shut_down: AtomicBool::new(false),
                events,
                options,
            }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Observe state changes without owning them.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Connect and start the receive loop. A no-op when already connected.
    ///
    /// A `close()` while dialing abandons the attempt with
    /// [`ConnectError::Cancelled`].
    pub async fn connect(&self, host: &str, port: u16) -> Result<(), ConnectError> {
        let _dial = self.shared.dial.lock().await;
        let addr = format!("{}:{}", host, port);
        let cancel = CancellationToken::new();
        {
            let mut slot = self.shared.slot.lock().await;
            if let Slot::Live(live) = &*slot {
                debug!(conn = live.id, "already connected");
                return Ok(());
            }
            if self.shared.shut_down.load(Ordering::Acquire) {
                return Err(ConnectError::Shutdown);
            }
            *slot = Slot::Dialing(cancel.clone());
            self.set_state(ConnectionState::Connecting);
        }
        info!(%addr, "connecting");

        let timeout = self.shared.options.connect_timeout;
        let dialed = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            r = tokio::time::timeout(timeout, TcpStream::connect(addr.as_str())) => Some(r),
        };

        let mut slot = self.shared.slot.lock().await;
        // Only this call can be dialing; anything else means close() got here first.
        if !matches!(&*slot, Slot::Dialing(_)) {
            info!(%addr, "connect abandoned by close");
            return Err(ConnectError::Cancelled { addr });
        }
        let stream = match dialed {
            Some(Ok(Ok(stream))) => stream,
            Some(Ok(Err(source))) => {
                *slot = Slot::Empty;
                self.set_state(ConnectionState::Disconnected);
                return Err(ConnectError::Io { addr, source });
            }
            Some(Err(_)) => {
                *slot = Slot::Empty;
                self.set_state(ConnectionState::Disconnected);
                return Err(ConnectError::Timeout { addr, timeout });
            }
            None => {
                *slot = Slot::Empty;
                self.set_state(ConnectionState::Disconnected);
                return Err(ConnectError::Cancelled { addr });
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            debug!(error = %e, "set_nodelay failed");
        }

        let (reader, writer) = stream.into_split();
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let cancel = CancellationToken::new();
        let receive = ReceiveLoop::new(
            id,
            reader,
            cancel.clone(),
            self.shared.events.clone(),
            self.shared.options.max_frame_len,
        );

        let manager = self.clone();
        let task = tokio::spawn(async move {
            let exit = receive.run().await;
            manager.receive_ended(id, exit).await;
        });

        *slot = Slot::Live(Live {
            id,
            writer: Arc::new(Mutex::new(writer)),
            cancel,
            task,
        });
        self.set_state(ConnectionState::Connected);
        info!(conn = id, %addr, "connected");
        Ok(())
    }

    /// Write one complete frame.
    ///
    /// A write failure tears the connection down and reports
    /// [`DisconnectCause::WriteFailed`] to the session. A `close()` during the
    /// write abandons it with [`SendError::NotConnected`].
    pub async fn send(&self, frame: &[u8]) -> Result<(), SendError> {
        let (id, writer, cancel) = {
            let slot = self.shared.slot.lock().await;
            let Slot::Live(live) = &*slot else {
                return Err(SendError::NotConnected);
            };
            (live.id, Arc::clone(&live.writer), live.cancel.clone())
        };

        let written = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(conn = id, "send abandoned by teardown");
                return Err(SendError::NotConnected);
            }
            r = write_frame(&writer, frame) => r,
        };
        drop(writer);
        let err = match written {
            Ok(()) => {
                debug!(conn = id, bytes = frame.len(), "frame sent");
                return Ok(());
            }
            Err(e) => e,
        };

        let Some(live) = self.shared.slot.lock().await.take_live(id) else {
            return Err(SendError::Io(err));
        };
        warn!(conn = id, error = %err, "write failed, tearing down");

        let returned = io::Error::new(err.kind(), err.to_string());
        self.release(live, false).await;
        self.shared
            .events
            .enqueue(move |s| s.connection_lost(DisconnectCause::WriteFailed(err)));
        self.set_state(ConnectionState::Disconnected);
        Err(SendError::Io(returned))
    }

    /// Cancel the receive loop and any in-flight dial or write, release the
    /// transport, and wait for the loop to finish. Safe to call any number of
    /// times.
    pub async fn close(&self) {
        let taken = std::mem::take(&mut *self.shared.slot.lock().await);
        let live = match taken {
            Slot::Empty => return,
            Slot::Dialing(cancel) => {
                info!("closing while connecting");
                cancel.cancel();
                self.set_state(ConnectionState::Disconnected);
                return;
            }
            Slot::Live(live) => live,
        };
        info!(conn = live.id, "closing connection");
        self.set_state(ConnectionState::Closing);
        self.release(live, true).await;

        let slot = self.shared.slot.lock().await;
        if matches!(&*slot, Slot::Empty) {
            self.set_state(ConnectionState::Disconnected);
        }
    }

    /// Close and refuse further connects.
    pub async fn shutdown(&self) {
        self.shared.shut_down.store(true, Ordering::Release);
        self.close().await;
    }

    /// Cancellation always precedes releasing the socket, so a stuck writer
    /// gives up the write half before we lock it.
    async fn release(&self, live: Live, wait: bool) {
        let Live {
            id,
            writer,
            cancel,
            task,
        } = live;
        cancel.cancel();
        if let Err(e) = writer.lock().await.shutdown().await {
            debug!(conn = id, error = %e, "shutdown on release failed");
        }
        drop(writer);
        if wait {
            if let Err(e) = task.await {
                warn!(conn = id, error = %e, "receive loop task failed");
            }
        }
    }

    async fn receive_ended(&self, id: u64, exit: LoopExit) {
        let mut slot = self.shared.slot.lock().await;
        let Some(Live { writer, cancel, .. }) = slot.take_live(id) else {
            debug!(conn = id, ?exit, "receive loop ended after teardown");
            return;
        };
        cancel.cancel();
        drop(writer);

        // Queue the event before publishing the state so anyone woken by the
        // state change finds it.
        match exit.into_cause() {
            Some(cause) => {
                info!(conn = id, %cause, "connection torn down");
                self.shared
                    .events
                    .enqueue(move |s| s.connection_lost(cause));
            }
            None => debug!(conn = id, "receive loop stopped"),
        }
        self.set_state(ConnectionState::Disconnected);
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.shared.state.send_replace(state);
        if previous != state {
            debug!(from = previous.as_str(), to = state.as_str(), "connection state");
        }
    }
}

async fn write_frame(writer: &Mutex<OwnedWriteHalf>, frame: &[u8]) -> io::Result<()> {
    let mut writer = writer.lock().await;
    writer.write_all(frame).await?;
    writer.flush().await
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
