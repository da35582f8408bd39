//! Network runtime integration.
//!
//! Bridges the synchronous consumer thread with the async connection. The
//! consumer posts requests without blocking; a single driver task executes
//! them in order, and everything the network has to say comes back through
//! the dispatcher on the next [`NetClient::pump`].

use std::io;
use std::time::Duration;

use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::connection::ConnectionManager;
use crate::core::{Outbox, OutboxClosed, SessionEvents};
use crate::dispatcher::{SessionDispatcher, SessionHandle};
use crate::protocol::{encode, Message, SendError};
use crate::types::ConnectionState;

const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Work for the driver task.
#[derive(Debug)]
enum Request {
    Connect,
    Send(Message),
    Close,
}

/// [`Outbox`] that hands messages to the driver task.
#[derive(Debug, Clone)]
pub struct NetOutbox {
    requests: mpsc::UnboundedSender<Request>,
}

impl Outbox for NetOutbox {
    fn post(&mut self, msg: Message) -> Result<(), OutboxClosed> {
        self.requests
            .send(Request::Send(msg))
            .map_err(|_| OutboxClosed)
    }
}

/// Running network client, owned by the consumer thread.
pub struct NetClient {
    rt: Runtime,
    manager: ConnectionManager,
    requests: mpsc::UnboundedSender<Request>,
    dispatcher: SessionDispatcher,
}

impl NetClient {
    /// Build the runtime, start the driver, and begin connecting.
    ///
    /// A failed connect is reported through `connect_failed`, not here.
    pub fn start(config: &ClientConfig) -> io::Result<Self> {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("tictactoe-net")
            .enable_all()
            .build()?;

        let dispatcher = SessionDispatcher::new();
        let manager = ConnectionManager::new(dispatcher.handle(), config.connect_options());
        let (requests, rx) = mpsc::unbounded_channel();

        let driver = Driver {
            manager: manager.clone(),
            host: config.host.clone(),
            port: config.port,
            events: dispatcher.handle(),
            rx,
        };
        rt.spawn(driver.run());

        let client = Self {
            rt,
            manager,
            requests,
            dispatcher,
        };
        client.reconnect();
        Ok(client)
    }

    pub fn outbox(&self) -> NetOutbox {
        NetOutbox {
            requests: self.requests.clone(),
        }
    }

    /// Deliver queued network events to `session`. Call once per tick.
    pub fn pump<S: SessionEvents + 'static>(&mut self, session: &mut S) -> usize {
        self.dispatcher.drain(session)
    }

    /// Events waiting for the next pump.
    pub fn pending_events(&self) -> usize {
        self.dispatcher.pending()
    }

    pub fn state(&self) -> ConnectionState {
        self.manager.state()
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Ask for a connect attempt. Returns `false` once the driver is gone.
    pub fn reconnect(&self) -> bool {
        self.requests.send(Request::Connect).is_ok()
    }

    /// Drop the current connection; the next send reconnects.
    pub fn close(&self) -> bool {
        self.requests.send(Request::Close).is_ok()
    }

    /// Close the connection, stop the driver, and tear down the runtime.
    pub fn shutdown(self) {
        let Self {
            rt,
            manager,
            requests,
            dispatcher,
        } = self;
        drop(requests);
        rt.block_on(manager.shutdown());
        rt.shutdown_timeout(SHUTDOWN_GRACE);
        debug!(unhandled = dispatcher.pending(), "network client stopped");
    }
}

/// Executes requests one at a time, so sends keep their posting order.
struct Driver {
    manager: ConnectionManager,
    host: String,
    port: u16,
    events: SessionHandle,
    rx: mpsc::UnboundedReceiver<Request>,
}

impl Driver {
    async fn run(mut self) {
        while let Some(request) = self.rx.recv().await {
            match request {
                Request::Connect => self.connect().await,
                Request::Send(msg) => self.send(msg).await,
                Request::Close => self.manager.close().await,
            }
        }
        debug!("request channel closed, driver exiting");
        self.manager.shutdown().await;
    }

    async fn connect(&self) {
        if let Err(e) = self.manager.connect(&self.host, self.port).await {
            warn!(error = %e, "connect failed");
            self.events.enqueue(move |s| s.connect_failed(e));
        }
    }

    async fn send(&self, msg: Message) {
        let action = msg.action;
        if !self.manager.is_connected() {
            info!(%action, "not connected, reconnecting before send");
            if let Err(e) = self.manager.connect(&self.host, self.port).await {
                warn!(%action, error = %e, "reconnect failed, dropping message");
                self.events.enqueue(move |s| s.send_abandoned(action, e));
                return;
            }
        }

        let frame = match encode(&msg) {
            Ok(frame) => frame,
            Err(e) => {
                error!(%action, error = %e, "failed to encode message");
                return;
            }
        };
        match self.manager.send(&frame).await {
            Ok(()) => {}
            // The connection dropped between the reconnect and the write; the
            // teardown already reported it.
            Err(SendError::NotConnected) => warn!(%action, "connection gone before send"),
            Err(SendError::Io(e)) => warn!(%action, error = %e, "send failed"),
        }
    }
}
