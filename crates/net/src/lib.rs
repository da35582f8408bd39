//! Network layer for the tic-tac-toe client.
//!
//! - [`connection`]: the single TCP connection and its lifecycle
//! - [`receive`]: per-connection read, frame, and decode loop
//! - [`dispatcher`]: hands network events to the consumer thread in order
//! - [`runtime`]: sync bridge owning the tokio runtime
//! - [`config`]: environment-driven client configuration
//!
//! The consumer thread never blocks on I/O. It posts messages through a
//! [`NetOutbox`] and calls [`NetClient::pump`] once per tick to receive
//! whatever happened on the network since the last tick.

pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod receive;
pub mod runtime;

pub use tui_tictactoe_core as core;
pub use tui_tictactoe_protocol as protocol;
pub use tui_tictactoe_types as types;

pub use config::{parse_port, ClientConfig, ConfigError};
pub use connection::{ConnectOptions, ConnectionManager};
pub use dispatcher::{DispatchHandle, Dispatcher, SessionDispatcher, SessionHandle};
pub use receive::{LoopExit, ReceiveLoop};
pub use runtime::{NetClient, NetOutbox};
