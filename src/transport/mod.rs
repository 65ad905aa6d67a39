//! Client transports the lifecycle runner drives.
//!
//! The runner only needs three operations: open a connection, send one text
//! frame, and close. They are expressed as the [`Connector`] and
//! [`Transport`] traits so sessions can run against the real WebSocket
//! client ([`WsConnector`]) or an in-memory double in tests.
//!
//! ## Example
//!
//! ```rust,ignore
//! use wsswarm::transport::{Connector, Endpoint, Transport, WsConnector};
//!
//! let endpoint = Endpoint::parse("ws://localhost:8888/ws")?;
//! let mut transport = WsConnector::default().connect(&endpoint).await?;
//! transport.send_text("hello").await?;
//! transport.close().await?;
//! ```

use std::future::Future;

use crate::error::Result;

mod endpoint;
mod ws;

#[cfg(test)]
pub(crate) mod testing;

pub use endpoint::Endpoint;
pub use ws::{WsConnector, WsTransport};

/// Opens client connections to an endpoint.
///
/// One connector is shared by every session of a swarm.
pub trait Connector: Send + Sync + 'static {
    /// The connection handle produced on success.
    type Transport: Transport;

    /// Establish a connection, including any protocol handshake.
    fn connect(&self, endpoint: &Endpoint) -> impl Future<Output = Result<Self::Transport>> + Send;
}

/// An open, exclusively owned client connection.
pub trait Transport: Send + 'static {
    /// Send one text message.
    fn send_text(&mut self, text: &str) -> impl Future<Output = Result<()>> + Send;

    /// Close the connection. Consumes the handle, so it runs at most once.
    fn close(self) -> impl Future<Output = Result<()>> + Send;
}
