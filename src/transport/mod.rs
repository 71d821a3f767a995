//! Transport module - duplex byte streams over TCP and UDP.
//!
//! Both transports implement the [`Transport`] trait and report lifecycle
//! through a [`TransportEvent`] channel returned by their `start`
//! constructors:
//!
//! - `Connect` — peer established, writes now reach the wire
//! - `Data` — chunk of bytes from the peer, in the peer's send order
//! - `Error` — runtime fault (timeout, unexpected disconnect, socket error)
//! - `Close` — transport fully torn down, no further events
//!
//! `Connect` fires exactly once per successful handshake and `Close` at
//! most once per teardown. A transport that errors is terminal; callers
//! recreate it to retry (reconnection policy lives with the supervisor,
//! not here).

mod tcp;
mod udp;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Result, WireError};

pub use tcp::TcpTransport;
pub use udp::UdpTransport;

/// Host used when none is configured (server role peers, local testing).
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Capacity of the event and command channels.
pub(crate) const CHANNEL_CAPACITY: usize = 64;

/// Configuration shared by both transports.
///
/// Role follows from `host`: absent means server (listen/bind on `port`),
/// present means client (connect/send to `host:port`). The idle timeout
/// applies to TCP only; `None` disables it.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Target port, 1-65535.
    pub port: u16,
    /// Remote host for client role; `None` selects server role.
    pub host: Option<String>,
    /// Idle timeout; `None` disables liveness detection.
    pub timeout: Option<Duration>,
}

impl TransportConfig {
    /// Server-role configuration listening on `port`.
    pub fn server(port: u16) -> Self {
        Self {
            port,
            host: None,
            timeout: None,
        }
    }

    /// Client-role configuration targeting `host:port`.
    pub fn client(port: u16, host: impl Into<String>) -> Self {
        Self {
            port,
            host: Some(host.into()),
            timeout: None,
        }
    }

    /// Set the idle timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Whether this configuration selects the server role.
    #[inline]
    pub fn is_server(&self) -> bool {
        self.host.is_none()
    }

    /// The peer host, falling back to [`DEFAULT_HOST`].
    pub fn peer_host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    /// Reject out-of-domain parameters.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(WireError::Config("port must be in 1..=65535".into()));
        }
        if let Some(host) = &self.host {
            if host.is_empty() {
                return Err(WireError::Config("host must not be empty".into()));
            }
        }
        Ok(())
    }
}

/// Lifecycle and data events emitted by a transport.
#[derive(Debug)]
pub enum TransportEvent {
    /// Peer established; writes are now delivered.
    Connect,
    /// Bytes received from the peer, order preserved.
    Data(Bytes),
    /// Runtime fault; the transport tears itself down afterwards.
    Error(WireError),
    /// Transport fully torn down; no further events will fire.
    Close,
}

/// Duplex byte-stream transport pinned to a single peer.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send bytes to the current peer.
    ///
    /// A no-op (not an error) while no peer is connected: telemetry
    /// producers must not crash on a momentarily absent receiver.
    async fn write(&self, data: Bytes) -> Result<()>;

    /// Initiate graceful shutdown. The peer-initiated close that follows
    /// is expected and not reported as an error.
    async fn end(&self);

    /// Whether a peer is currently connected.
    fn is_connected(&self) -> bool;
}

/// Connection state shared between a transport handle and its I/O task.
///
/// A plain value struct embedded by both concrete transports.
#[derive(Debug, Default)]
pub(crate) struct LinkState {
    connected: AtomicBool,
    closing: AtomicBool,
}

impl LinkState {
    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Mark that a peer-initiated close is now expected.
    pub(crate) fn mark_closing(&self) {
        self.closing.store(true, Ordering::Release);
    }

    pub(crate) fn is_closing(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }
}

/// Commands from a transport handle to its I/O task.
#[derive(Debug)]
pub(crate) enum Command {
    Write(Bytes),
    End,
}

/// Send an event, ignoring a dropped receiver.
pub(crate) async fn emit(events: &mpsc::Sender<TransportEvent>, event: TransportEvent) {
    if events.send(event).await.is_err() {
        debug!("event receiver dropped");
    }
}
