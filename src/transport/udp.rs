//! UDP transport - datagram socket with a peer-pinning handshake.
//!
//! UDP has no connection concept, so a minimal handshake emulates one: a
//! client sends a one-byte probe to `host:port` as soon as its socket is
//! bound; a server pins the sender of the first datagram it sees as its
//! peer, echoes the probe back, and both sides then emit `Connect`.
//! Handshake datagrams are never surfaced as `Data`.
//!
//! After the handshake, datagrams from any other address are discarded
//! silently. That defends against cross-talk on a shared port, not
//! against spoofing. There is deliberately no idle timeout and no `Close`
//! event in this minimal contract; [`Transport::end`] tears the task down
//! without ceremony.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::net::{lookup_host, UdpSocket};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Result, WireError};

use super::{emit, Command, LinkState, Transport, TransportConfig, TransportEvent, CHANNEL_CAPACITY};

/// Handshake probe byte. The value is arbitrary; probe datagrams are
/// swallowed before tag interpretation.
const PROBE: u8 = 0x5A;

/// Datagram receive buffer size.
const RECV_BUFFER_SIZE: usize = 64 * 1024;

/// UDP implementation of the [`Transport`] interface.
pub struct UdpTransport {
    link: Arc<LinkState>,
    cmd_tx: mpsc::Sender<Command>,
}

impl UdpTransport {
    /// Start the transport and return it with its event channel.
    ///
    /// Server role binds the configured port; client role binds an
    /// ephemeral port and immediately sends the handshake probe. Bind,
    /// resolve, and probe-send failures surface here.
    pub async fn start(
        config: TransportConfig,
    ) -> Result<(Self, mpsc::Receiver<TransportEvent>)> {
        config.validate()?;

        let (socket, peer) = if config.is_server() {
            let socket = UdpSocket::bind(("0.0.0.0", config.port)).await?;
            debug!(port = config.port, "udp transport bound");
            (socket, None)
        } else {
            let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
            let peer = lookup_host((config.peer_host(), config.port))
                .await?
                .next()
                .ok_or_else(|| {
                    WireError::Config(format!("cannot resolve host {}", config.peer_host()))
                })?;
            socket.send_to(&[PROBE], peer).await?;
            debug!(%peer, "udp probe sent");
            (socket, Some(peer))
        };

        let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let link = Arc::new(LinkState::default());

        tokio::spawn(run(socket, peer, Arc::clone(&link), cmd_rx, event_tx));

        Ok((Self { link, cmd_tx }, event_rx))
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn write(&self, data: Bytes) -> Result<()> {
        if !self.link.is_connected() {
            return Ok(());
        }
        self.cmd_tx
            .send(Command::Write(data))
            .await
            .map_err(|_| WireError::Closed)
    }

    async fn end(&self) {
        self.link.mark_closing();
        let _ = self.cmd_tx.send(Command::End).await;
    }

    fn is_connected(&self) -> bool {
        self.link.is_connected()
    }
}

/// Datagram loop: handshake, peer pinning, then data until teardown.
async fn run(
    socket: UdpSocket,
    mut peer: Option<SocketAddr>,
    link: Arc<LinkState>,
    mut cmd_rx: mpsc::Receiver<Command>,
    event_tx: mpsc::Sender<TransportEvent>,
) {
    // A client starts with its peer pinned but not yet connected; a
    // server pins whoever speaks first.
    let is_server = peer.is_none();
    let mut buf = vec![0u8; RECV_BUFFER_SIZE];

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(Command::Write(data)) => {
                    // Only reachable while connected, so peer is pinned.
                    let Some(to) = peer else { continue };
                    if let Err(e) = socket.send_to(&data, to).await {
                        emit(&event_tx, TransportEvent::Error(e.into())).await;
                        break;
                    }
                }
                Some(Command::End) | None => {
                    debug!("udp transport ending");
                    break;
                }
            },
            received = socket.recv_from(&mut buf) => {
                let (len, from) = match received {
                    Ok(pair) => pair,
                    Err(e) => {
                        emit(&event_tx, TransportEvent::Error(e.into())).await;
                        break;
                    }
                };

                if !link.is_connected() {
                    if let Err(e) = handshake(&socket, &mut peer, is_server, from, &link, &event_tx).await {
                        emit(&event_tx, TransportEvent::Error(e)).await;
                        break;
                    }
                    continue;
                }

                if peer == Some(from) {
                    emit(&event_tx, TransportEvent::Data(Bytes::copy_from_slice(&buf[..len]))).await;
                } else {
                    debug!(%from, "dropping datagram from unpinned address");
                }
            }
        }
    }

    link.set_connected(false);
}

/// Complete the probe/echo handshake for one incoming datagram.
///
/// The datagram itself is swallowed; it never becomes a `Data` event.
/// Returns an error only for a fatal socket fault, which tears the
/// transport down.
async fn handshake(
    socket: &UdpSocket,
    peer: &mut Option<SocketAddr>,
    is_server: bool,
    from: SocketAddr,
    link: &LinkState,
    event_tx: &mpsc::Sender<TransportEvent>,
) -> Result<()> {
    if is_server {
        // First sender wins; echo the probe to finish the handshake.
        *peer = Some(from);
        socket.send_to(&[PROBE], from).await?;
        debug!(%from, "udp peer pinned");
    } else if *peer != Some(from) {
        // Not the peer we probed; stay unconnected.
        debug!(%from, "dropping pre-handshake datagram from unexpected address");
        return Ok(());
    }

    link.set_connected(true);
    emit(event_tx, TransportEvent::Connect).await;
    Ok(())
}
