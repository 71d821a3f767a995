//! TCP transport - connection-oriented, server or client role.
//!
//! A server binds its listening socket at [`TcpTransport::start`] and
//! adopts the first incoming connection as its single peer; connection
//! attempts while a peer is active are accepted and dropped silently.
//! After teardown the listener is closed too, so a server carries exactly
//! one connection in its lifetime. A client connects out to `host:port`.
//!
//! Either role installs the optional idle timeout, disables Nagle's
//! algorithm for low latency, and reports lifecycle through the event
//! channel. A peer FIN that arrives while [`Transport::end`] was not
//! called is surfaced as [`WireError::UnexpectedClose`] before the final
//! `Close`, letting callers distinguish graceful from abrupt disconnects.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::ReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use crate::error::{Result, WireError};

use super::{emit, Command, LinkState, Transport, TransportConfig, TransportEvent, CHANNEL_CAPACITY};

/// Socket read buffer size.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// TCP implementation of the [`Transport`] interface.
pub struct TcpTransport {
    link: Arc<LinkState>,
    cmd_tx: mpsc::Sender<Command>,
}

impl TcpTransport {
    /// Start the transport and return it with its event channel.
    ///
    /// Server role binds the listener before returning, so bind failures
    /// surface here rather than as an event. Client role connects in the
    /// background; a failed connect is reported as `Error` then `Close`.
    pub async fn start(
        config: TransportConfig,
    ) -> Result<(Self, mpsc::Receiver<TransportEvent>)> {
        config.validate()?;

        let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let link = Arc::new(LinkState::default());

        if config.is_server() {
            let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
            debug!(port = config.port, "tcp transport listening");
            tokio::spawn(run_server(
                listener,
                config,
                Arc::clone(&link),
                cmd_rx,
                event_tx,
            ));
        } else {
            tokio::spawn(run_client(config, Arc::clone(&link), cmd_rx, event_tx));
        }

        Ok((Self { link, cmd_tx }, event_rx))
    }
}

#[async_trait]
impl Transport for TcpTransport {
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

/// Wait for the single peer, then run the connection until teardown.
async fn run_server(
    listener: TcpListener,
    config: TransportConfig,
    link: Arc<LinkState>,
    mut cmd_rx: mpsc::Receiver<Command>,
    event_tx: mpsc::Sender<TransportEvent>,
) {
    let stream = loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    debug!(%addr, "peer connected");
                    break stream;
                }
                Err(e) => {
                    emit(&event_tx, TransportEvent::Error(e.into())).await;
                    emit(&event_tx, TransportEvent::Close).await;
                    return;
                }
            },
            cmd = cmd_rx.recv() => match cmd {
                // Writes are no-ops until a peer exists.
                Some(Command::Write(_)) => continue,
                Some(Command::End) | None => {
                    debug!("server closed before any peer connected");
                    emit(&event_tx, TransportEvent::Close).await;
                    return;
                }
            },
        }
    };

    run_connection(stream, Some(listener), &config, &link, cmd_rx, &event_tx).await;
}

/// Connect out to the configured peer, then run the connection.
async fn run_client(
    config: TransportConfig,
    link: Arc<LinkState>,
    cmd_rx: mpsc::Receiver<Command>,
    event_tx: mpsc::Sender<TransportEvent>,
) {
    let stream = match TcpStream::connect((config.peer_host(), config.port)).await {
        Ok(stream) => stream,
        Err(e) => {
            emit(&event_tx, TransportEvent::Error(e.into())).await;
            emit(&event_tx, TransportEvent::Close).await;
            return;
        }
    };

    run_connection(stream, None, &config, &link, cmd_rx, &event_tx).await;
}

/// Drive an adopted connection: reads become `Data` events, commands
/// become writes, faults end the transport. Emits `Connect` on entry and
/// exactly one `Close` on exit.
async fn run_connection(
    mut stream: TcpStream,
    listener: Option<TcpListener>,
    config: &TransportConfig,
    link: &LinkState,
    mut cmd_rx: mpsc::Receiver<Command>,
    event_tx: &mpsc::Sender<TransportEvent>,
) {
    if let Err(e) = stream.set_nodelay(true) {
        warn!("set_nodelay failed: {e}");
    }

    link.set_connected(true);
    emit(event_tx, TransportEvent::Connect).await;

    let idle = config.timeout;
    let (mut reader, mut writer) = stream.split();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut fault: Option<WireError> = None;
    let mut accept_cmds = true;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv(), if accept_cmds => match cmd {
                Some(Command::Write(data)) => {
                    if let Err(e) = writer.write_all(&data).await {
                        fault = Some(e.into());
                        break;
                    }
                }
                Some(Command::End) | None => {
                    // Half-close: send FIN, keep draining until the peer
                    // closes its side. No commands matter past this point.
                    accept_cmds = false;
                    link.mark_closing();
                    let _ = writer.shutdown().await;
                }
            },
            read = read_chunk(&mut reader, &mut buf, idle) => match read {
                Ok(0) => {
                    if !link.is_closing() {
                        fault = Some(WireError::UnexpectedClose);
                    }
                    break;
                }
                Ok(n) => {
                    emit(event_tx, TransportEvent::Data(Bytes::copy_from_slice(&buf[..n]))).await;
                }
                Err(e) => {
                    fault = Some(e);
                    break;
                }
            },
            extra = accept_extra(listener.as_ref()) => {
                if let Ok((socket, addr)) = extra {
                    debug!(%addr, "ignoring connection attempt while peer active");
                    drop(socket);
                }
            }
        }
    }

    if let Some(err) = fault {
        emit(event_tx, TransportEvent::Error(err)).await;
    }

    link.mark_closing();
    link.set_connected(false);
    // Server role: no further accepts after the lifetime connection.
    drop(listener);
    emit(event_tx, TransportEvent::Close).await;
}

/// Read one chunk, bounded by the idle timeout when configured.
async fn read_chunk(
    reader: &mut ReadHalf<'_>,
    buf: &mut [u8],
    idle: Option<Duration>,
) -> Result<usize> {
    match idle {
        Some(dur) => match timeout(dur, reader.read(buf)).await {
            Ok(read) => read.map_err(Into::into),
            Err(_) => Err(WireError::Timeout(dur.as_millis() as u64)),
        },
        None => reader.read(buf).await.map_err(Into::into),
    }
}

/// Accept (and let the caller drop) surplus connections on a server;
/// pends forever for a client.
async fn accept_extra(listener: Option<&TcpListener>) -> std::io::Result<(TcpStream, SocketAddr)> {
    match listener {
        Some(listener) => listener.accept().await,
        None => std::future::pending().await,
    }
}
