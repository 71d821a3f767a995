//! # dronewire
//!
//! Binary wire protocol and transport layer linking a remote vehicle to an
//! operator display over unreliable, bandwidth-constrained links.
//!
//! The crate has three layers:
//!
//! - **Frame codec** ([`protocol::codec`]): pure functions turning typed
//!   [`State`]/[`Control`] payloads into compact fixed-size tagged frames
//!   and back. A state frame is 16 bytes, a control frame 9.
//! - **Stream decoder** ([`StreamDecoder`]): stateful reassembler that
//!   consumes byte chunks of arbitrary size (as TCP/UDP deliver them),
//!   buffers partial frames, and emits fully decoded payloads. Unparseable
//!   leading bytes are dropped so the stream recovers from corruption.
//! - **Transports** ([`TcpTransport`], [`UdpTransport`]): duplex byte
//!   streams behind one [`Transport`] interface with connect/data/error/
//!   close events, in server or client role, pinned to a single peer.
//!
//! ## Example
//!
//! ```ignore
//! use dronewire::{codec, Control, Payload, Transport, TransportConfig, TcpTransport};
//!
//! #[tokio::main]
//! async fn main() -> dronewire::Result<()> {
//!     let config = TransportConfig::client(9000, "10.0.0.2");
//!     let (transport, mut events) = TcpTransport::start(config).await?;
//!
//!     let frame = codec::encode(&Payload::Control(Control {
//!         attitude: [0.0, 0.0, 0.0, 1.0],
//!     }))?;
//!     transport.write(frame).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod protocol;
pub mod transport;

pub use error::{Result, WireError};
pub use protocol::stream::StreamDecoder;
pub use protocol::{codec, Control, Payload, State, Tag, Temperatures};
pub use transport::{TcpTransport, Transport, TransportConfig, TransportEvent, UdpTransport};
