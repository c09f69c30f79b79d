//! Byte-channel adapters over POSIX transports.
//!
//! Provides the concrete sources and sinks the line drivers run over:
//! - Named FIFOs at caller-chosen filesystem paths
//! - TCP stream sockets (listener and client side)
//! - UDP datagram sockets (datagram mode bypasses line framing)
//!
//! This is the lowest layer of linewire. Everything returned here implements
//! `std::io::Read` / `std::io::Write`, so the framing and relay layers stay
//! transport-agnostic.

pub mod error;
pub mod tcp;
pub mod udp;

#[cfg(unix)]
pub mod fifo;

pub use error::{Result, TransportError};
pub use tcp::{TcpTransport, WriteHalf};
pub use udp::{DatagramStream, UdpTransport};

#[cfg(unix)]
pub use fifo::Fifo;
