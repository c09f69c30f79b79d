use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// UDP datagram transport.
///
/// Datagram mode bypasses line framing: each datagram is already a discrete
/// unit, so drivers forward datagrams whole.
pub struct UdpTransport {
    socket: UdpSocket,
    local_addr: SocketAddr,
}

impl UdpTransport {
    /// Bind a datagram socket on `addr`.
    pub fn bind(addr: impl ToSocketAddrs + std::fmt::Display) -> Result<Self> {
        let socket = UdpSocket::bind(&addr).map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;
        let local_addr = socket.local_addr().map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;
        info!(%local_addr, "listening for udp datagrams");
        Ok(Self { socket, local_addr })
    }

    /// Receive one datagram, retrying transient interruptions.
    pub fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        loop {
            match self.socket.recv_from(buf) {
                Ok(received) => return Ok(received),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    /// Send one datagram to `peer`.
    pub fn send_to(&self, data: &[u8], peer: SocketAddr) -> Result<usize> {
        self.socket
            .send_to(data, peer)
            .map_err(TransportError::Io)
    }

    /// The address this transport is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "udp-socket"
    }
}

/// A connected datagram socket adapted to `Read` + `Write`.
///
/// Each `read` yields exactly one datagram (truncated to the buffer if
/// oversized, per recvfrom semantics) and each `write` sends its span as
/// exactly one datagram, so the relay pumps can drive datagram peers
/// unchanged.
pub struct DatagramStream {
    socket: UdpSocket,
}

impl DatagramStream {
    /// Bind an ephemeral local socket and connect it to `peer`.
    pub fn connect(peer: impl ToSocketAddrs + std::fmt::Display) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").map_err(|e| TransportError::Bind {
            addr: "0.0.0.0:0".to_string(),
            source: e,
        })?;
        socket.connect(&peer).map_err(|e| TransportError::Connect {
            addr: peer.to_string(),
            source: e,
        })?;
        debug!(peer = %peer, "connected datagram socket");
        Ok(Self { socket })
    }

    /// Clone the underlying socket so two directions can run independently.
    pub fn try_clone(&self) -> Result<Self> {
        let socket = self.socket.try_clone()?;
        Ok(Self { socket })
    }

    /// The local address of the connected socket.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(TransportError::Io)
    }

    /// Bound the blocking time of each `read`.
    ///
    /// Datagram sockets have no end-of-stream; a drain loop needs a timeout
    /// to notice that its counterpart direction has finished.
    pub fn set_read_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        self.socket
            .set_read_timeout(timeout)
            .map_err(TransportError::Io)
    }
}

impl Read for DatagramStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.socket.recv(buf)
    }
}

impl Write for DatagramStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.socket.send(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
