use std::io::{ErrorKind, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// TCP stream transport.
///
/// Wraps the listener side with transient-error handling so one failed
/// accept never takes the listener down, and exposes connect for clients.
pub struct TcpTransport {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpTransport {
    /// Bind and listen on `addr`.
    pub fn bind(addr: impl ToSocketAddrs + std::fmt::Display) -> Result<Self> {
        let listener = TcpListener::bind(&addr).map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;
        let local_addr = listener.local_addr().map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;
        info!(%local_addr, "listening on tcp socket");
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept the next connection (blocking).
    ///
    /// Transient per-connection failures are retried; only listener-level
    /// failures are returned.
    pub fn accept(&self) -> Result<(TcpStream, SocketAddr)> {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    debug!(%peer, "accepted connection");
                    return Ok((stream, peer));
                }
                Err(err) if is_transient_accept_error(&err) => {
                    debug!(error = %err, "transient accept failure, retrying");
                    continue;
                }
                Err(err) => return Err(TransportError::Accept(err)),
            }
        }
    }

    /// Connect to a listening peer (blocking).
    pub fn connect(addr: impl ToSocketAddrs + std::fmt::Display) -> Result<TcpStream> {
        let stream = TcpStream::connect(&addr).map_err(|e| TransportError::Connect {
            addr: addr.to_string(),
            source: e,
        })?;
        debug!(addr = %addr, "connected to tcp peer");
        Ok(stream)
    }

    /// The address this transport is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "tcp-socket"
    }
}

// Failures that doom one incoming connection, not the listener itself.
fn is_transient_accept_error(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::Interrupted | ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset
    )
}

/// The write half of a split TCP stream.
///
/// Dropping it shuts down the write direction so the peer observes
/// end-of-stream, which is how a duplex session half-closes.
pub struct WriteHalf {
    inner: TcpStream,
}

impl Write for WriteHalf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl Drop for WriteHalf {
    fn drop(&mut self) {
        debug!("half-closing tcp stream (write side)");
        let _ = self.inner.shutdown(Shutdown::Write);
    }
}

/// Split a stream into independently owned read and write halves.
pub fn split(stream: TcpStream) -> Result<(TcpStream, WriteHalf)> {
    let write_clone = stream.try_clone()?;
    Ok((stream, WriteHalf { inner: write_clone }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn bind_accept_connect_roundtrip() {
        let transport = TcpTransport::bind("127.0.0.1:0").unwrap();
        let addr = transport.local_addr();

        let client_thread = std::thread::spawn(move || {
            let mut client = TcpTransport::connect(addr).unwrap();
            client.write_all(b"ping\n").unwrap();
        });

        let (mut server, _peer) = transport.accept().unwrap();
        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping\n");

        client_thread.join().unwrap();
    }

    #[test]
    fn connect_refused_reports_address() {
        // Bind then immediately drop to get a port with nothing listening.
        let port = {
            let transport = TcpTransport::bind("127.0.0.1:0").unwrap();
            transport.local_addr().port()
        };

        let result = TcpTransport::connect(format!("127.0.0.1:{port}"));
        match result {
            Err(TransportError::Connect { addr, .. }) => {
                assert!(addr.contains(&port.to_string()));
            }
            other => panic!("expected connect error, got {other:?}"),
        }
    }

    #[test]
    fn dropping_write_half_signals_eof() {
        let transport = TcpTransport::bind("127.0.0.1:0").unwrap();
        let addr = transport.local_addr();

        let client_thread = std::thread::spawn(move || {
            let client = TcpTransport::connect(addr).unwrap();
            let (mut read_half, mut write_half) = split(client).unwrap();
            write_half.write_all(b"only\n").unwrap();
            drop(write_half);

            // The read half stays usable after the write half closes.
            let mut response = Vec::new();
            read_half.read_to_end(&mut response).unwrap();
            response
        });

        let (mut server, _peer) = transport.accept().unwrap();
        let mut received = Vec::new();
        server.read_to_end(&mut received).unwrap();
        assert_eq!(received, b"only\n");

        server.write_all(b"bye\n").unwrap();
        drop(server);

        let response = client_thread.join().unwrap();
        assert_eq!(response, b"bye\n");
    }

    #[test]
    fn transient_accept_errors_classified() {
        assert!(is_transient_accept_error(&std::io::Error::from(
            ErrorKind::Interrupted
        )));
        assert!(is_transient_accept_error(&std::io::Error::from(
            ErrorKind::ConnectionAborted
        )));
        assert!(!is_transient_accept_error(&std::io::Error::from(
            ErrorKind::PermissionDenied
        )));
    }
}
