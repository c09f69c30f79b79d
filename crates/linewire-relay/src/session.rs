use std::fmt;
use std::io::{Read, Write};

use tracing::{debug, warn};

use crate::error::{RelayError, Result};
use crate::pump::{run_direction, Direction, PumpReport};
use crate::shutdown::ShutdownFlag;

/// Session lifecycle. A session half-closes when one direction reaches
/// end-of-stream and only closes once both directions have terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    HalfClosed,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Open => "open",
            SessionState::HalfClosed => "half-closed",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Per-direction delivery counters for a completed session.
#[derive(Debug, Default, Clone, Copy)]
pub struct SessionReport {
    pub forward: PumpReport,
    pub reverse: PumpReport,
}

/// Run two independent directions as one duplex session.
///
/// The reverse direction runs on its own thread, the forward direction on
/// the caller's. Each direction ends on its own end-of-stream; completing a
/// direction drops its sink, so half-close propagates through the transport
/// (e.g. a TCP write-half shutdown) and the counterpart sees EOF on its own
/// terms. The counterpart is always joined before this returns, and its
/// failure, like the caller-side direction's, fails the whole session.
pub fn run_duplex<R1, W1, R2, W2>(
    forward: Direction<R1, W1>,
    reverse: Direction<R2, W2>,
    shutdown: &ShutdownFlag,
) -> Result<SessionReport>
where
    R1: Read,
    W1: Write,
    R2: Read + Send,
    W2: Write + Send,
{
    let forward_label = forward.label;
    let reverse_label = reverse.label;
    debug!(
        forward = forward_label,
        reverse = reverse_label,
        state = %SessionState::Open,
        "session opened"
    );

    let (forward_result, reverse_result) = std::thread::scope(|scope| {
        let counterpart = scope.spawn(|| run_direction(reverse, shutdown));

        let forward_result = run_direction(forward, shutdown);
        debug!(
            direction = forward_label,
            state = %SessionState::HalfClosed,
            "direction ended; waiting for counterpart"
        );

        let reverse_result = match counterpart.join() {
            Ok(result) => result,
            Err(_) => Err(RelayError::Panicked {
                label: reverse_label,
            }),
        };
        (forward_result, reverse_result)
    });

    debug!(state = %SessionState::Closed, "session closed");

    match (forward_result, reverse_result) {
        (Ok(forward), Ok(reverse)) => Ok(SessionReport { forward, reverse }),
        (Err(err), Ok(_)) => Err(err),
        (Ok(_), Err(err)) => Err(err),
        (Err(err), Err(reverse_err)) => {
            warn!(error = %reverse_err, "counterpart direction also failed");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, ErrorKind};
    use std::sync::{Arc, Mutex};

    use crate::pump::PumpMode;
    use crate::transform::Transform;

    use super::*;

    #[derive(Clone)]
    struct SharedSink {
        output: Arc<Mutex<Vec<u8>>>,
    }

    impl SharedSink {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let output = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    output: Arc::clone(&output),
                },
                output,
            )
        }
    }

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.output.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn both_directions_complete_independently() {
        let shutdown = ShutdownFlag::new();
        let (forward_sink, forward_out) = SharedSink::new();
        let (reverse_sink, reverse_out) = SharedSink::new();

        let forward = Direction {
            label: "forward",
            source: Cursor::new(b"to-peer\n".to_vec()),
            sink: forward_sink,
            mode: PumpMode::framed(32),
        };
        let reverse = Direction {
            label: "reverse",
            source: Cursor::new(b"from-peer\n".to_vec()),
            sink: reverse_sink,
            mode: PumpMode::raw(),
        };

        let report = run_duplex(forward, reverse, &shutdown).unwrap();
        assert_eq!(forward_out.lock().unwrap().as_slice(), b"to-peer\n");
        assert_eq!(reverse_out.lock().unwrap().as_slice(), b"from-peer\n");
        assert_eq!(report.forward.forwarded, 1);
        assert_eq!(report.reverse.forwarded, 1);
    }

    #[test]
    #[cfg(unix)]
    fn duplex_over_socket_pair_with_half_close() {
        // Forward doubles stdin-style records into one end of a socket pair;
        // the server side echoes what it read back before closing; reverse
        // drains the response. Dropping the forward sink half-closes so the
        // server sees EOF and the session winds down without signaling.
        let shutdown = ShutdownFlag::new();
        let (client, server) = std::os::unix::net::UnixStream::pair().unwrap();
        let server_reader = server.try_clone().unwrap();

        let server_thread = std::thread::spawn(move || {
            let mut received = Vec::new();
            let mut reader = server_reader;
            std::io::Read::read_to_end(&mut reader, &mut received).unwrap();
            let mut writer = server;
            writer.write_all(&received).unwrap();
            writer.shutdown(std::net::Shutdown::Write).unwrap();
            received
        });

        let client_reader = client.try_clone().unwrap();
        let (reverse_sink, reverse_out) = SharedSink::new();

        let forward = Direction {
            label: "forward",
            source: Cursor::new(b"a\nb\n".to_vec()),
            sink: HalfClosingSink { inner: client },
            mode: PumpMode::doubler(16),
        };
        let reverse = Direction {
            label: "reverse",
            source: client_reader,
            sink: reverse_sink,
            mode: PumpMode::raw(),
        };

        let report = run_duplex(forward, reverse, &shutdown).unwrap();
        let echoed = server_thread.join().unwrap();

        assert_eq!(echoed, b"a\na\nb\nb\n");
        assert_eq!(reverse_out.lock().unwrap().as_slice(), b"a\na\nb\nb\n");
        assert_eq!(report.forward.forwarded, 2);
    }

    struct HalfClosingSink {
        inner: std::os::unix::net::UnixStream,
    }

    impl Write for HalfClosingSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.inner.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.inner.flush()
        }
    }

    impl Drop for HalfClosingSink {
        fn drop(&mut self) {
            let _ = self.inner.shutdown(std::net::Shutdown::Write);
        }
    }

    #[test]
    fn counterpart_failure_propagates_after_join() {
        let shutdown = ShutdownFlag::new();

        let forward = Direction {
            label: "forward",
            source: Cursor::new(b"fine\n".to_vec()),
            sink: Vec::new(),
            mode: PumpMode::framed(16),
        };
        let reverse = Direction {
            label: "reverse",
            source: Cursor::new(b"doomed\n".to_vec()),
            sink: BrokenPipeSink,
            mode: PumpMode::framed(16),
        };

        let err = run_duplex(forward, reverse, &shutdown).unwrap_err();
        assert!(matches!(
            err,
            RelayError::Direction {
                label: "reverse",
                ..
            }
        ));
    }

    struct BrokenPipeSink;

    impl Write for BrokenPipeSink {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn concurrent_sessions_are_isolated() {
        // Two sessions with different capacities over the same input: each
        // framer is confined to its owning task, so the small-capacity
        // session overflows while the other does not.
        let input = b"0123456789abcdef\nshort\n";
        let handles: Vec<_> = [8usize, 64]
            .into_iter()
            .map(|capacity| {
                std::thread::spawn(move || {
                    let shutdown = ShutdownFlag::new();
                    let (sink, out) = SharedSink::new();
                    let direction = Direction {
                        label: "isolated",
                        source: Cursor::new(input.to_vec()),
                        sink,
                        mode: PumpMode::Framed {
                            capacity,
                            copies: 1,
                            transform: Transform::Passthrough,
                        },
                    };
                    let report = run_direction(direction, &shutdown).unwrap();
                    let collected = out.lock().unwrap().clone();
                    (report, collected)
                })
            })
            .collect();

        let mut results = handles.into_iter().map(|h| h.join().unwrap());
        let (small_report, small_out) = results.next().unwrap();
        let (large_report, large_out) = results.next().unwrap();

        assert_eq!(small_out, b"short\n");
        assert_eq!(small_report.framing.overflows, 2);
        assert_eq!(large_out, b"0123456789abcdef\nshort\n");
        assert_eq!(large_report.framing.overflows, 0);
    }
}
