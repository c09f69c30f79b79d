use std::net::{SocketAddr, TcpStream};

use linewire_relay::{run_direction, Direction, PumpMode, RelayError, ShutdownFlag};
use linewire_transport::{tcp, TcpTransport, UdpTransport};
use tracing::{info, warn};

use crate::cmd::{install_shutdown_handler, ServeArgs, ServeMode};
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: ServeArgs, _format: OutputFormat) -> CliResult<i32> {
    let shutdown = install_shutdown_handler()?;
    if args.udp {
        serve_datagrams(&args, &shutdown)
    } else {
        serve_streams(&args, &shutdown)
    }
}

fn serve_streams(args: &ServeArgs, shutdown: &ShutdownFlag) -> CliResult<i32> {
    let transport = TcpTransport::bind(format!("0.0.0.0:{}", args.port))
        .map_err(|err| transport_error("bind failed", err))?;

    while !shutdown.is_set() {
        let (stream, peer) = transport
            .accept()
            .map_err(|err| transport_error("accept failed", err))?;

        // One task per session: a failing or slow peer must never take the
        // listener down with it.
        let session_shutdown = shutdown.clone();
        let mode = args.mode;
        let capacity = args.capacity;
        std::thread::spawn(move || {
            info!(%peer, "session started");
            match serve_session(stream, mode, capacity, &session_shutdown) {
                Ok(records) => info!(%peer, records, "session complete"),
                Err(err) => warn!(%peer, error = %err, "session failed"),
            }
        });
    }

    Ok(SUCCESS)
}

fn serve_session(
    stream: TcpStream,
    mode: ServeMode,
    capacity: usize,
    shutdown: &ShutdownFlag,
) -> Result<u64, RelayError> {
    let (read_half, write_half) = tcp::split(stream)
        .map_err(|err| RelayError::direction("session", std::io::Error::other(err)))?;

    let report = match mode {
        ServeMode::Double => run_direction(
            Direction {
                label: "session",
                source: read_half,
                sink: write_half,
                mode: PumpMode::doubler(capacity),
            },
            shutdown,
        )?,
        ServeMode::Echo => run_direction(
            Direction {
                label: "session",
                source: read_half,
                sink: write_half,
                mode: PumpMode::framed(capacity),
            },
            shutdown,
        )?,
        ServeMode::Sink => {
            // Nothing flows back; close the write side up front.
            drop(write_half);
            run_direction(
                Direction {
                    label: "session",
                    source: read_half,
                    sink: std::io::sink(),
                    mode: PumpMode::raw(),
                },
                shutdown,
            )?
        }
    };

    Ok(report.forwarded)
}

fn serve_datagrams(args: &ServeArgs, shutdown: &ShutdownFlag) -> CliResult<i32> {
    let transport = UdpTransport::bind(format!("0.0.0.0:{}", args.port))
        .map_err(|err| transport_error("bind failed", err))?;

    let copies = match args.mode {
        ServeMode::Double => 2,
        ServeMode::Echo => 1,
        ServeMode::Sink => 0,
    };
    let mut buf = vec![0u8; args.capacity];

    while !shutdown.is_set() {
        let (len, peer) = transport
            .recv_from(&mut buf)
            .map_err(|err| transport_error("receive failed", err))?;

        // A reply failure dooms one datagram, not the server.
        if let Err(err) = reply_datagram(&transport, &buf[..len], peer, copies) {
            warn!(%peer, error = %err, "reply failed");
        }
    }

    Ok(SUCCESS)
}

fn reply_datagram(
    transport: &UdpTransport,
    datagram: &[u8],
    peer: SocketAddr,
    copies: u32,
) -> linewire_transport::Result<()> {
    for _ in 0..copies {
        transport.send_to(datagram, peer)?;
    }
    Ok(())
}
