use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use linewire_frame::RecordWriter;
use linewire_relay::{
    run_direction, run_duplex, Direction, PumpMode, ShutdownFlag, RAW_CHUNK_SIZE,
};
use linewire_transport::{tcp, DatagramStream, TcpTransport};
use tracing::info;

use crate::cmd::{install_shutdown_handler, RelayArgs};
use crate::exit::{frame_error, io_error, relay_error, transport_error, CliError, CliResult, FAILURE, SUCCESS};
use crate::output::OutputFormat;

// How long the datagram drain waits between polls of the done flag.
const DATAGRAM_POLL: Duration = Duration::from_millis(250);

pub fn run(args: RelayArgs, _format: OutputFormat) -> CliResult<i32> {
    let shutdown = install_shutdown_handler()?;
    let addr = format!("{}:{}", args.host, args.port);

    if args.udp {
        relay_datagrams(&addr, args.capacity, &shutdown)
    } else {
        relay_stream(&addr, args.capacity, &shutdown)
    }
}

fn relay_stream(addr: &str, capacity: usize, shutdown: &ShutdownFlag) -> CliResult<i32> {
    let stream =
        TcpTransport::connect(addr).map_err(|err| transport_error("connect failed", err))?;
    let (read_half, write_half) =
        tcp::split(stream).map_err(|err| transport_error("stream split failed", err))?;

    let report = run_duplex(
        Direction {
            label: "forward",
            source: std::io::stdin(),
            sink: write_half,
            mode: PumpMode::framed(capacity),
        },
        Direction {
            label: "reverse",
            source: read_half,
            sink: std::io::stdout(),
            mode: PumpMode::raw(),
        },
        shutdown,
    )
    .map_err(|err| relay_error("relay session failed", err))?;

    info!(
        sent = report.forward.forwarded,
        received_chunks = report.reverse.forwarded,
        "relay complete"
    );
    Ok(SUCCESS)
}

fn relay_datagrams(addr: &str, capacity: usize, shutdown: &ShutdownFlag) -> CliResult<i32> {
    let stream =
        DatagramStream::connect(addr).map_err(|err| transport_error("connect failed", err))?;
    let reverse = stream
        .try_clone()
        .map_err(|err| transport_error("socket clone failed", err))?;
    reverse
        .set_read_timeout(Some(DATAGRAM_POLL))
        .map_err(|err| transport_error("socket timeout setup failed", err))?;

    // Datagram sockets never signal end-of-stream, so the response drain
    // winds down through a flag raised once the forward direction is done.
    let done = ShutdownFlag::new();
    let drain_handle = std::thread::spawn({
        let done = done.clone();
        let shutdown = shutdown.clone();
        move || drain_datagrams(reverse, std::io::stdout(), &done, &shutdown)
    });

    let forward_result = run_direction(
        Direction {
            label: "forward",
            source: std::io::stdin(),
            sink: stream,
            mode: PumpMode::framed(capacity),
        },
        shutdown,
    );

    done.request();
    let drain_result = drain_handle
        .join()
        .map_err(|_| CliError::new(FAILURE, "response reader panicked"))?;

    let forward_report =
        forward_result.map_err(|err| relay_error("relay session failed", err))?;
    let received = drain_result?;

    info!(
        sent = forward_report.forwarded,
        received,
        "relay complete"
    );
    Ok(SUCCESS)
}

fn drain_datagrams(
    mut source: DatagramStream,
    sink: impl Write,
    done: &ShutdownFlag,
    shutdown: &ShutdownFlag,
) -> CliResult<u64> {
    let mut writer = RecordWriter::new(sink);
    let mut buf = [0u8; RAW_CHUNK_SIZE];
    let mut received = 0u64;

    while !shutdown.is_set() {
        match source.read(&mut buf) {
            Ok(0) => continue,
            Ok(n) => {
                writer
                    .write_record(&buf[..n])
                    .map_err(|err| frame_error("response write failed", err))?;
                writer
                    .flush()
                    .map_err(|err| frame_error("response write failed", err))?;
                received += 1;
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err)
                if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
            {
                if done.is_set() {
                    break;
                }
            }
            Err(err) => return Err(io_error("response read failed", err)),
        }
    }

    Ok(received)
}
