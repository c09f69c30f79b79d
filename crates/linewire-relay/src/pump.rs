use std::io::{ErrorKind, Read, Write};

use bytes::BytesMut;
use linewire_frame::{FramerStats, RecordReader, RecordWriter, DEFAULT_CAPACITY};
use tracing::debug;

use crate::error::{RelayError, Result};
use crate::shutdown::ShutdownFlag;
use crate::transform::Transform;

/// Chunk size for raw (unframed) forwarding.
pub const RAW_CHUNK_SIZE: usize = 1024;

/// How a direction moves bytes from its source to its sink.
#[derive(Debug, Clone, Copy)]
pub enum PumpMode {
    /// Split the stream into newline-terminated records, transform each, and
    /// deliver it `copies` times (the doubler is `copies == 2`).
    Framed {
        capacity: usize,
        copies: u32,
        transform: Transform,
    },
    /// Forward raw chunks as they arrive, transformed but unframed.
    Raw { transform: Transform },
}

impl PumpMode {
    /// Framed forwarding, one copy per record, no transform.
    pub fn framed(capacity: usize) -> Self {
        Self::Framed {
            capacity,
            copies: 1,
            transform: Transform::Passthrough,
        }
    }

    /// Framed forwarding that delivers every record twice.
    pub fn doubler(capacity: usize) -> Self {
        Self::Framed {
            capacity,
            copies: 2,
            transform: Transform::Passthrough,
        }
    }

    /// Raw passthrough.
    pub fn raw() -> Self {
        Self::Raw {
            transform: Transform::Passthrough,
        }
    }
}

impl Default for PumpMode {
    fn default() -> Self {
        Self::framed(DEFAULT_CAPACITY)
    }
}

/// One data direction of a session: a source, a sink, and a pump mode.
///
/// The direction owns both channels; they are released when the pump
/// returns, on every exit path.
pub struct Direction<R, W> {
    pub label: &'static str,
    pub source: R,
    pub sink: W,
    pub mode: PumpMode,
}

/// What a completed direction delivered.
#[derive(Debug, Default, Clone, Copy)]
pub struct PumpReport {
    /// Units forwarded: records in framed mode, chunks in raw mode.
    pub forwarded: u64,
    /// Bytes delivered to the sink.
    pub bytes_out: u64,
    /// Framer counters (zeroed in raw mode).
    pub framing: FramerStats,
}

/// Pump one direction until end-of-stream, shutdown request, or error.
///
/// The shutdown flag is polled between units; an in-flight partial record is
/// discarded when shutdown interrupts the stream.
pub fn run_direction<R: Read, W: Write>(
    direction: Direction<R, W>,
    shutdown: &ShutdownFlag,
) -> Result<PumpReport> {
    let Direction {
        label,
        source,
        sink,
        mode,
    } = direction;

    let report = match mode {
        PumpMode::Framed {
            capacity,
            copies,
            transform,
        } => pump_framed(label, source, sink, capacity, copies, transform, shutdown)?,
        PumpMode::Raw { transform } => pump_raw(label, source, sink, transform, shutdown)?,
    };

    debug!(
        direction = label,
        forwarded = report.forwarded,
        bytes_out = report.bytes_out,
        "direction completed"
    );
    Ok(report)
}

fn pump_framed<R: Read, W: Write>(
    label: &'static str,
    source: R,
    sink: W,
    capacity: usize,
    copies: u32,
    transform: Transform,
    shutdown: &ShutdownFlag,
) -> Result<PumpReport> {
    let mut reader = RecordReader::with_capacity(source, capacity);
    let mut writer = RecordWriter::new(sink);
    let mut scratch = BytesMut::with_capacity(capacity);
    let mut report = PumpReport::default();

    while !shutdown.is_set() {
        let record = match reader.read_record() {
            Ok(Some(record)) => record,
            Ok(None) => break,
            Err(err) => return Err(RelayError::direction(label, err)),
        };

        scratch.clear();
        transform.apply(record, &mut scratch);
        for _ in 0..copies {
            writer
                .write_record(&scratch)
                .map_err(|err| RelayError::direction(label, err))?;
        }
        writer
            .flush()
            .map_err(|err| RelayError::direction(label, err))?;

        report.forwarded += 1;
        report.bytes_out += scratch.len() as u64 * u64::from(copies);
    }

    report.framing = reader.stats();
    Ok(report)
}

fn pump_raw<R: Read, W: Write>(
    label: &'static str,
    mut source: R,
    sink: W,
    transform: Transform,
    shutdown: &ShutdownFlag,
) -> Result<PumpReport> {
    let mut writer = RecordWriter::new(sink);
    let mut buf = [0u8; RAW_CHUNK_SIZE];
    let mut scratch = BytesMut::with_capacity(RAW_CHUNK_SIZE);
    let mut report = PumpReport::default();

    while !shutdown.is_set() {
        let read = match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(RelayError::direction(label, err)),
        };

        scratch.clear();
        transform.apply(&buf[..read], &mut scratch);
        writer
            .write_record(&scratch)
            .map_err(|err| RelayError::direction(label, err))?;
        writer
            .flush()
            .map_err(|err| RelayError::direction(label, err))?;

        report.forwarded += 1;
        report.bytes_out += scratch.len() as u64;
    }

    Ok(report)
}
