use std::fs;
use std::io::Read;
use std::time::Duration;

use linewire_frame::{RecordReader, RecordWriter, DEFAULT_CAPACITY, TERMINATOR};
use linewire_transport::{tcp, DatagramStream, TcpTransport};

use crate::cmd::SendArgs;
use crate::exit::{
    frame_error, io_error, transport_error, CliError, CliResult, FAILURE, SUCCESS, USAGE,
};
use crate::output::{print_record, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let payload = resolve_payload(&args)?;
    let addr = format!("{}:{}", args.host, args.port);

    if args.udp {
        send_datagram(&addr, &payload, &args, wait_timeout, format)
    } else {
        send_stream(&addr, &payload, &args, wait_timeout, format)
    }
}

fn send_stream(
    addr: &str,
    payload: &[u8],
    args: &SendArgs,
    wait_timeout: Duration,
    format: OutputFormat,
) -> CliResult<i32> {
    let stream =
        TcpTransport::connect(addr).map_err(|err| transport_error("connect failed", err))?;
    if args.wait {
        stream
            .set_read_timeout(Some(wait_timeout))
            .map_err(|err| io_error("timeout setup failed", err))?;
    }
    let (read_half, write_half) =
        tcp::split(stream).map_err(|err| transport_error("stream split failed", err))?;

    let mut writer = RecordWriter::new(write_half);
    writer
        .write_record(payload)
        .map_err(|err| frame_error("send failed", err))?;
    writer
        .flush()
        .map_err(|err| frame_error("send failed", err))?;
    // Half-close so the peer sees end-of-stream once the one record is out.
    drop(writer);

    if args.wait {
        let mut reader = RecordReader::with_capacity(read_half, DEFAULT_CAPACITY);
        match reader.read_record() {
            Ok(Some(record)) => print_record(record, 1, addr, format),
            Ok(None) => {
                return Err(CliError::new(FAILURE, "peer closed without a response"));
            }
            Err(err) => return Err(frame_error("receive failed", err)),
        }
    }

    Ok(SUCCESS)
}

fn send_datagram(
    addr: &str,
    payload: &[u8],
    args: &SendArgs,
    wait_timeout: Duration,
    format: OutputFormat,
) -> CliResult<i32> {
    let mut stream =
        DatagramStream::connect(addr).map_err(|err| transport_error("connect failed", err))?;

    let mut writer = RecordWriter::new(&mut stream);
    writer
        .write_record(payload)
        .map_err(|err| frame_error("send failed", err))?;
    drop(writer);

    if args.wait {
        stream
            .set_read_timeout(Some(wait_timeout))
            .map_err(|err| transport_error("timeout setup failed", err))?;
        let mut response = [0u8; DEFAULT_CAPACITY];
        let received = stream
            .read(&mut response)
            .map_err(|err| io_error("receive failed", err))?;
        print_record(&response[..received], 1, addr, format);
    }

    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Vec<u8>> {
    let mut payload = if let Some(data) = &args.data {
        data.as_bytes().to_vec()
    } else if let Some(path) = &args.file {
        fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?
    } else {
        return Err(CliError::new(USAGE, "one of --data or --file is required"));
    };

    if payload.last() != Some(&TERMINATOR) {
        payload.push(TERMINATOR);
    }
    Ok(payload)
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}
