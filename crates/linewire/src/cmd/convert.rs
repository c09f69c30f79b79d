use std::io::{Read, Write};

use linewire_relay::{run_direction, Direction, PumpMode, Transform};
use linewire_transport::Fifo;
use tracing::info;

use crate::cmd::{install_shutdown_handler, ConvertArgs};
use crate::exit::{relay_error, transport_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: ConvertArgs, _format: OutputFormat) -> CliResult<i32> {
    let shutdown = install_shutdown_handler()?;

    let mut fifo_guards = Vec::new();

    // Input first, then output: FIFO opens rendezvous with the peer, and
    // upstream producers open their write end before reading converted data.
    let source: Box<dyn Read> = match &args.input {
        Some(path) => {
            let fifo =
                Fifo::create(path).map_err(|err| transport_error("input fifo setup failed", err))?;
            let reader = fifo
                .open_reader()
                .map_err(|err| transport_error("input fifo open failed", err))?;
            fifo_guards.push(fifo);
            Box::new(reader)
        }
        None => Box::new(std::io::stdin()),
    };
    let sink: Box<dyn Write> = match &args.output {
        Some(path) => {
            let fifo = Fifo::create(path)
                .map_err(|err| transport_error("output fifo setup failed", err))?;
            let writer = fifo
                .open_writer()
                .map_err(|err| transport_error("output fifo open failed", err))?;
            fifo_guards.push(fifo);
            Box::new(writer)
        }
        None => Box::new(std::io::stdout()),
    };

    let report = run_direction(
        Direction {
            label: "converter",
            source,
            sink,
            mode: PumpMode::Raw {
                transform: Transform::Uppercase,
            },
        },
        &shutdown,
    )
    .map_err(|err| relay_error("converter failed", err))?;

    info!(
        chunks = report.forwarded,
        bytes = report.bytes_out,
        "input drained"
    );
    drop(fifo_guards);
    Ok(SUCCESS)
}
