use std::io::Read;

use linewire_relay::{run_direction, Direction, PumpMode};
use linewire_transport::Fifo;
use tracing::info;

use crate::cmd::{install_shutdown_handler, DoubleArgs};
use crate::exit::{relay_error, transport_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: DoubleArgs, _format: OutputFormat) -> CliResult<i32> {
    let shutdown = install_shutdown_handler()?;

    // The FIFO guard outlives the pump so the path is unlinked on exit.
    let mut fifo_guard = None;
    let source: Box<dyn Read> = match &args.input {
        Some(path) => {
            let fifo =
                Fifo::create(path).map_err(|err| transport_error("fifo setup failed", err))?;
            let reader = fifo
                .open_reader()
                .map_err(|err| transport_error("fifo open failed", err))?;
            fifo_guard = Some(fifo);
            Box::new(reader)
        }
        None => Box::new(std::io::stdin()),
    };

    let report = run_direction(
        Direction {
            label: "doubler",
            source,
            sink: std::io::stdout(),
            mode: PumpMode::doubler(args.capacity),
        },
        &shutdown,
    )
    .map_err(|err| relay_error("doubler failed", err))?;

    info!(
        records = report.forwarded,
        overflows = report.framing.overflows,
        "input drained"
    );
    drop(fifo_guard);
    Ok(SUCCESS)
}
