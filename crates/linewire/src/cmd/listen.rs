use linewire_frame::RecordReader;
use linewire_transport::TcpTransport;
use tracing::{info, warn};

use crate::cmd::{install_shutdown_handler, ListenArgs};
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let transport = TcpTransport::bind(format!("0.0.0.0:{}", args.port))
        .map_err(|err| transport_error("bind failed", err))?;

    let shutdown = install_shutdown_handler()?;
    let mut printed = 0usize;

    while !shutdown.is_set() {
        let (stream, peer) = transport
            .accept()
            .map_err(|err| transport_error("accept failed", err))?;
        let peer_label = peer.to_string();
        let mut reader = RecordReader::with_capacity(stream, args.capacity);

        while !shutdown.is_set() {
            let record = match reader.read_record() {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(err) => {
                    // One session's failure must not take the listener down.
                    warn!(peer = %peer_label, error = %err, "session failed");
                    break;
                }
            };

            printed = printed.saturating_add(1);
            print_record(record, printed as u64, &peer_label, format);

            if let Some(count) = args.count {
                if printed >= count {
                    return Ok(SUCCESS);
                }
            }
        }

        let stats = reader.stats();
        info!(
            peer = %peer_label,
            records = stats.records,
            overflows = stats.overflows,
            "peer disconnected"
        );
    }

    Ok(SUCCESS)
}
