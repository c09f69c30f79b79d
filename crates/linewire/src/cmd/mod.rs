use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use linewire_frame::DEFAULT_CAPACITY;
use linewire_relay::ShutdownFlag;

use crate::exit::{CliError, CliResult, FAILURE};
use crate::output::OutputFormat;

pub mod convert;
pub mod doctor;
pub mod double;
pub mod listen;
pub mod relay;
pub mod send;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Double every input line onto stdout.
    Double(DoubleArgs),
    /// Uppercase a raw byte stream.
    Convert(ConvertArgs),
    /// Run a line server (double, echo, or sink).
    Serve(ServeArgs),
    /// Relay stdin to a peer and peer output to stdout.
    Relay(RelayArgs),
    /// Accept connections and print received records.
    Listen(ListenArgs),
    /// Send one line and optionally wait for a response.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
    /// Run local environment health checks.
    Doctor(DoctorArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Double(args) => double::run(args, format),
        Command::Convert(args) => convert::run(args, format),
        Command::Serve(args) => serve::run(args, format),
        Command::Relay(args) => relay::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Version(args) => version::run(args),
        Command::Doctor(args) => doctor::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct DoubleArgs {
    /// Read lines from a FIFO created at this path instead of stdin.
    #[arg(long, value_name = "PATH")]
    pub input: Option<PathBuf>,
    /// Record buffer capacity in bytes (bounds the maximum line length).
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    pub capacity: usize,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Read from a FIFO created at this path instead of stdin.
    #[arg(long, value_name = "PATH")]
    pub input: Option<PathBuf>,
    /// Write to a FIFO created at this path instead of stdout.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum ServeMode {
    /// Send every received line back twice.
    Double,
    /// Send every received line back once.
    Echo,
    /// Consume and discard everything.
    Sink,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on (all interfaces).
    pub port: u16,
    /// What to do with received data.
    #[arg(long, value_enum, default_value = "double")]
    pub mode: ServeMode,
    /// Record buffer capacity in bytes.
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    pub capacity: usize,
    /// Serve datagrams instead of stream connections.
    #[arg(long)]
    pub udp: bool,
}

#[derive(Args, Debug)]
pub struct RelayArgs {
    /// Peer host.
    pub host: String,
    /// Peer port.
    pub port: u16,
    /// Record buffer capacity for the stdin direction.
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    pub capacity: usize,
    /// Talk datagrams instead of a stream connection.
    #[arg(long)]
    pub udp: bool,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Port to listen on (all interfaces).
    pub port: u16,
    /// Record buffer capacity in bytes.
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    pub capacity: usize,
    /// Exit after printing N records.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Peer host.
    pub host: String,
    /// Peer port.
    pub port: u16,
    /// Line to send (a terminator is appended if missing).
    #[arg(long, conflicts_with = "file")]
    pub data: Option<String>,
    /// Read the payload from a file.
    #[arg(long, conflicts_with = "data")]
    pub file: Option<PathBuf>,
    /// Send a datagram instead of opening a stream connection.
    #[arg(long)]
    pub udp: bool,
    /// Wait for one response record and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the response (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct DoctorArgs {}

/// Install the interrupt handler. The handler body only sets the flag;
/// every loop polls it and performs its own teardown.
pub(crate) fn install_shutdown_handler() -> CliResult<ShutdownFlag> {
    let flag = ShutdownFlag::new();
    let handler_flag = flag.clone();
    ctrlc::set_handler(move || handler_flag.request()).map_err(|err| {
        CliError::new(FAILURE, format!("signal handler setup failed: {err}"))
    })?;
    Ok(flag)
}
