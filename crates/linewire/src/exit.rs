use std::fmt;
use std::io;

use linewire_frame::FrameError;
use linewire_transport::TransportError;

// The driver contract: 0 on clean shutdown, 1 on any I/O or protocol error.
// 64 is reserved for argument values clap cannot validate itself.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const USAGE: i32 = 64;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    CliError::new(FAILURE, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    CliError::new(FAILURE, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    CliError::new(FAILURE, format!("{context}: {err}"))
}

pub fn relay_error(context: &str, err: linewire_relay::RelayError) -> CliError {
    CliError::new(FAILURE, format!("{context}: {err}"))
}
