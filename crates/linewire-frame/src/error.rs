/// Errors that can occur while reading or writing records.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The sink reported that the peer can no longer accept data.
    ///
    /// Writing stops immediately; the record in flight is abandoned.
    #[error("peer can no longer accept data (broken pipe)")]
    BrokenPeer,

    /// The sink accepted zero bytes without an error.
    #[error("sink closed (zero-length write accepted)")]
    SinkClosed,

    /// An I/O error occurred while reading or writing.
    #[error("record I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
