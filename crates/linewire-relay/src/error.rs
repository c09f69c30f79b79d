use linewire_frame::FrameError;

/// Errors that can occur while driving a relay session.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// A direction pump failed; the session is torn down.
    #[error("{label} direction failed: {source}")]
    Direction {
        label: &'static str,
        #[source]
        source: FrameError,
    },

    /// A direction task panicked instead of returning a status.
    #[error("{label} direction panicked")]
    Panicked { label: &'static str },
}

impl RelayError {
    pub fn direction(label: &'static str, source: impl Into<FrameError>) -> Self {
        Self::Direction {
            label,
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
