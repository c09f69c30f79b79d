use std::io::{ErrorKind, Write};

use crate::error::{FrameError, Result};

/// Writes complete byte spans to any `Write` sink.
///
/// The underlying write primitive may deliver fewer bytes than asked; this
/// writer retries short writes and transient interruptions until the span is
/// fully delivered. A broken peer stops the write immediately: a sink that
/// can no longer accept data gets a failure report, not a retry.
pub struct RecordWriter<T> {
    inner: T,
}

impl<T: Write> RecordWriter<T> {
    /// Create a writer over a sink.
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Deliver the full span (blocking).
    pub fn write_record(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => return Err(FrameError::SinkClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) if err.kind() == ErrorKind::BrokenPipe => {
                    return Err(FrameError::BrokenPeer)
                }
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) if err.kind() == ErrorKind::BrokenPipe => {
                    return Err(FrameError::BrokenPeer)
                }
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying sink.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner sink.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
