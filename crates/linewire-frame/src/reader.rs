use std::io::{ErrorKind, Read};

use crate::error::Result;
use crate::framer::{FramerStats, LineFramer, RecordView};

/// Reads complete newline-terminated records from any `Read` stream.
///
/// Handles partial reads internally — callers always get complete records.
/// End-of-stream is a clean termination: any unterminated residue is
/// discarded with a warning, not an error.
pub struct RecordReader<T> {
    inner: T,
    framer: LineFramer,
    eof: bool,
}

impl<T: Read> RecordReader<T> {
    /// Create a reader with the default record capacity.
    pub fn new(inner: T) -> Self {
        Self::with_framer(inner, LineFramer::new())
    }

    /// Create a reader with an explicit record capacity.
    pub fn with_capacity(inner: T, capacity: usize) -> Self {
        Self::with_framer(inner, LineFramer::with_capacity(capacity))
    }

    /// Create a reader around an existing framer.
    pub fn with_framer(inner: T, framer: LineFramer) -> Self {
        Self {
            inner,
            framer,
            eof: false,
        }
    }

    /// Read the next complete record (blocking).
    ///
    /// Returns `Ok(None)` once the stream reaches end-of-input.
    pub fn read_record(&mut self) -> Result<Option<&[u8]>> {
        let view = match self.fill_next()? {
            Some(view) => view,
            None => return Ok(None),
        };
        Ok(Some(self.framer.bytes(view)))
    }

    fn fill_next(&mut self) -> Result<Option<RecordView>> {
        loop {
            if let Some(view) = self.framer.next_record() {
                return Ok(Some(view));
            }
            if self.eof {
                return Ok(None);
            }

            let read = match self.inner.read(self.framer.spare()) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };

            if read == 0 {
                self.eof = true;
                self.framer.finish();
                return Ok(None);
            }

            self.framer.advance(read);
        }
    }

    /// Counters accumulated by the underlying framer.
    pub fn stats(&self) -> FramerStats {
        self.framer.stats()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
