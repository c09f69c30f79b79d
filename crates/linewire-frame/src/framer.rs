use tracing::warn;

/// Record terminator byte.
pub const TERMINATOR: u8 = b'\n';

/// Default framer buffer capacity in bytes.
///
/// Also the maximum record length, terminator included.
pub const DEFAULT_CAPACITY: usize = 1024;

/// A completed record: a span into the framer's internal buffer.
///
/// Valid until the framer is next fed or compacted (i.e. until the call to
/// [`LineFramer::next_record`] that returns `None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordView {
    start: usize,
    len: usize,
}

impl RecordView {
    /// Record length in bytes, terminator included.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Records always carry at least their terminator.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Counters for the recoverable conditions a stream can hit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FramerStats {
    /// Completed records emitted.
    pub records: u64,
    /// Terminator-free refills discarded while resynchronizing after an
    /// oversized record.
    pub overflows: u64,
    /// Bytes discarded because the stream ended without a trailing terminator.
    pub trailing_discarded: u64,
}

/// Incremental newline-delimited record extraction from a bounded buffer.
///
/// The caller reads into [`spare`](Self::spare), commits the byte count with
/// [`advance`](Self::advance), then drains completed records with
/// [`next_record`](Self::next_record). Unterminated residue is compacted to
/// the buffer front so the next read continues the record; a refill that
/// fills the buffer without a terminator discards the oversized record and
/// suppresses everything up to the next terminator.
pub struct LineFramer {
    buf: Box<[u8]>,
    filled: usize,
    pos: usize,
    skipping: bool,
    stats: FramerStats,
}

impl LineFramer {
    /// Create a framer with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a framer with an explicit capacity (must be non-zero).
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "framer capacity must be non-zero");
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
            filled: 0,
            pos: 0,
            skipping: false,
            stats: FramerStats::default(),
        }
    }

    /// Buffer capacity, which bounds the maximum record length.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Number of valid buffered bytes at the front of the buffer.
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Whether the framer is discarding bytes up to the next terminator.
    pub fn is_skipping(&self) -> bool {
        self.skipping
    }

    /// Counters for records, overflows, and discarded trailing bytes.
    pub fn stats(&self) -> FramerStats {
        self.stats
    }

    /// The writable tail of the buffer; the caller reads into this slice.
    ///
    /// Guaranteed non-empty whenever the previous
    /// [`next_record`](Self::next_record) returned `None`.
    pub fn spare(&mut self) -> &mut [u8] {
        &mut self.buf[self.filled..]
    }

    /// Commit `n` newly read bytes at the end of the filled region.
    pub fn advance(&mut self, n: usize) {
        assert!(
            n <= self.buf.len() - self.filled,
            "advance past spare capacity"
        );
        self.filled += n;
    }

    /// Extract the next completed record, if any.
    ///
    /// When no terminator remains in the unscanned bytes, residue is
    /// compacted to the buffer front and `None` is returned; a full buffer
    /// with no terminator at that point is the overflow case: the residue is
    /// discarded with a warning and suppression runs until the terminator
    /// that ends the oversized record.
    pub fn next_record(&mut self) -> Option<RecordView> {
        loop {
            let newline = self.buf[self.pos..self.filled]
                .iter()
                .position(|&b| b == TERMINATOR);

            let Some(offset) = newline else {
                self.compact();
                if self.filled == self.buf.len() {
                    warn!(
                        capacity = self.buf.len(),
                        "record longer than buffer capacity; skipping to next terminator"
                    );
                    self.stats.overflows += 1;
                    self.filled = 0;
                    self.skipping = true;
                }
                return None;
            };

            let start = self.pos;
            let len = offset + 1;
            self.pos += len;

            if self.skipping {
                // This terminator ends the oversized record; suppress it and
                // resume normal emission from the next byte.
                self.skipping = false;
                continue;
            }

            self.stats.records += 1;
            return Some(RecordView { start, len });
        }
    }

    /// Resolve a view into the underlying bytes (terminator included).
    pub fn bytes(&self, view: RecordView) -> &[u8] {
        &self.buf[view.start..view.start + view.len]
    }

    /// End of input: discard any unterminated residue.
    ///
    /// Returns the number of bytes discarded. A non-empty residue is a
    /// warning, never an error.
    pub fn finish(&mut self) -> usize {
        let residue = self.filled - self.pos;
        if residue > 0 {
            warn!(
                bytes = residue,
                "stream ended without trailing terminator; discarding residue"
            );
            self.stats.trailing_discarded += residue as u64;
        }
        self.filled = 0;
        self.pos = 0;
        self.skipping = false;
        residue
    }

    fn compact(&mut self) {
        if self.pos > 0 {
            self.buf.copy_within(self.pos..self.filled, 0);
            self.filled -= self.pos;
            self.pos = 0;
        }
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}
