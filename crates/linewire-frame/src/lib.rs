//! Newline-delimited record framing over byte streams.
//!
//! This is the core value-add layer of linewire. An unbounded byte stream is
//! split into `\n`-terminated records through a fixed-capacity buffer:
//! - Records spanning multiple reads are reassembled via compaction
//! - Records exceeding capacity are discarded up to the next terminator
//!   (a warning, never an error)
//! - Short writes are retried until the full record is delivered
//!
//! No partial reads, no buffer management in driver code.

pub mod error;
pub mod framer;
pub mod reader;
pub mod writer;

pub use error::{FrameError, Result};
pub use framer::{FramerStats, LineFramer, RecordView, DEFAULT_CAPACITY, TERMINATOR};
pub use reader::RecordReader;
pub use writer::RecordWriter;
