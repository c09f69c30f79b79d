//! Line-oriented streaming over POSIX transports.
//!
//! linewire splits unbounded byte streams into newline-terminated records
//! through bounded buffers and composes that core into duplex relay, doubler,
//! converter, and echo drivers over FIFOs, TCP, and UDP.
//!
//! # Crate Structure
//!
//! - [`transport`] — FIFO, TCP, and UDP channel adapters
//! - [`frame`] — newline record framing and reliable full-delivery writes
//! - [`relay`] — direction pumps and duplex sessions (behind `relay` feature)

/// Re-export transport types.
pub mod transport {
    pub use linewire_transport::*;
}

/// Re-export framing types.
pub mod frame {
    pub use linewire_frame::*;
}

/// Re-export relay types (requires `relay` feature).
#[cfg(feature = "relay")]
pub mod relay {
    pub use linewire_relay::*;
}
