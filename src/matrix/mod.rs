//! LED matrix serial protocol client.
//!
//! Frames drawing commands, converts pixels to RGB565, uploads bitmaps and
//! sprites under the device's ready-byte flow control and validates every
//! acknowledgment frame.
//!
//! # Example
//!
//! ```ignore
//! use matrix_display::matrix::{MatrixDisplay, Rgb};
//!
//! let display = MatrixDisplay::new("/dev/ttyUSB0");
//! let ack = display.fill_screen(Rgb::new(0, 0, 64))?;
//! println!("{}", ack.message);
//! ```

mod ack;
mod client;
pub mod color;
mod error;
mod io;
pub mod ports;
pub mod protocol;

#[cfg(test)]
pub(crate) mod tests;

// Re-export public API
pub use ack::Acknowledgment;
pub use client::MatrixDisplay;
pub use color::{rgb888_to_wire, to_wire_pixel};
pub use error::{Result, TransportError, ValidationError};
pub use io::{Connector, DEFAULT_BAUD_RATE, SerialConnector, Timeouts};
pub use ports::{PortInfo, list_ports};
pub use protocol::{Command, Rgb, byte_field};
