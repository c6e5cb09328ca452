//! Matrix protocol error types.

use thiserror::Error;

/// Argument errors detected before any byte is written to the device.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Sprite slot outside the device's sprite table.
    #[error("Sprite ID must be between 0 and {max}, got {0}", max = super::protocol::MAX_SPRITE_ID)]
    SpriteId(u8),

    /// RGB888 buffer does not match `width * height * 3`.
    #[error("Bitmap data size mismatch. Expected {expected} bytes, got {actual}")]
    PixelBufferSize { expected: usize, actual: usize },

    /// Text does not fit the device's receive buffer.
    #[error("Text is {len} bytes, device accepts at most {max}")]
    TextTooLong { len: usize, max: usize },

    /// Integer argument does not fit a single wire byte.
    #[error("{field} must be between 0 and 255, got {value}")]
    OutOfRange { field: &'static str, value: i64 },
}

/// Faults raised while talking to the device.
///
/// These never cross the [`MatrixDisplay`](super::MatrixDisplay) boundary; they are
/// folded into a failed [`Acknowledgment`](super::Acknowledgment).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Serial port could not be opened.
    #[error("Failed to open serial port: {0}")]
    Open(#[from] serialport::Error),

    /// IO error during read or write.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid response start byte")]
    InvalidStartByte,

    #[error("Invalid ACK byte")]
    InvalidAckByte,

    #[error("No command byte received")]
    NoCommandByte,

    #[error("No success byte received")]
    NoSuccessByte,

    #[error("No message length received")]
    NoLengthByte,

    /// Fewer message bytes arrived than the length byte announced.
    #[error("Incomplete message received ({received} of {expected} bytes)")]
    IncompleteMessage { expected: usize, received: usize },

    /// Device did not answer a chunk with the ready signal.
    #[error("Flow control error: expected 0xFF, got {}", describe_byte(.0))]
    FlowControl(Option<u8>),
}

fn describe_byte(byte: &Option<u8>) -> String {
    match byte {
        Some(b) => format!("{b:#04X}"),
        None => "nothing (timeout)".to_string(),
    }
}

/// Result type for façade operations.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Result type for session and parser operations.
pub(crate) type TransportResult<T> = std::result::Result<T, TransportError>;
