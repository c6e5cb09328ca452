//! Acknowledgment frame parsing.

use std::fmt;
use std::io::Read;

use tracing::{debug, warn};

use super::error::{TransportError, TransportResult};
use super::io::{read_byte, read_up_to};
use super::protocol::{ACK_BYTE, START_BYTE};

/// Outcome of one command round trip.
///
/// Built from the device's acknowledgment frame, or locally when the
/// exchange failed before a complete frame arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgment {
    /// Command id echoed by the device; `None` for locally produced failures.
    pub command: Option<u8>,
    /// Whether the device reported success.
    pub success: bool,
    /// Device message or local error description.
    pub message: String,
}

impl Acknowledgment {
    /// Failure that never reached (or never came back from) the device.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            command: None,
            success: false,
            message: message.into(),
        }
    }

    /// True when the failure was produced on the host side.
    pub fn is_local_failure(&self) -> bool {
        self.command.is_none()
    }
}

impl From<TransportError> for Acknowledgment {
    fn from(err: TransportError) -> Self {
        Acknowledgment::failure(err.to_string())
    }
}

impl fmt::Display for Acknowledgment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "ok" } else { "failed" };
        match self.command {
            Some(cmd) => write!(f, "[{cmd:#04x}] {status}")?,
            None => write!(f, "{status}")?,
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

/// Read one acknowledgment frame.
///
/// Layout: `[0xAA][0xAC][cmd][success][len][message...]`. Every step reads
/// with the link's timeout and fails on the first missing or wrong byte.
/// The message is decoded lossily; malformed UTF-8 never fails the parse.
pub(crate) fn read_ack<R: Read + ?Sized>(reader: &mut R, expected_cmd: u8) -> TransportResult<Acknowledgment> {
    if read_byte(reader)? != Some(START_BYTE) {
        return Err(TransportError::InvalidStartByte);
    }

    if read_byte(reader)? != Some(ACK_BYTE) {
        return Err(TransportError::InvalidAckByte);
    }

    let command = read_byte(reader)?.ok_or(TransportError::NoCommandByte)?;
    let success = read_byte(reader)?.ok_or(TransportError::NoSuccessByte)? == 0x01;
    let msg_len = usize::from(read_byte(reader)?.ok_or(TransportError::NoLengthByte)?);

    let message = if msg_len > 0 {
        let bytes = read_up_to(reader, msg_len)?;
        if bytes.len() < msg_len {
            return Err(TransportError::IncompleteMessage {
                expected: msg_len,
                received: bytes.len(),
            });
        }
        String::from_utf8_lossy(&bytes).into_owned()
    } else {
        String::new()
    };

    if command != expected_cmd {
        warn!("ACK echoes command {command:#04x}, sent {expected_cmd:#04x}");
    }

    debug!("RX ack: cmd={command:#04x}, success={success}, message={message:?}");

    Ok(Acknowledgment {
        command: Some(command),
        success,
        message,
    })
}
