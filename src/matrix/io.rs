//! Serial link handling: opening connections, writing frames, chunked
//! flow-controlled payloads and timeout-aware reads.

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use serialport::{DataBits, Parity, SerialPort, StopBits};
use tracing::{debug, error};

use super::ack::{Acknowledgment, read_ack};
use super::error::{TransportError, TransportResult};
use super::protocol::READY_SIGNAL;

/// Default serial baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Largest prefix of a buffer dumped in trace output.
const LOG_PREVIEW: usize = 32;

/// Read timeouts for the two delivery modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Ordinary commands.
    pub command: Duration,
    /// Bitmap and sprite uploads.
    pub bulk: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            command: Duration::from_secs(2),
            bulk: Duration::from_secs(10),
        }
    }
}

/// Opens one link per command.
///
/// The returned link is closed when dropped.
pub trait Connector {
    type Link: Read + Write;

    /// Open a fresh link whose reads give up after `timeout`.
    fn open(&self, timeout: Duration) -> Result<Self::Link, TransportError>;

    /// Target description for logs.
    fn target(&self) -> String;
}

/// Connector for a local serial device (8N1).
#[derive(Debug, Clone)]
pub struct SerialConnector {
    port: String,
    baud_rate: u32,
}

impl SerialConnector {
    /// # Arguments
    /// * `port` - Serial port path (e.g., "/dev/ttyUSB0" or "COM3")
    /// * `baud_rate` - Line speed; the firmware expects 115200
    pub fn new(port: &str, baud_rate: u32) -> Self {
        Self {
            port: port.to_string(),
            baud_rate,
        }
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

impl Connector for SerialConnector {
    type Link = Box<dyn SerialPort>;

    fn open(&self, timeout: Duration) -> Result<Self::Link, TransportError> {
        debug!("Opening {} at {} baud (timeout={:?})", self.port, self.baud_rate, timeout);
        serialport::new(&self.port, self.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(timeout)
            .open()
            .map_err(|e| {
                error!("Failed to open {}: {e}", self.port);
                TransportError::Open(e)
            })
    }

    fn target(&self) -> String {
        format!("{}@{}", self.port, self.baud_rate)
    }
}

/// One open connection, scoped to a single command.
///
/// Dropping the session closes the link, whichever way the exchange ended.
pub(crate) struct Session<L: Read + Write> {
    link: L,
    command: &'static str,
}

impl<L: Read + Write> Session<L> {
    pub(crate) fn new(link: L, command: &'static str) -> Self {
        Self { link, command }
    }

    /// Write the frame header and optional payload in one go.
    pub(crate) fn send_simple(&mut self, header: &[u8], payload: Option<&[u8]>) -> TransportResult<()> {
        write_logged(&mut self.link, header)?;
        if let Some(payload) = payload {
            write_logged(&mut self.link, payload)?;
        }
        self.link.flush()?;
        Ok(())
    }

    /// Write the frame header, then the payload in `chunk_size` pieces.
    ///
    /// After every chunk but the last the device must answer with
    /// [`READY_SIGNAL`]; anything else (or silence) aborts the upload.
    pub(crate) fn send_chunked(&mut self, header: &[u8], payload: &[u8], chunk_size: usize) -> TransportResult<()> {
        write_logged(&mut self.link, header)?;
        self.link.flush()?;

        let total = payload.len();
        let mut sent = 0;

        for chunk in payload.chunks(chunk_size.max(1)) {
            self.link.write_all(chunk)?;
            self.link.flush()?;
            sent += chunk.len();

            if sent < total {
                match read_byte(&mut self.link)? {
                    Some(READY_SIGNAL) => {}
                    other => {
                        error!("{}: flow control failed after {sent}/{total} bytes: {other:02X?}", self.command);
                        return Err(TransportError::FlowControl(other));
                    }
                }
            }
        }

        debug!("{}: sent {total} payload bytes in {chunk_size}-byte chunks", self.command);
        Ok(())
    }

    pub(crate) fn read_ack(&mut self, expected_cmd: u8) -> TransportResult<Acknowledgment> {
        read_ack(&mut self.link, expected_cmd)
    }
}

impl<L: Read + Write> Drop for Session<L> {
    fn drop(&mut self) {
        debug!("{}: closing link", self.command);
    }
}

fn write_logged<W: Write + ?Sized>(writer: &mut W, bytes: &[u8]) -> TransportResult<()> {
    debug!("TX ({} bytes): {:02X?}", bytes.len(), &bytes[..bytes.len().min(LOG_PREVIEW)]);
    writer.write_all(bytes)?;
    Ok(())
}

fn is_timeout(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::TimedOut | ErrorKind::WouldBlock)
}

/// Read a single byte; `None` means the read timed out or the link closed.
pub(crate) fn read_byte<R: Read + ?Sized>(reader: &mut R) -> TransportResult<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if is_timeout(e.kind()) => return Ok(None),
            Err(e) => return Err(e.into()),
        }
    }
}

/// Read up to `size` bytes, stopping early on timeout or end of stream.
pub(crate) fn read_up_to<R: Read + ?Sized>(reader: &mut R, size: usize) -> TransportResult<Vec<u8>> {
    let mut data = vec![0u8; size];
    let mut received = 0;

    while received < size {
        match reader.read(&mut data[received..]) {
            Ok(0) => break,
            Ok(n) => received += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if is_timeout(e.kind()) => break,
            Err(e) => return Err(e.into()),
        }
    }

    data.truncate(received);
    Ok(data)
}
