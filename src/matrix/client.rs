//! MatrixDisplay struct and public command API.

use tracing::{debug, error, warn};

use super::ack::Acknowledgment;
use super::error::{Result, TransportResult};
use super::io::{Connector, DEFAULT_BAUD_RATE, SerialConnector, Session, Timeouts};
use super::protocol::{Command, DEFAULT_CHUNK_SIZE, Delivery, Rgb, build_frame};
use crate::config::SerialConfig;

/// Client for an LED matrix display.
///
/// Every call opens its own link, sends one command, waits for the
/// acknowledgment and closes the link again. Provides blocking I/O only.
///
/// Argument problems come back as `Err(ValidationError)` before anything is
/// sent. Transport faults and device-side failures both come back as
/// `Ok(Acknowledgment)` with `success == false`.
pub struct MatrixDisplay<C: Connector = SerialConnector> {
    connector: C,
    timeouts: Timeouts,
    chunk_size: usize,
}

impl MatrixDisplay<SerialConnector> {
    /// Client for a serial port at the default 115200 baud.
    pub fn new(port: &str) -> Self {
        Self::with_connector(SerialConnector::new(port, DEFAULT_BAUD_RATE))
    }

    /// Client built from the `[serial]` config section.
    pub fn from_config(config: &SerialConfig) -> Self {
        Self::with_connector(SerialConnector::new(&config.port, config.baud_rate))
            .with_timeouts(config.timeouts())
            .with_chunk_size(config.chunk_size)
    }
}

impl<C: Connector> MatrixDisplay<C> {
    pub fn with_connector(connector: C) -> Self {
        Self {
            connector,
            timeouts: Timeouts::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Payload chunk size for bitmap and sprite uploads.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Validate, frame and deliver one command.
    pub fn send(&self, command: &Command<'_>) -> Result<Acknowledgment> {
        command.validate()?;

        let ack = match self.exchange(command) {
            Ok(ack) => ack,
            Err(e) => {
                error!("{} to {} failed: {e}", command.name(), self.connector.target());
                Acknowledgment::from(e)
            }
        };

        if !ack.success && !ack.is_local_failure() {
            warn!("{} rejected by device: {}", command.name(), ack.message);
        }

        Ok(ack)
    }

    fn exchange(&self, command: &Command<'_>) -> TransportResult<Acknowledgment> {
        let header = build_frame(command.id(), &command.fixed_fields());
        let payload = command.payload();
        let delivery = command.delivery();

        let timeout = match delivery {
            Delivery::Simple => self.timeouts.command,
            Delivery::Chunked => self.timeouts.bulk,
        };

        debug!("{}: connecting to {} (timeout={timeout:?})", command.name(), self.connector.target());
        let link = self.connector.open(timeout)?;
        let mut session = Session::new(link, command.name());

        match delivery {
            Delivery::Simple => session.send_simple(&header, payload.as_deref())?,
            Delivery::Chunked => session.send_chunked(&header, payload.as_deref().unwrap_or(&[]), self.chunk_size)?,
        }

        session.read_ack(command.id())
    }

    /// Draw a single pixel.
    pub fn draw_pixel(&self, x: u8, y: u8, color: Rgb) -> Result<Acknowledgment> {
        self.send(&Command::DrawPixel { x, y, color })
    }

    /// Fill the entire screen with one color.
    pub fn fill_screen(&self, color: Rgb) -> Result<Acknowledgment> {
        self.send(&Command::FillScreen { color })
    }

    /// Draw a line from (x0, y0) to (x1, y1).
    pub fn draw_line(&self, x0: u8, y0: u8, x1: u8, y1: u8, color: Rgb) -> Result<Acknowledgment> {
        self.send(&Command::DrawLine { x0, y0, x1, y1, color })
    }

    /// Draw a rectangle outline.
    pub fn draw_rect(&self, x: u8, y: u8, w: u8, h: u8, color: Rgb) -> Result<Acknowledgment> {
        self.send(&Command::DrawRect { x, y, w, h, color })
    }

    /// Draw a filled rectangle.
    pub fn fill_rect(&self, x: u8, y: u8, w: u8, h: u8, color: Rgb) -> Result<Acknowledgment> {
        self.send(&Command::FillRect { x, y, w, h, color })
    }

    pub fn draw_fast_vline(&self, x: u8, y: u8, h: u8, color: Rgb) -> Result<Acknowledgment> {
        self.send(&Command::DrawFastVLine { x, y, h, color })
    }

    pub fn draw_fast_hline(&self, x: u8, y: u8, w: u8, color: Rgb) -> Result<Acknowledgment> {
        self.send(&Command::DrawFastHLine { x, y, w, color })
    }

    /// Print text at the current cursor position (at most 64 bytes of UTF-8).
    pub fn print_text(&self, text: &str) -> Result<Acknowledgment> {
        self.send(&Command::Print { text })
    }

    pub fn set_cursor(&self, x: u8, y: u8) -> Result<Acknowledgment> {
        self.send(&Command::SetCursor { x, y })
    }

    pub fn set_brightness(&self, brightness: u8) -> Result<Acknowledgment> {
        self.send(&Command::SetBrightness { brightness })
    }

    pub fn clear(&self) -> Result<Acknowledgment> {
        self.send(&Command::Clear)
    }

    /// Draw an RGB888 bitmap at (x, y).
    ///
    /// # Arguments
    /// * `pixels` - Row-major RGB888 data, exactly `w * h * 3` bytes
    ///
    /// # Errors
    /// Returns `ValidationError::PixelBufferSize` on a length mismatch.
    pub fn draw_bitmap(&self, x: u8, y: u8, w: u8, h: u8, pixels: &[u8]) -> Result<Acknowledgment> {
        self.send(&Command::DrawBitmap { x, y, w, h, pixels })
    }

    /// Store RGB888 pixels in a device sprite slot (0-15) at (x, y).
    ///
    /// # Errors
    /// Returns `ValidationError::SpriteId` or `ValidationError::PixelBufferSize`.
    pub fn set_sprite(&self, id: u8, x: u8, y: u8, w: u8, h: u8, pixels: &[u8]) -> Result<Acknowledgment> {
        self.send(&Command::SetSprite { id, x, y, w, h, pixels })
    }

    /// Remove a sprite from device memory and the screen.
    pub fn clear_sprite(&self, id: u8) -> Result<Acknowledgment> {
        self.send(&Command::ClearSprite { id })
    }

    /// Draw a stored sprite at (x, y) without changing its stored position.
    pub fn draw_sprite(&self, id: u8, x: u8, y: u8) -> Result<Acknowledgment> {
        self.send(&Command::DrawSprite { id, x, y })
    }

    /// Move a stored sprite to (x, y) and update its stored position.
    pub fn move_sprite(&self, id: u8, x: u8, y: u8) -> Result<Acknowledgment> {
        self.send(&Command::MoveSprite { id, x, y })
    }
}
