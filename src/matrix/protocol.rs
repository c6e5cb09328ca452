//! Matrix wire protocol: constants, command table and frame building.

use super::color::{RGB888_PIXEL_SIZE, rgb888_to_wire};
use super::error::{Result, ValidationError};

/// Frame start marker, used by both directions.
pub const START_BYTE: u8 = 0xAA;

/// Second byte of every acknowledgment.
pub const ACK_BYTE: u8 = 0xAC;

/// Byte the device emits after consuming each non-final payload chunk.
pub const READY_SIGNAL: u8 = 0xFF;

/// Payload chunk size for flow-controlled sends (64 wire pixels).
pub const DEFAULT_CHUNK_SIZE: usize = 128;

/// Highest sprite slot on the device.
pub const MAX_SPRITE_ID: u8 = 15;

/// Largest text the device buffers for a single print.
pub const MAX_TEXT_LEN: usize = 64;

// Command codes
pub const CMD_DRAW_PIXEL: u8 = 0x01;
pub const CMD_FILL_SCREEN: u8 = 0x02;
pub const CMD_DRAW_LINE: u8 = 0x03;
pub const CMD_DRAW_RECT: u8 = 0x04;
pub const CMD_DRAW_TEXT: u8 = 0x05; // reserved, no firmware handler
pub const CMD_CLEAR: u8 = 0x06;
pub const CMD_SET_BRIGHTNESS: u8 = 0x07;
pub const CMD_PRINT: u8 = 0x08;
pub const CMD_SET_CURSOR: u8 = 0x09;
pub const CMD_FILL_RECT: u8 = 0x0A;
pub const CMD_DRAW_FAST_VLINE: u8 = 0x0B;
pub const CMD_DRAW_FAST_HLINE: u8 = 0x0C;
pub const CMD_DRAW_BITMAP: u8 = 0x0D;

// Sprite commands
pub const CMD_SET_SPRITE: u8 = 0x0E;
pub const CMD_CLEAR_SPRITE: u8 = 0x0F;
pub const CMD_DRAW_SPRITE: u8 = 0x10;
pub const CMD_MOVE_SPRITE: u8 = 0x11;

/// 24-bit color as sent in fixed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    fn bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// How a command's bytes reach the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Header and payload in one write, short timeout.
    Simple,
    /// Header, then payload in ready-gated chunks, long timeout.
    Chunked,
}

/// One device command with its parameters.
///
/// Single source of truth for the id byte, the fixed-field layout and the
/// payload of every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    DrawPixel { x: u8, y: u8, color: Rgb },
    FillScreen { color: Rgb },
    DrawLine { x0: u8, y0: u8, x1: u8, y1: u8, color: Rgb },
    DrawRect { x: u8, y: u8, w: u8, h: u8, color: Rgb },
    FillRect { x: u8, y: u8, w: u8, h: u8, color: Rgb },
    DrawFastVLine { x: u8, y: u8, h: u8, color: Rgb },
    DrawFastHLine { x: u8, y: u8, w: u8, color: Rgb },
    Print { text: &'a str },
    Clear,
    SetBrightness { brightness: u8 },
    SetCursor { x: u8, y: u8 },
    /// `pixels` is row-major RGB888.
    DrawBitmap { x: u8, y: u8, w: u8, h: u8, pixels: &'a [u8] },
    SetSprite { id: u8, x: u8, y: u8, w: u8, h: u8, pixels: &'a [u8] },
    ClearSprite { id: u8 },
    DrawSprite { id: u8, x: u8, y: u8 },
    MoveSprite { id: u8, x: u8, y: u8 },
}

impl Command<'_> {
    /// Command id byte.
    pub fn id(&self) -> u8 {
        match self {
            Command::DrawPixel { .. } => CMD_DRAW_PIXEL,
            Command::FillScreen { .. } => CMD_FILL_SCREEN,
            Command::DrawLine { .. } => CMD_DRAW_LINE,
            Command::DrawRect { .. } => CMD_DRAW_RECT,
            Command::FillRect { .. } => CMD_FILL_RECT,
            Command::DrawFastVLine { .. } => CMD_DRAW_FAST_VLINE,
            Command::DrawFastHLine { .. } => CMD_DRAW_FAST_HLINE,
            Command::Print { .. } => CMD_PRINT,
            Command::Clear => CMD_CLEAR,
            Command::SetBrightness { .. } => CMD_SET_BRIGHTNESS,
            Command::SetCursor { .. } => CMD_SET_CURSOR,
            Command::DrawBitmap { .. } => CMD_DRAW_BITMAP,
            Command::SetSprite { .. } => CMD_SET_SPRITE,
            Command::ClearSprite { .. } => CMD_CLEAR_SPRITE,
            Command::DrawSprite { .. } => CMD_DRAW_SPRITE,
            Command::MoveSprite { .. } => CMD_MOVE_SPRITE,
        }
    }

    /// Human-readable command name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::DrawPixel { .. } => "draw_pixel",
            Command::FillScreen { .. } => "fill_screen",
            Command::DrawLine { .. } => "draw_line",
            Command::DrawRect { .. } => "draw_rect",
            Command::FillRect { .. } => "fill_rect",
            Command::DrawFastVLine { .. } => "draw_fast_vline",
            Command::DrawFastHLine { .. } => "draw_fast_hline",
            Command::Print { .. } => "print",
            Command::Clear => "clear",
            Command::SetBrightness { .. } => "set_brightness",
            Command::SetCursor { .. } => "set_cursor",
            Command::DrawBitmap { .. } => "draw_bitmap",
            Command::SetSprite { .. } => "set_sprite",
            Command::ClearSprite { .. } => "clear_sprite",
            Command::DrawSprite { .. } => "draw_sprite",
            Command::MoveSprite { .. } => "move_sprite",
        }
    }

    pub fn delivery(&self) -> Delivery {
        match self {
            Command::DrawBitmap { .. } | Command::SetSprite { .. } => Delivery::Chunked,
            _ => Delivery::Simple,
        }
    }

    /// Check arguments the type system cannot.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Command::SetSprite { id, w, h, pixels, .. } => {
                check_sprite_id(id)?;
                check_pixel_buffer(w, h, pixels)
            }
            Command::ClearSprite { id } | Command::DrawSprite { id, .. } | Command::MoveSprite { id, .. } => {
                check_sprite_id(id)
            }
            Command::DrawBitmap { w, h, pixels, .. } => check_pixel_buffer(w, h, pixels),
            Command::Print { text } if text.len() > MAX_TEXT_LEN => Err(ValidationError::TextTooLong {
                len: text.len(),
                max: MAX_TEXT_LEN,
            }),
            _ => Ok(()),
        }
    }

    /// Length-counted field bytes, in wire order.
    ///
    /// Print text travels here: the device reads exactly the announced
    /// length into its command buffer.
    pub fn fixed_fields(&self) -> Vec<u8> {
        match *self {
            Command::DrawPixel { x, y, color } => with_color(&[x, y], color),
            Command::FillScreen { color } => color.bytes().to_vec(),
            Command::DrawLine { x0, y0, x1, y1, color } => with_color(&[x0, y0, x1, y1], color),
            Command::DrawRect { x, y, w, h, color } | Command::FillRect { x, y, w, h, color } => {
                with_color(&[x, y, w, h], color)
            }
            Command::DrawFastVLine { x, y, h, color } => with_color(&[x, y, h], color),
            Command::DrawFastHLine { x, y, w, color } => with_color(&[x, y, w], color),
            Command::Print { text } => text.as_bytes().to_vec(),
            Command::Clear => Vec::new(),
            Command::SetBrightness { brightness } => vec![brightness],
            Command::SetCursor { x, y } => vec![x, y],
            Command::DrawBitmap { x, y, w, h, .. } => vec![x, y, w, h],
            Command::SetSprite { id, x, y, w, h, .. } => vec![id, x, y, w, h],
            Command::ClearSprite { id } => vec![id],
            Command::DrawSprite { id, x, y } | Command::MoveSprite { id, x, y } => vec![id, x, y],
        }
    }

    /// Variable payload sent after the header, already in wire pixel format.
    pub fn payload(&self) -> Option<Vec<u8>> {
        match *self {
            Command::DrawBitmap { pixels, .. } | Command::SetSprite { pixels, .. } => Some(rgb888_to_wire(pixels)),
            _ => None,
        }
    }
}

fn with_color(fields: &[u8], color: Rgb) -> Vec<u8> {
    let mut out = Vec::with_capacity(fields.len() + 3);
    out.extend_from_slice(fields);
    out.extend_from_slice(&color.bytes());
    out
}

fn check_sprite_id(id: u8) -> Result<()> {
    if id > MAX_SPRITE_ID {
        return Err(ValidationError::SpriteId(id));
    }
    Ok(())
}

fn check_pixel_buffer(w: u8, h: u8, pixels: &[u8]) -> Result<()> {
    let expected = usize::from(w) * usize::from(h) * RGB888_PIXEL_SIZE;
    if pixels.len() != expected {
        return Err(ValidationError::PixelBufferSize {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}

/// Narrow a wider integer to a wire byte, rejecting anything outside 0-255.
pub fn byte_field(field: &'static str, value: i64) -> Result<u8> {
    u8::try_from(value).map_err(|_| ValidationError::OutOfRange { field, value })
}

/// Build a frame header.
///
/// Layout: `[START_BYTE, command, len(fields), fields...]`. The payload is
/// never counted in the length byte.
///
/// # Panics
/// If `fields` exceeds 255 bytes; no command in the table comes close.
pub fn build_frame(command: u8, fields: &[u8]) -> Vec<u8> {
    assert!(
        fields.len() <= usize::from(u8::MAX),
        "command {command:#04x} has {} fixed bytes",
        fields.len()
    );

    let mut frame = Vec::with_capacity(3 + fields.len());
    frame.push(START_BYTE);
    frame.push(command);
    frame.push(fields.len() as u8);
    frame.extend_from_slice(fields);
    frame
}
