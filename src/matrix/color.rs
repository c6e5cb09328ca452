//! RGB888 to RGB565 wire pixel conversion.

/// Bytes per pixel on the wire (RGB565).
pub const WIRE_PIXEL_SIZE: usize = 2;

/// Bytes per pixel in caller-supplied buffers (RGB888).
pub const RGB888_PIXEL_SIZE: usize = 3;

/// Pack one 24-bit color into a big-endian RGB565 wire pixel.
///
/// Layout: bits 15-11 red, 10-5 green, 4-0 blue.
pub fn to_wire_pixel(r: u8, g: u8, b: u8) -> [u8; 2] {
    let color = (u16::from(r >> 3) << 11) | (u16::from(g >> 2) << 5) | u16::from(b >> 3);
    color.to_be_bytes()
}

/// Convert a row-major RGB888 buffer into wire pixels.
///
/// A trailing partial triple is dropped, matching what deployed firmware
/// has always received.
pub fn rgb888_to_wire(rgb: &[u8]) -> Vec<u8> {
    let mut wire = Vec::with_capacity(rgb.len() / RGB888_PIXEL_SIZE * WIRE_PIXEL_SIZE);
    for px in rgb.chunks_exact(RGB888_PIXEL_SIZE) {
        wire.extend_from_slice(&to_wire_pixel(px[0], px[1], px[2]));
    }
    wire
}
