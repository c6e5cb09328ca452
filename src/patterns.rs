//! Built-in RGB888 test patterns for bitmap and sprite uploads.

use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Side length of a checkerboard cell in pixels.
const CHECKER_CELL: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Red grows left to right, green top to bottom, blue along the diagonal.
    Gradient,
    /// Hue sweep along the diagonal.
    Rainbow,
    /// 8x8 white/black cells.
    Checkerboard,
}

impl Pattern {
    pub const ALL: [Pattern; 3] = [Pattern::Gradient, Pattern::Rainbow, Pattern::Checkerboard];

    /// Render a `width` x `height` image as row-major RGB888.
    pub fn render(self, width: u8, height: u8) -> Vec<u8> {
        let (w, h) = (usize::from(width), usize::from(height));
        let mut data = Vec::with_capacity(w * h * 3);

        for y in 0..h {
            for x in 0..w {
                let px = match self {
                    Pattern::Gradient => gradient(x, y, w, h),
                    Pattern::Rainbow => rainbow(x, y, w, h),
                    Pattern::Checkerboard => checker(x, y),
                };
                data.extend_from_slice(&px);
            }
        }

        data
    }

    pub fn name(self) -> &'static str {
        match self {
            Pattern::Gradient => "gradient",
            Pattern::Rainbow => "rainbow",
            Pattern::Checkerboard => "checkerboard",
        }
    }
}

fn gradient(x: usize, y: usize, w: usize, h: usize) -> [u8; 3] {
    [
        (255 * x / w) as u8,
        (255 * y / h) as u8,
        (255 * (x + y) / (w + h)) as u8,
    ]
}

fn rainbow(x: usize, y: usize, w: usize, h: usize) -> [u8; 3] {
    let hue = (x + y) as f32 / (w + h) as f32;
    let sector = hue * 6.0;
    let c = 255.0_f32;
    let rising = c * (1.0 - ((sector % 2.0) - 1.0).abs());

    let (r, g, b) = match sector as u32 {
        0 => (c, rising, 0.0),
        1 => (rising, c, 0.0),
        2 => (0.0, c, rising),
        3 => (0.0, rising, c),
        4 => (rising, 0.0, c),
        _ => (c, 0.0, rising),
    };
    [r as u8, g as u8, b as u8]
}

fn checker(x: usize, y: usize) -> [u8; 3] {
    if (x / CHECKER_CELL + y / CHECKER_CELL) % 2 == 0 {
        [255, 255, 255]
    } else {
        [0, 0, 0]
    }
}

impl FromStr for Pattern {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::parse(format!("Unknown pattern type: {s}")))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
