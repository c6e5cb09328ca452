//! Bounce a checkerboard sprite around the panel.
//!
//! Usage: cargo run --example sprite_bounce [PORT] [FRAMES]
//!
//! Default port: /dev/ttyUSB0

use std::thread;
use std::time::Duration;

use matrix_display::matrix::{MatrixDisplay, byte_field};
use matrix_display::patterns::Pattern;

const PANEL: i64 = 64;
const SPRITE: u8 = 12;
const SPRITE_ID: u8 = 0;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let port = std::env::args().nth(1).unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let frames: u32 = std::env::args().nth(2).and_then(|s| s.parse().ok()).unwrap_or(200);

    println!("Sprite bounce on {port} ({frames} frames)");
    println!("======================================");

    let display = MatrixDisplay::new(&port);

    println!("\n[1] Clearing screen...");
    display.clear()?.into_result()?;

    println!("[2] Uploading sprite {SPRITE_ID} ({SPRITE}x{SPRITE})...");
    let pixels = Pattern::Checkerboard.render(SPRITE, SPRITE);
    display.set_sprite(SPRITE_ID, 0, 0, SPRITE, SPRITE, &pixels)?.into_result()?;

    println!("[3] Animating...");
    let max = PANEL - i64::from(SPRITE);
    let (mut x, mut y) = (0i64, 0i64);
    let (mut dx, mut dy) = (2i64, 1i64);
    let mut failures = 0;

    for _ in 0..frames {
        x += dx;
        y += dy;
        if x <= 0 || x >= max {
            dx = -dx;
            x = x.clamp(0, max);
        }
        if y <= 0 || y >= max {
            dy = -dy;
            y = y.clamp(0, max);
        }

        let ack = display.move_sprite(SPRITE_ID, byte_field("x", x)?, byte_field("y", y)?)?;
        if !ack.success {
            failures += 1;
            println!("    move failed: {}", ack.message);
        }

        thread::sleep(Duration::from_millis(50));
    }

    println!("\n[4] Removing sprite...");
    display.clear_sprite(SPRITE_ID)?.into_result()?;

    println!("Done ({failures} failed moves)");
    Ok(())
}
