//! matrix-display - drive a serial LED matrix from the command line.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use matrix_display as app;

use app::config::{AppConfig, ConfigLoadResult};
use app::matrix::{Acknowledgment, MatrixDisplay, Rgb, list_ports};
use app::patterns::Pattern;
use app::{AppError, logging};

/// Control LED matrix displays via serial.
#[derive(Parser)]
#[command(name = "matrix-display", version)]
struct Cli {
    /// Serial port (e.g., /dev/ttyUSB0); overrides the config file
    #[arg(long, global = true)]
    port: Option<String>,

    /// Baud rate; overrides the config file
    #[arg(long, global = true)]
    baud: Option<u32>,

    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use config.toml from current directory (dev mode)
    #[arg(long, global = true)]
    dev: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Color components (0-255).
#[derive(Args)]
struct ColorArgs {
    r: u8,
    g: u8,
    b: u8,
}

impl From<ColorArgs> for Rgb {
    fn from(c: ColorArgs) -> Self {
        Rgb::new(c.r, c.g, c.b)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List available serial ports
    Ports,
    /// Draw a single pixel
    Pixel {
        x: u8,
        y: u8,
        #[command(flatten)]
        color: ColorArgs,
    },
    /// Draw a line from (x0, y0) to (x1, y1)
    Line {
        x0: u8,
        y0: u8,
        x1: u8,
        y1: u8,
        #[command(flatten)]
        color: ColorArgs,
    },
    /// Draw a rectangle outline
    Rect {
        x: u8,
        y: u8,
        width: u8,
        height: u8,
        #[command(flatten)]
        color: ColorArgs,
    },
    /// Fill a rectangle with color
    FillRect {
        x: u8,
        y: u8,
        width: u8,
        height: u8,
        #[command(flatten)]
        color: ColorArgs,
    },
    /// Draw a vertical line
    Vline {
        x: u8,
        y: u8,
        height: u8,
        #[command(flatten)]
        color: ColorArgs,
    },
    /// Draw a horizontal line
    Hline {
        x: u8,
        y: u8,
        width: u8,
        #[command(flatten)]
        color: ColorArgs,
    },
    /// Fill entire screen with color
    Fill {
        #[command(flatten)]
        color: ColorArgs,
    },
    /// Set display brightness (0-255)
    Brightness { brightness: u8 },
    /// Print text at current cursor position
    Print { text: String },
    /// Set cursor position
    Cursor { x: u8, y: u8 },
    /// Clear the screen
    Clear,
    /// Draw a built-in test pattern (gradient, rainbow, checkerboard)
    Pattern {
        pattern: Pattern,
        #[arg(long, default_value_t = 0)]
        x: u8,
        #[arg(long, default_value_t = 0)]
        y: u8,
        #[arg(long, default_value_t = 64)]
        width: u8,
        #[arg(long, default_value_t = 64)]
        height: u8,
    },
    /// Manage device sprites
    Sprite {
        #[command(subcommand)]
        action: SpriteCommand,
    },
    /// Write a default config file
    InitConfig,
}

#[derive(Subcommand)]
enum SpriteCommand {
    /// Store a test pattern in a sprite slot (0-15)
    Set {
        id: u8,
        pattern: Pattern,
        #[arg(long, default_value_t = 0)]
        x: u8,
        #[arg(long, default_value_t = 0)]
        y: u8,
        #[arg(long, default_value_t = 16)]
        width: u8,
        #[arg(long, default_value_t = 16)]
        height: u8,
    },
    /// Draw a stored sprite
    Draw { id: u8, x: u8, y: u8 },
    /// Move a stored sprite
    Move { id: u8, x: u8, y: u8 },
    /// Remove a sprite
    Clear { id: u8 },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Determine config path based on mode
    let config_path = match (&cli.config, cli.dev) {
        (Some(path), _) => path.clone(),
        (None, true) => PathBuf::from("config.toml"),
        (None, false) => AppConfig::default_path(),
    };

    let (config, missing) = match AppConfig::try_load(&config_path) {
        ConfigLoadResult::Loaded(config) => (config, false),
        ConfigLoadResult::Missing => (AppConfig::default(), true),
        ConfigLoadResult::Invalid(e) => {
            return Err(AppError::from(e)).with_context(|| format!("Loading {}", config_path.display()));
        }
    };

    // Initialize logging
    let _log_guard = logging::init(&config.logging);
    tracing::debug!("Config path: {:?} (missing: {missing})", config_path);

    run(cli, config, &config_path)
}

fn run(cli: Cli, mut config: AppConfig, config_path: &Path) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Ports => {
            print_ports()?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::InitConfig => {
            config.save(config_path)?;
            println!("Wrote {}", config_path.display());
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    if let Some(port) = cli.port {
        config.serial.port = port;
    }
    if let Some(baud) = cli.baud {
        config.serial.baud_rate = baud;
    }
    if config.serial.port.is_empty() {
        return Err(AppError::NoPort.into());
    }

    let display = MatrixDisplay::from_config(&config.serial);
    tracing::info!("Using {} at {} baud", config.serial.port, config.serial.baud_rate);

    let ack = match cli.command {
        Commands::Pixel { x, y, color } => display.draw_pixel(x, y, color.into()),
        Commands::Line { x0, y0, x1, y1, color } => display.draw_line(x0, y0, x1, y1, color.into()),
        Commands::Rect { x, y, width, height, color } => display.draw_rect(x, y, width, height, color.into()),
        Commands::FillRect { x, y, width, height, color } => display.fill_rect(x, y, width, height, color.into()),
        Commands::Vline { x, y, height, color } => display.draw_fast_vline(x, y, height, color.into()),
        Commands::Hline { x, y, width, color } => display.draw_fast_hline(x, y, width, color.into()),
        Commands::Fill { color } => display.fill_screen(color.into()),
        Commands::Brightness { brightness } => display.set_brightness(brightness),
        Commands::Print { text } => display.print_text(&text),
        Commands::Cursor { x, y } => display.set_cursor(x, y),
        Commands::Clear => display.clear(),
        Commands::Pattern { pattern, x, y, width, height } => {
            let pixels = pattern.render(width, height);
            display.draw_bitmap(x, y, width, height, &pixels)
        }
        Commands::Sprite { action } => match action {
            SpriteCommand::Set { id, pattern, x, y, width, height } => {
                let pixels = pattern.render(width, height);
                display.set_sprite(id, x, y, width, height, &pixels)
            }
            SpriteCommand::Draw { id, x, y } => display.draw_sprite(id, x, y),
            SpriteCommand::Move { id, x, y } => display.move_sprite(id, x, y),
            SpriteCommand::Clear { id } => display.clear_sprite(id),
        },
        Commands::Ports | Commands::InitConfig => unreachable!("handled above"),
    }
    .map_err(AppError::from)?;

    Ok(report(&ack))
}

/// Print an acknowledgment and map it to the process exit code.
fn report(ack: &Acknowledgment) -> ExitCode {
    if ack.success {
        println!("✓ {}", ack.message);
        ExitCode::SUCCESS
    } else {
        eprintln!("✗ Error: {}", ack.message);
        ExitCode::FAILURE
    }
}

fn print_ports() -> anyhow::Result<()> {
    let ports = list_ports().context("Failed to enumerate serial ports")?;
    if ports.is_empty() {
        println!("No serial ports found");
        return Ok(());
    }

    let name_width = ports.iter().map(|p| p.name.len()).max().unwrap_or(4).max(4);
    let desc_width = ports.iter().map(|p| p.description.len()).max().unwrap_or(11).max(11);

    println!("{:<name_width$}  {:<desc_width$}  Hardware ID", "Port", "Description");
    for port in &ports {
        println!(
            "{:<name_width$}  {:<desc_width$}  {}",
            port.name, port.description, port.hardware_id
        );
    }
    Ok(())
}
