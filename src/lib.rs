pub mod config;
pub mod error;
pub mod logging;
pub mod matrix;
pub mod patterns;

pub use error::{AppError, Result};
