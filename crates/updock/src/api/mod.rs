//! API route handlers

pub mod checks;
pub mod containers;
pub mod error;
pub mod hosts;
pub mod settings;
pub mod system;
pub mod ws;

pub use error::{ApiError, AppError};
