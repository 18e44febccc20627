//! Retouch Core Library
//!
//! This crate provides the error types, environment configuration, adjustment
//! configuration tree and shared models used by every Retouch component.

pub mod config;
pub mod configuration;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{Config, ImageConfig};
pub use configuration::{ConfigValue, Configuration};
pub use error::{ErrorMetadata, LogLevel, MediaError, MediaResult};
pub use models::ImageSize;
