//! Application layer: formats and services
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod error;
pub mod format;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
pub use format::{FeatureModelFormat, JsonFormat};
