//! ofrest Core Library
//!
//! This crate provides the network-free half of the Openfire REST client:
//! - Server error tags mapped onto a closed set of error kinds
//! - Classification of raw HTTP responses into replies or typed failures
//! - Normalization of singleton-vs-collection response shapes
//! - Request payloads and read models
//! - Client configuration

pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod normalize;

// Re-export commonly used types
pub use config::{ClientConfig, EnvOverrides};
pub use dispatch::{classify, Reply};
pub use error::{ApiError, ErrorKind};
pub use models::*;
pub use normalize::{normalize, normalize_as, Shape};
