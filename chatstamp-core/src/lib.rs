//! # chatstamp-core
//!
//! Core library for chatstamp - display formatting for chat message timestamps.
//!
//! This library provides:
//! - Timestamp normalization (naive vs. offset-annotated input)
//! - Absolute ("Jan 1, 05:00 AM") and relative ("5 minutes ago") rendering
//! - The chat message envelope published by the backend
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use chatstamp_core::{Config, Normalizer};
//!
//! let config = Config::load().expect("failed to load config");
//! let normalizer = Normalizer::from_config(&config.timestamps).expect("invalid config");
//!
//! println!("{}", normalizer.render(Some("2024-01-01T10:00:00")));
//! ```

// Re-export commonly used items at the crate root
pub use config::{Config, TimestampConfig};
pub use error::{Error, Result};
pub use message::ChatMessage;
pub use timestamp::{
    time_ago, DisplayPolicy, HourCycle, NaiveZone, NormalizedInstant, Normalizer, ViewerZone,
    ZoneSource,
};

// Public modules
pub mod config;
pub mod error;
pub mod logging;
pub mod message;
pub mod timestamp;
