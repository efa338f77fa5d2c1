//! Core of the chatcast service: the stream registry with subscriber fan-out,
//! the stats aggregation engine, and the channel handler contract that
//! platform adapters implement.

pub mod config;
pub mod error;
pub mod handler;
pub mod logging;
pub mod models;
pub mod registry;
pub mod singleflight;
pub mod stats;

pub use config::Config;
pub use error::{Error, Result};
