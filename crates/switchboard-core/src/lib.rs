//! Core types shared across the Switchboard system.
//!
//! Defines the capability label set, the unified response shape, health
//! reporting types, configuration, and the top-level error type.

pub mod config;
pub mod error;
pub mod types;

pub use config::SwitchboardConfig;
pub use error::{Result, SwitchboardError};
pub use types::*;
