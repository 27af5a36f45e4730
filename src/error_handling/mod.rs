// src/error_handling/mod.rs
//! Error handling for solana-pulse
//!
//! This module defines the error types shared by the data sources, the
//! analytics engine and the command-line front end.

pub mod error_types;

pub use error_types::{PulseError, PulseResult, SourceError};
