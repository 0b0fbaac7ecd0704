//! # Musan Common Library
//!
//! Shared code for the musan listening-history analyzer including:
//! - Common error type
//! - TOML configuration loading and credential resolution
//! - Calendar date / timestamp helpers
//! - Human-readable duration formatting

pub mod config;
pub mod error;
pub mod human_time;
pub mod time;

pub use error::{Error, Result};
