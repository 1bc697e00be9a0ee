//! Core logic for the Mostaql notification watcher.
//!
//! This crate is transport-agnostic. The marketplace HTTP client and the
//! Telegram sender live behind ports (traits) implemented in adapter crates.

pub mod checker;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod ports;

pub use errors::{Error, Result};
