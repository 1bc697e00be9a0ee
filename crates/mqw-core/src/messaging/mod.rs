//! Outbound alert channel (Telegram today).

pub mod disabled;
pub mod port;
