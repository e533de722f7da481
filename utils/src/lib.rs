//! Shared utilities for the attestation engine.

pub mod logging;
pub mod text;
pub mod time;

pub use logging::{init_logging, LogFormat};
pub use text::truncate_for_log;
pub use time::format_duration;
