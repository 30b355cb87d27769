//! # dwarfsrc utilities
//!
//! Logging setup shared by the dwarfsrc binaries, built on `tracing`.

pub mod logging;

// Re-export commonly used logging items for convenience
pub use logging::{init_logging, LogConfig, LogFormat, LogLevel, LoggingError, LoggingGuard};
pub use tracing::{debug, error, info, trace, warn};
