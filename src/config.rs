//! Runtime configuration.

use crate::level::Level;

/// Buffering strategy selected at [`initialize`](crate::initialize) time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Bounded ring buffer; newest records win when producers out-pace the
    /// drainer, so records may be dropped.
    NonGuaranteed {
        /// Ring capacity in megabytes of slot storage. Clamped to at least
        /// one; each megabyte holds 4096 slots.
        ring_buffer_size_mb: u32,
    },
    /// Unbounded segment queue; every submitted record reaches the sink.
    Guaranteed,
}

/// Configuration consumed by [`initialize`](crate::initialize).
#[derive(Debug, Clone)]
pub struct Config {
    /// Buffering strategy.
    pub mode: Mode,
    /// Path prefix for output files, concatenated verbatim with the file
    /// name (include a trailing separator for a directory).
    pub log_directory: String,
    /// Base name of the output files.
    pub log_file_name: String,
    /// Roll threshold in megabytes; clamped to at least one.
    pub log_file_roll_size_mb: u32,
    /// Initial severity threshold for the process-wide gate.
    pub level_threshold: Level,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mode: Mode::Guaranteed,
            log_directory: String::from("./"),
            log_file_name: String::from("flashlog"),
            log_file_roll_size_mb: 10,
            level_threshold: Level::Info,
        }
    }
}
