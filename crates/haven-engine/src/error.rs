//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup, the frame loop,
//! and the save written on exit.

use std::path::PathBuf;

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: haven_core::ConfigError,
    },

    /// Built-in content failed validation.
    #[error("content error: {source}")]
    Content {
        /// The underlying content error.
        #[from]
        source: haven_core::ContentError,
    },

    /// The simulation rejected an operation or a save file.
    #[error("simulation error: {source}")]
    Simulation {
        /// The underlying simulation error.
        #[from]
        source: haven_core::SimError,
    },

    /// Reading or writing the save file failed.
    #[error("save file {path}: {source}")]
    SaveFile {
        /// Path of the save file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Logging could not be initialised.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}
