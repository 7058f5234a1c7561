//! Error types for the `mpgg` crate.
//!
//! This module defines [`MpggError`], the unified error type returned by all
//! fallible operations in the crate. Errors carry the offending path or frame
//! index so a failed call can be diagnosed without extra logging.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned by caller-supplied kernels and host implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The unified error type for all `mpgg` operations.
///
/// A failed call never leaves a half-applied frame plan behind: the session
/// keeps its last good plan and clip.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MpggError {
    /// The index/project could not be produced, read, or reconciled with the
    /// source media. File system failures while reading a project land here
    /// with the project's path.
    #[error("Failed to load {path}: {reason}")]
    Load {
        /// Path of the input or project file.
        path: PathBuf,
        /// Underlying reason the load failed.
        reason: String,
    },

    /// The external demuxer failed to extract the elementary stream.
    #[error("Failed to demux {path}: {reason}")]
    Demux {
        /// Path of the container that was being demuxed.
        path: PathBuf,
        /// Underlying reason the demux failed.
        reason: String,
    },

    /// The caller-supplied deinterlace kernel failed or misbehaved.
    #[error("Deinterlace kernel error: {reason}")]
    Kernel {
        /// What the kernel did wrong.
        reason: String,
    },

    /// No target rate could be determined, or the rate was already normalized.
    #[error("Frame rate error: {0}")]
    Rate(String),

    /// Operations were requested in an order the session refuses.
    #[error("Invalid usage: {0}")]
    Usage(String),

    /// The frame-serving host rejected an operation.
    #[error("Host error during {operation}: {reason}")]
    Host {
        /// Name of the host operation (`load`, `assemble`, `remap`, `splice`).
        operation: &'static str,
        /// Underlying reason reported by the host.
        reason: String,
    },
}

impl MpggError {
    /// Wrap a host failure for the named operation.
    pub(crate) fn host(operation: &'static str, error: BoxError) -> Self {
        MpggError::Host {
            operation,
            reason: error.to_string(),
        }
    }
}
