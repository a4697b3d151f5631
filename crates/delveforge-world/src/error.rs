//! Error types for the world contracts.

use std::path::PathBuf;

/// Errors a world collaborator can report back to the instance manager.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The loader found the template file but could not merge it into
    /// the base world.
    #[error("failed to merge map file '{path}': {message}")]
    MapMerge { path: PathBuf, message: String },

    /// Reading the template file failed at the I/O level.
    #[error("failed to read map file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
