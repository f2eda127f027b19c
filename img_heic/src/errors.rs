//! Shared error types for the JPEG to HEIC pipeline.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImgHeicError {
    /// The source bytes were not recognized as any supported image format.
    /// Reported separately from other failures so the batch loop can print
    /// a distinct skip line.
    #[error("Not a recognized image: {path}")]
    UnreadableImage { path: PathBuf },

    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Failed to encode HEIC: {0}")]
    EncodeError(String),

    #[error("Home directory could not be determined")]
    NoHomeDirectory,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ImgHeicError {
    pub fn is_unreadable(&self) -> bool {
        matches!(self, ImgHeicError::UnreadableImage { .. })
    }
}

pub type Result<T> = std::result::Result<T, ImgHeicError>;
