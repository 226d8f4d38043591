//! PhotoReviewer Media Store Abstraction Layer
//!
//! Provides the media model and the collaborators the review core talks to:
//! - MediaItem / MediaKind / MediaFilter: what is being reviewed
//! - MediaSource: listing, deletion and trash requests
//! - MetadataReader: best-effort size, dimensions, EXIF capture time and GPS
//! - Directory browsing over a local media root

mod media;
mod browser;
mod file_operations;
mod source;
pub mod metadata;

pub use media::{MediaItem, MediaKind, MediaFilter};
pub use browser::{ListOptions, MediaEntry, list_media};
pub use file_operations::{delete_permanently, move_to_trash, trash_supported};
pub use source::{MediaSource, DirectoryMediaSource, DeleteCapability, ConfirmationHandle};
pub use metadata::{MetadataReader, ExifMetadataReader, MediaDetails, GeoCoordinates, CaptureTime, format_file_size};

use thiserror::Error;

/// Media store errors
#[derive(Error, Debug)]
pub enum FsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Not a local media item: {0}")]
    NotLocal(String),

    #[error("Trash error: {0}")]
    Trash(String),

    #[error("Unknown trash request: {0}")]
    UnknownRequest(u64),
}

impl FsError {
    /// Map an I/O error for `path` onto the more specific variants
    pub fn from_io(err: std::io::Error, path: &std::path::Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound(path.display().to_string()),
            std::io::ErrorKind::PermissionDenied => FsError::AccessDenied(path.display().to_string()),
            _ => FsError::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, FsError>;
