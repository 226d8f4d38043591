//! PhotoReviewer Core Domain Logic
//!
//! This crate contains:
//! - Zoom viewer state (pinch, pan, fling, double-tap)
//! - Deletion/undo controller for the review feed
//! - Feed cursor
//! - Preview cache
//! - Configuration
//! - Error types

pub mod config;
pub mod deletion;
pub mod error;
pub mod navigation;
pub mod resource;
pub mod state;
pub mod transform;
pub mod zoomable;

pub use config::{AppConfig, CacheConfig, DeletionConfig, LibraryConfig, LoggingConfig, ViewerConfig};
pub use deletion::{
    ControllerEvent, DeletionController, DeletionStats, FinalizationOutcome, PendingDeletion,
    SettingsInfo, DEFAULT_BATCH_SIZE,
};
pub use error::AppError;
pub use navigation::FeedCursor;
pub use resource::{CacheStats, Preview, PreviewCache, ResourceHandle};
pub use state::AppState;
pub use transform::{ContentSize, Geometry, Rect, Transform, TransformState, Viewport};
pub use zoomable::{GestureEvent, ViewState, ZoomableView};
