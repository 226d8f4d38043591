//! Application state management

use crate::{AppConfig, AppError, DeletionController, FeedCursor, ResourceHandle, ZoomableView};
use app_db::{DbPool, FavoritesDb, SqliteCounterStore};
use app_fs::{DirectoryMediaSource, ExifMetadataReader, ListOptions, MediaItem, MetadataReader};
use std::path::Path;
use std::sync::Arc;

/// Main application state, owned by the front-end task
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// Database pool
    pub db_pool: DbPool,

    /// Media list, deletion marks and statistics
    pub controller: DeletionController,

    /// Position in the current batch
    pub cursor: FeedCursor,

    /// Zoom state of the item being shown
    pub viewer: ZoomableView,

    /// Preview bytes for the detail page
    pub resources: Arc<ResourceHandle>,

    metadata: Arc<dyn MetadataReader>,
}

impl AppState {
    /// Create a new application state with the database in the platform data directory
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let db_pool = app_db::init().map_err(|e| AppError::Init(e.to_string()))?;
        Ok(Self::with_pool(config, db_pool))
    }

    /// Same as [`AppState::new`] with the database inside `dir`
    pub fn with_db_dir(config: AppConfig, dir: &Path) -> Result<Self, AppError> {
        let db_pool = app_db::init_at(dir).map_err(|e| AppError::Init(e.to_string()))?;
        Ok(Self::with_pool(config, db_pool))
    }

    fn with_pool(config: AppConfig, db_pool: DbPool) -> Self {
        let library = &config.library;
        let root = library.resolved_root();
        let options = ListOptions {
            show_hidden: library.show_hidden_files,
            recursive: library.recursive,
            ..ListOptions::default()
        };

        tracing::info!(root = %root.display(), use_trash = config.deletion.use_trash, "Opening media library");
        let source = Arc::new(DirectoryMediaSource::new(root, options, config.deletion.use_trash));
        let counters = Arc::new(SqliteCounterStore::new(db_pool.clone()));
        let metadata: Arc<dyn MetadataReader> = Arc::new(ExifMetadataReader::new());

        let controller = DeletionController::new(source, counters, metadata.clone())
            .with_favorites(FavoritesDb::new(db_pool.clone()))
            .with_batch_size(library.batch_size)
            .with_filter(library.filter);

        let resources = Arc::new(ResourceHandle::new(config.cache.preview_cache_bytes()));
        let viewer = ZoomableView::new(config.viewer.clone());

        Self {
            config,
            db_pool,
            controller,
            cursor: FeedCursor::new(),
            viewer,
            resources,
            metadata,
        }
    }

    /// Bring the cursor in line with the controller's media list
    pub fn sync_cursor(&mut self) {
        self.cursor.sync(self.controller.media().to_vec());
    }

    /// Item under the cursor
    pub fn current(&self) -> Option<&MediaItem> {
        self.cursor.current()
    }

    /// Pixel size of `item` for the viewer, read on the blocking pool
    pub async fn content_size(&self, item: &MediaItem) -> Option<(u32, u32)> {
        let metadata = self.metadata.clone();
        let item = item.clone();
        tokio::task::spawn_blocking(move || metadata.pixel_dimensions(&item))
            .await
            .ok()
            .flatten()
    }

    /// Save the current configuration
    pub fn save_config(&self) -> anyhow::Result<()> {
        self.config.save()
    }

    /// Release resources before exit
    pub fn shutdown(&mut self) {
        self.viewer.cleanup();
        self.resources.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_fs::MediaFilter;

    #[tokio::test]
    async fn test_wires_library_into_controller() {
        let library = tempfile::tempdir().unwrap();
        for i in 0..5 {
            image::RgbImage::new(8, 4)
                .save(library.path().join(format!("img{i}.png")))
                .unwrap();
        }
        std::fs::write(library.path().join("notes.txt"), "skip").unwrap();

        let mut config = AppConfig::default();
        config.library.root = Some(library.path().to_path_buf());
        config.library.batch_size = 3;
        config.deletion.use_trash = false;

        let data = tempfile::tempdir().unwrap();
        let mut state = AppState::with_db_dir(config, data.path()).unwrap();
        assert_eq!(state.controller.filter(), MediaFilter::All);

        state.controller.load_media().await;
        state.sync_cursor();
        assert_eq!(state.cursor.len(), 3);

        let current = state.current().cloned().unwrap();
        assert_eq!(state.content_size(&current).await, Some((8, 4)));

        state.shutdown();
        assert!(!state.resources.is_allocated());
    }
}
