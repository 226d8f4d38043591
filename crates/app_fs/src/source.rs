//! Media source: the store the review feed reads from and deletes into

use crate::{
    browser::{list_media, ListOptions},
    file_operations::{delete_permanently, move_to_trash, trash_supported},
    FsError, MediaFilter, MediaItem, Result,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

/// How a source can get rid of media
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteCapability {
    /// Items go to a trash after the user confirms a batched request
    Trash,
    /// No trash concept, deletion is immediate and irrevocable
    PermanentOnly,
}

/// Opaque ticket for a pending trash request awaiting user confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationHandle {
    id: u64,
    items: Vec<MediaItem>,
}

impl ConfirmationHandle {
    pub fn new(id: u64, items: Vec<MediaItem>) -> Self {
        Self { id, items }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Items the confirmation covers
    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Media store collaborator.
///
/// Implementations are blocking; callers on an async runtime dispatch them
/// to a blocking pool.
pub trait MediaSource: Send + Sync {
    fn capability(&self) -> DeleteCapability;

    /// Ordered listing (newest first) of the items matching `filter`
    fn list(&self, filter: MediaFilter) -> Result<Vec<MediaItem>>;

    /// Delete one item immediately. `Ok(false)` when nothing was removed.
    fn delete(&self, item: &MediaItem) -> Result<bool>;

    /// Prepare one batched trash request for `items`
    fn create_trash_request(&self, items: &[MediaItem]) -> Result<ConfirmationHandle>;

    /// Carry out a confirmed trash request
    fn complete_trash_request(&self, handle: &ConfirmationHandle) -> Result<()>;

    /// Forget a request the user declined
    fn discard_trash_request(&self, handle: &ConfirmationHandle);
}

/// Media source over a local directory tree
pub struct DirectoryMediaSource {
    root: PathBuf,
    options: ListOptions,
    capability: DeleteCapability,
    next_request: AtomicU64,
    requests: Mutex<HashMap<u64, Vec<PathBuf>>>,
}

impl DirectoryMediaSource {
    /// Create a source rooted at `root`.
    ///
    /// `use_trash` is honoured only when the build supports the OS trash.
    pub fn new(root: impl Into<PathBuf>, options: ListOptions, use_trash: bool) -> Self {
        let capability = if use_trash && trash_supported() {
            DeleteCapability::Trash
        } else {
            DeleteCapability::PermanentOnly
        };

        Self {
            root: root.into(),
            options,
            capability,
            next_request: AtomicU64::new(1),
            requests: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn local_path(item: &MediaItem) -> Result<PathBuf> {
        item.file_path()
            .ok_or_else(|| FsError::NotLocal(item.uri().to_string()))
    }

    /// Number of trash requests still awaiting an answer
    pub fn outstanding_requests(&self) -> usize {
        self.requests.lock().len()
    }
}

impl MediaSource for DirectoryMediaSource {
    fn capability(&self) -> DeleteCapability {
        self.capability
    }

    fn list(&self, filter: MediaFilter) -> Result<Vec<MediaItem>> {
        let items: Vec<MediaItem> = list_media(&self.root, &self.options)?
            .into_iter()
            .map(|entry| entry.item)
            .filter(|item| filter.matches(item))
            .collect();

        tracing::debug!(filter = %filter, count = items.len(), "Listed media");
        Ok(items)
    }

    fn delete(&self, item: &MediaItem) -> Result<bool> {
        let path = Self::local_path(item)?;
        if !path.exists() {
            return Ok(false);
        }
        delete_permanently(&path)?;
        Ok(true)
    }

    fn create_trash_request(&self, items: &[MediaItem]) -> Result<ConfirmationHandle> {
        if self.capability != DeleteCapability::Trash {
            return Err(FsError::Trash("Source has no trash".to_string()));
        }

        let paths = items
            .iter()
            .map(Self::local_path)
            .collect::<Result<Vec<_>>>()?;

        let id = self.next_request.fetch_add(1, Ordering::Relaxed);
        self.requests.lock().insert(id, paths);

        tracing::info!(request = id, count = items.len(), "Created trash request");
        Ok(ConfirmationHandle::new(id, items.to_vec()))
    }

    fn complete_trash_request(&self, handle: &ConfirmationHandle) -> Result<()> {
        let paths = self
            .requests
            .lock()
            .remove(&handle.id())
            .ok_or(FsError::UnknownRequest(handle.id()))?;

        move_to_trash(&paths)
    }

    fn discard_trash_request(&self, handle: &ConfirmationHandle) {
        if self.requests.lock().remove(&handle.id()).is_some() {
            tracing::info!(request = handle.id(), "Trash request declined");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn populated() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.jpg", "b.png", "c.gif", "d.mp4", "e.webp"] {
            fs::write(dir.path().join(name), name.as_bytes()).unwrap();
        }
        dir
    }

    #[test]
    fn test_list_applies_filter() {
        let dir = populated();
        let source = DirectoryMediaSource::new(dir.path(), ListOptions::default(), false);

        assert_eq!(source.list(MediaFilter::All).unwrap().len(), 4);
        assert_eq!(source.list(MediaFilter::Images).unwrap().len(), 2);
        assert_eq!(source.list(MediaFilter::Gifs).unwrap().len(), 1);
        assert_eq!(source.list(MediaFilter::Videos).unwrap().len(), 1);
    }

    #[test]
    fn test_permanent_delete() {
        let dir = populated();
        let source = DirectoryMediaSource::new(dir.path(), ListOptions::default(), false);
        assert_eq!(source.capability(), DeleteCapability::PermanentOnly);

        let item = MediaItem::from_path(dir.path().join("a.jpg")).unwrap();
        assert!(source.delete(&item).unwrap());
        assert!(!dir.path().join("a.jpg").exists());
        assert!(!source.delete(&item).unwrap());
    }

    #[test]
    fn test_trash_request_requires_trash_capability() {
        let dir = populated();
        let source = DirectoryMediaSource::new(dir.path(), ListOptions::default(), false);
        let item = MediaItem::from_path(dir.path().join("a.jpg")).unwrap();
        assert!(source.create_trash_request(&[item]).is_err());
    }

    #[test]
    fn test_non_local_items_rejected() {
        let dir = populated();
        let source = DirectoryMediaSource::new(dir.path(), ListOptions::default(), false);
        let remote = MediaItem::new("content://media/1", crate::MediaKind::Image, "image/jpeg");
        assert!(matches!(source.delete(&remote), Err(FsError::NotLocal(_))));
    }

    #[cfg(feature = "trash-support")]
    #[test]
    fn test_declined_request_is_forgotten() {
        let dir = populated();
        let source = DirectoryMediaSource::new(dir.path(), ListOptions::default(), true);
        let item = MediaItem::from_path(dir.path().join("b.png")).unwrap();

        let handle = source.create_trash_request(&[item]).unwrap();
        assert_eq!(handle.len(), 1);
        assert_eq!(source.outstanding_requests(), 1);

        source.discard_trash_request(&handle);
        assert_eq!(source.outstanding_requests(), 0);
        assert!(matches!(
            source.complete_trash_request(&handle),
            Err(FsError::UnknownRequest(_))
        ));
        assert!(dir.path().join("b.png").exists());
    }
}
