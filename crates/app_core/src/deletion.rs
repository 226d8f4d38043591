//! Review feed controller: media list, deletion marks, undo and batched
//! deletion requests.
//!
//! The controller is owned by one task and mutated through `&mut self`.
//! Collaborator calls are blocking and run on tokio's blocking pool.
//! UI collaborators observe state through `watch` channels and one-shot
//! events through a `broadcast` channel.

use crate::error::AppError;
use app_db::{keys, CounterStore, FavoritesDb};
use app_fs::{ConfirmationHandle, DeleteCapability, MediaFilter, MediaItem, MediaSource, MetadataReader};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Default number of items per shuffled batch
pub const DEFAULT_BATCH_SIZE: usize = 16;

const EVENT_CAPACITY: usize = 32;

/// An item marked for deletion and the list position it was shown at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeletion {
    pub item: MediaItem,
    pub position: usize,
}

/// Deletion statistics snapshot for the settings page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsInfo {
    pub deleted_count: i32,
    pub deleted_size: i64,
}

/// What a finished deletion added to the statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletionStats {
    pub count: usize,
    pub bytes: u64,
}

/// One-shot notifications for the UI
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// Put `item` back into view at `position`
    Restore { item: MediaItem, position: usize },
    /// The user must approve this trash request
    ConfirmationRequired(ConfirmationHandle),
    /// Loading media failed; carries a user-facing message
    LoadFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FinalizationOutcome {
    NothingPending,
    /// An earlier request has not reported its result yet
    AlreadyInFlight,
    RequiresConfirmation(ConfirmationHandle),
    Completed(DeletionStats),
    Failed,
}

/// The deletion request awaiting its result
#[derive(Debug, Clone)]
struct InFlight {
    /// Trash request id, once the source has issued one
    request: Option<u64>,
    items: Vec<MediaItem>,
    /// Sizes are sampled before the request, while the files still exist
    bytes: u64,
}

pub struct DeletionController {
    source: Arc<dyn MediaSource>,
    counters: Arc<dyn CounterStore>,
    metadata: Arc<dyn MetadataReader>,
    favorites: Option<FavoritesDb>,

    batch_size: usize,
    seed: u64,

    media: Vec<MediaItem>,
    pending: Vec<PendingDeletion>,
    filter: MediaFilter,
    in_flight: Option<InFlight>,

    media_tx: watch::Sender<Vec<MediaItem>>,
    pending_tx: watch::Sender<Vec<PendingDeletion>>,
    can_undo_tx: watch::Sender<bool>,
    filter_tx: watch::Sender<MediaFilter>,
    settings_tx: watch::Sender<Option<SettingsInfo>>,
    events_tx: broadcast::Sender<ControllerEvent>,
}

async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// Deterministic shuffle keyed by `seed`
fn shuffle(mut items: Vec<MediaItem>, seed: u64) -> Vec<MediaItem> {
    items.sort_by_cached_key(|item| xxh3_64_with_seed(item.uri().as_bytes(), seed));
    items
}

fn clock_seed() -> u64 {
    let now = chrono::Utc::now();
    now.timestamp_nanos_opt()
        .map(|n| n as u64)
        .unwrap_or_else(|| now.timestamp() as u64)
}

impl DeletionController {
    pub fn new(
        source: Arc<dyn MediaSource>,
        counters: Arc<dyn CounterStore>,
        metadata: Arc<dyn MetadataReader>,
    ) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            source,
            counters,
            metadata,
            favorites: None,
            batch_size: DEFAULT_BATCH_SIZE,
            seed: clock_seed(),
            media: Vec::new(),
            pending: Vec::new(),
            filter: MediaFilter::All,
            in_flight: None,
            media_tx: watch::Sender::new(Vec::new()),
            pending_tx: watch::Sender::new(Vec::new()),
            can_undo_tx: watch::Sender::new(false),
            filter_tx: watch::Sender::new(MediaFilter::All),
            settings_tx: watch::Sender::new(None),
            events_tx,
        }
    }

    pub fn with_favorites(mut self, favorites: FavoritesDb) -> Self {
        self.favorites = Some(favorites);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_filter(mut self, filter: MediaFilter) -> Self {
        self.filter = filter;
        self.filter_tx.send_replace(filter);
        self
    }

    /// Fix the shuffle seed, for reproducible batches
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // ========================================
    // Observation
    // ========================================

    pub fn media(&self) -> &[MediaItem] {
        &self.media
    }

    pub fn pending(&self) -> &[PendingDeletion] {
        &self.pending
    }

    /// Whether the latest mark can be undone. Marks covered by the running
    /// request cannot.
    pub fn can_undo(&self) -> bool {
        self.pending.last().is_some_and(|p| !self.is_in_flight(&p.item))
    }

    fn is_in_flight(&self, item: &MediaItem) -> bool {
        self.in_flight.as_ref().is_some_and(|f| f.items.contains(item))
    }

    pub fn filter(&self) -> MediaFilter {
        self.filter
    }

    pub fn is_finalizing(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn watch_media(&self) -> watch::Receiver<Vec<MediaItem>> {
        self.media_tx.subscribe()
    }

    pub fn watch_pending(&self) -> watch::Receiver<Vec<PendingDeletion>> {
        self.pending_tx.subscribe()
    }

    pub fn watch_can_undo(&self) -> watch::Receiver<bool> {
        self.can_undo_tx.subscribe()
    }

    pub fn watch_filter(&self) -> watch::Receiver<MediaFilter> {
        self.filter_tx.subscribe()
    }

    pub fn watch_settings(&self) -> watch::Receiver<Option<SettingsInfo>> {
        self.settings_tx.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events_tx.subscribe()
    }

    fn publish_media(&self) {
        self.media_tx.send_replace(self.media.clone());
    }

    fn publish_pending(&self) {
        self.pending_tx.send_replace(self.pending.clone());
        self.can_undo_tx.send_replace(self.can_undo());
    }

    fn emit(&self, event: ControllerEvent) {
        // No subscribers is fine
        let _ = self.events_tx.send(event);
    }

    // ========================================
    // Marks and undo
    // ========================================

    /// Mark `item`, shown at `position`, for deletion
    pub fn mark_for_deletion(&mut self, item: MediaItem, position: usize) {
        if self.pending.iter().any(|p| p.item == item) {
            tracing::debug!(uri = item.uri(), "Already marked for deletion");
            return;
        }
        tracing::debug!(uri = item.uri(), position, "Marked for deletion");
        self.pending.push(PendingDeletion { item, position });
        self.publish_pending();
    }

    /// Restore the most recent mark. `None` when nothing is pending or the
    /// mark is part of the running deletion request.
    pub fn undo_last_mark(&mut self) -> Option<PendingDeletion> {
        let last = self.pending.last()?;
        if self.is_in_flight(&last.item) {
            tracing::debug!(uri = last.item.uri(), "Mark belongs to the running deletion request");
            return None;
        }
        let restored = self.pending.pop()?;

        if !self.media.contains(&restored.item) {
            let at = restored.position.min(self.media.len());
            self.media.insert(at, restored.item.clone());
            self.publish_media();
        }
        self.publish_pending();

        tracing::debug!(uri = restored.item.uri(), position = restored.position, "Undid deletion mark");
        self.emit(ControllerEvent::Restore {
            item: restored.item.clone(),
            position: restored.position,
        });
        Some(restored)
    }

    /// Optimistically drop `item` from the feed
    pub fn remove_from_list(&mut self, item: &MediaItem) {
        let before = self.media.len();
        self.media.retain(|m| m != item);
        if self.media.len() != before {
            self.publish_media();
        }
    }

    // ========================================
    // Finalization
    // ========================================

    /// Send every pending item to the media source in one request
    pub async fn request_finalization(&mut self) -> FinalizationOutcome {
        if self.in_flight.is_some() {
            tracing::warn!("Deletion request already in flight");
            return FinalizationOutcome::AlreadyInFlight;
        }
        if self.pending.is_empty() {
            return FinalizationOutcome::NothingPending;
        }

        let items: Vec<MediaItem> = self.pending.iter().map(|p| p.item.clone()).collect();
        let bytes = self.sum_sizes(items.clone()).await;
        self.in_flight = Some(InFlight {
            request: None,
            items: items.clone(),
            bytes,
        });
        self.publish_pending();

        match self.source.capability() {
            DeleteCapability::Trash => {
                let source = self.source.clone();
                let result = blocking(move || Ok(source.create_trash_request(&items)?)).await;
                match result {
                    Ok(handle) => {
                        if let Some(in_flight) = self.in_flight.as_mut() {
                            in_flight.request = Some(handle.id());
                        }
                        tracing::info!(request = handle.id(), count = handle.len(), "Awaiting confirmation");
                        self.emit(ControllerEvent::ConfirmationRequired(handle.clone()));
                        FinalizationOutcome::RequiresConfirmation(handle)
                    }
                    Err(e) => self.abandon(e),
                }
            }
            DeleteCapability::PermanentOnly => {
                let source = self.source.clone();
                let result = blocking(move || {
                    let mut missing = Vec::new();
                    for item in &items {
                        if !source.delete(item)? {
                            tracing::warn!(uri = item.uri(), "Nothing deleted");
                            missing.push(item.uri().to_string());
                        }
                    }
                    if missing.is_empty() {
                        Ok(())
                    } else {
                        Err(AppError::Deletion(format!("not found: {}", missing.join(", "))))
                    }
                })
                .await;
                match result {
                    Ok(()) => match self.on_finalization_result(true).await {
                        Some(stats) => FinalizationOutcome::Completed(stats),
                        None => FinalizationOutcome::Failed,
                    },
                    Err(e) => self.abandon(e),
                }
            }
        }
    }

    /// Failed request: log, release the guard, keep the marks
    fn abandon(&mut self, err: AppError) -> FinalizationOutcome {
        tracing::error!(error = %err, "Error requesting deletion");
        self.in_flight = None;
        self.publish_pending();
        FinalizationOutcome::Failed
    }

    /// Answer a trash confirmation
    pub async fn resolve_confirmation(
        &mut self,
        handle: ConfirmationHandle,
        approved: bool,
    ) -> FinalizationOutcome {
        let outstanding = self.in_flight.as_ref().and_then(|f| f.request);
        if outstanding != Some(handle.id()) {
            tracing::warn!(request = handle.id(), ?outstanding, "Confirmation does not match the running request");
            return FinalizationOutcome::Failed;
        }

        let source = self.source.clone();

        if !approved {
            tracing::info!(request = handle.id(), "Deletion declined");
            let _ = blocking(move || {
                source.discard_trash_request(&handle);
                Ok(())
            })
            .await;
            self.on_finalization_result(false).await;
            return FinalizationOutcome::Failed;
        }

        let result = blocking(move || Ok(source.complete_trash_request(&handle)?)).await;
        let success = match result {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Trash request failed");
                false
            }
        };

        match self.on_finalization_result(success).await {
            Some(stats) => FinalizationOutcome::Completed(stats),
            None => FinalizationOutcome::Failed,
        }
    }

    /// Apply the result of a deletion request.
    ///
    /// Only the items the request covered leave `pending`, on success or
    /// failure. Marks made while it was running stay. Without a running
    /// request every pending item counts as covered.
    ///
    /// Returns the statistics added on success.
    pub async fn on_finalization_result(&mut self, success: bool) -> Option<DeletionStats> {
        let (items, sampled) = match self.in_flight.take() {
            Some(f) => (f.items, Some(f.bytes)),
            None => (self.pending.iter().map(|p| p.item.clone()).collect(), None),
        };

        let finished: HashSet<&MediaItem> = items.iter().collect();
        self.pending.retain(|p| !finished.contains(&p.item));
        if success {
            self.media.retain(|m| !finished.contains(m));
            self.publish_media();
        }
        self.publish_pending();

        if !success {
            return None;
        }
        if items.is_empty() {
            return Some(DeletionStats::default());
        }

        let bytes = match sampled {
            Some(bytes) => bytes,
            None => self.sum_sizes(items.clone()).await,
        };
        let stats = DeletionStats {
            count: items.len(),
            bytes,
        };

        let counters = self.counters.clone();
        let recorded = blocking(move || {
            let count = i32::try_from(stats.count).unwrap_or(i32::MAX);
            let size = i64::try_from(stats.bytes).unwrap_or(i64::MAX);
            counters.increment_int(keys::DELETED_PHOTO_COUNT, count)?;
            counters.increment_long(keys::DELETED_PHOTO_SIZE, size)?;
            Ok(())
        })
        .await;
        if let Err(e) = recorded {
            tracing::error!(error = %e, "Failed to record deletion statistics");
        }

        tracing::info!(count = stats.count, bytes = stats.bytes, "Deletion finalized");

        if self.media.is_empty() {
            self.load_media().await;
        }
        Some(stats)
    }

    async fn sum_sizes(&self, items: Vec<MediaItem>) -> u64 {
        let metadata = self.metadata.clone();
        blocking(move || Ok(items.iter().filter_map(|i| metadata.byte_size(i)).sum::<u64>()))
            .await
            .unwrap_or(0)
    }

    /// Mark the item where it currently sits, drop it and request deletion
    pub async fn delete_current(&mut self, item: MediaItem) -> FinalizationOutcome {
        let position = self.media.iter().position(|m| *m == item).unwrap_or(self.media.len());
        self.remove_from_list(&item);
        self.mark_for_deletion(item, position);
        self.request_finalization().await
    }

    // ========================================
    // Loading
    // ========================================

    /// Load a batch unless one is already showing
    pub async fn load_media(&mut self) {
        if self.media.is_empty() {
            self.randomize(self.filter).await;
        }
    }

    /// Replace the feed with a fresh shuffled batch
    pub async fn randomize(&mut self, filter: MediaFilter) {
        let source = self.source.clone();
        let result = blocking(move || Ok(source.list(filter)?)).await;

        match result {
            Ok(items) => {
                let total = items.len();
                self.seed = self.seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
                let mut batch = shuffle(items, self.seed);
                batch.truncate(self.batch_size);
                tracing::info!(filter = %filter, total, batch = batch.len(), "Loaded media batch");
                self.media = batch;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load media");
                self.media.clear();
                self.emit(ControllerEvent::LoadFailed(e.user_message()));
            }
        }
        self.publish_media();
    }

    /// Switch the media type filter and load a new batch
    pub async fn set_filter(&mut self, filter: MediaFilter) {
        self.filter = filter;
        self.filter_tx.send_replace(filter);
        self.randomize(filter).await;
    }

    // ========================================
    // Favorites and statistics
    // ========================================

    /// Record `item` as a favorite. Returns whether it was newly added.
    pub async fn favorite(&mut self, item: &MediaItem) -> bool {
        tracing::info!(uri = item.uri(), "Favorited");
        let Some(favorites) = self.favorites.clone() else {
            return false;
        };

        let uri = item.uri().to_string();
        let mime = item.mime();
        match blocking(move || Ok(favorites.add(&uri, Some(mime))?)).await {
            Ok(added) => added,
            Err(e) => {
                tracing::error!(error = %e, "Failed to store favorite");
                false
            }
        }
    }

    /// Publish the current deletion statistics
    pub async fn show_settings(&mut self) -> SettingsInfo {
        let counters = self.counters.clone();
        let info = blocking(move || {
            Ok(SettingsInfo {
                deleted_count: counters.read_int(keys::DELETED_PHOTO_COUNT)?,
                deleted_size: counters.read_long(keys::DELETED_PHOTO_SIZE)?,
            })
        })
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to read deletion statistics");
            SettingsInfo::default()
        });

        self.settings_tx.send_replace(Some(info));
        info
    }

    /// The settings page consumed the snapshot
    pub fn on_settings_shown(&mut self) {
        self.settings_tx.send_replace(None);
    }
}
