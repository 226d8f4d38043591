//! Cursor over the review feed

use app_fs::MediaItem;

/// Position in the current batch.
///
/// The index may sit one past the last item, which is the "end of batch"
/// card offering another batch.
#[derive(Debug, Clone, Default)]
pub struct FeedCursor {
    items: Vec<MediaItem>,
    index: usize,
}

impl FeedCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow a new snapshot of the media list.
    ///
    /// Stays on the current item if it is still present, otherwise keeps the
    /// index so the next item slides into place.
    pub fn sync(&mut self, items: Vec<MediaItem>) {
        let current = self.current().cloned();
        self.items = items;

        if let Some(pos) = current.and_then(|c| self.items.iter().position(|i| *i == c)) {
            self.index = pos;
        } else {
            self.index = self.index.min(self.items.len());
        }
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Jump to `index`, clamped to the end card
    pub fn set_index(&mut self, index: usize) {
        self.index = index.min(self.items.len());
    }

    pub fn current(&self) -> Option<&MediaItem> {
        self.items.get(self.index)
    }

    /// Past the last item
    pub fn at_end(&self) -> bool {
        self.index >= self.items.len()
    }

    /// Move to next item (or the end card)
    pub fn next(&mut self) -> bool {
        if self.index < self.items.len() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Move to previous item
    pub fn prev(&mut self) -> bool {
        if self.index > 0 {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    pub fn first(&mut self) {
        self.index = 0;
    }
}
