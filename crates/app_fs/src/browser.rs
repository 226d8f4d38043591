//! Media root browsing - walks a directory tree and collects supported media

use crate::{FsError, MediaItem, Result};
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// A listed media file with the file metadata gathered during the walk
#[derive(Debug, Clone)]
pub struct MediaEntry {
    pub item: MediaItem,
    pub size: u64,
    pub modified: Option<i64>,
}

/// Options for walking a media root
#[derive(Debug, Clone)]
pub struct ListOptions {
    pub show_hidden: bool,
    pub recursive: bool,
    /// Follow symlinked directories
    pub follow_links: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            show_hidden: false,
            recursive: true,
            follow_links: false,
        }
    }
}

/// List supported media under `root`, newest first.
///
/// Ties on modification time fall back to natural name order so the listing
/// is stable ("img2.jpg" before "img10.jpg").
pub fn list_media<P: AsRef<Path>>(root: P, options: &ListOptions) -> Result<Vec<MediaEntry>> {
    let root = root.as_ref();

    if !root.exists() {
        return Err(FsError::NotFound(root.display().to_string()));
    }

    if !root.is_dir() {
        return Err(FsError::InvalidPath(format!("Not a directory: {}", root.display())));
    }

    let max_depth = if options.recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(root)
        .follow_links(options.follow_links)
        .max_depth(max_depth)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || options.show_hidden || !is_hidden(e));

    let mut entries = Vec::new();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                // Unreadable subtrees are skipped, an unreadable root is an error
                if e.depth() == 0 {
                    return Err(e
                        .into_io_error()
                        .map(|io| FsError::from_io(io, root))
                        .unwrap_or_else(|| FsError::InvalidPath(root.display().to_string())));
                }
                tracing::debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(item) = MediaItem::from_path(entry.path()) else {
            if entry.path().to_str().is_none() {
                tracing::warn!("Skipping file with a non UTF-8 name: {:?}", entry.path());
            }
            continue;
        };

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };

        let modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64);

        entries.push(MediaEntry {
            item,
            size: metadata.len(),
            modified,
        });
    }

    sort_entries(&mut entries);
    tracing::debug!("Found {} media files under {}", entries.len(), root.display());

    Ok(entries)
}

/// Newest first, then natural name order
fn sort_entries(entries: &mut [MediaEntry]) {
    entries.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| natural_sort_key(a.item.name()).cmp(&natural_sort_key(b.item.name())))
    });
}

/// Generate a natural sort key (handles numbers correctly)
fn natural_sort_key(s: &str) -> Vec<NaturalSortPart> {
    let mut parts = Vec::new();
    let mut current_num = String::new();
    let mut current_str = String::new();

    for c in s.chars() {
        if c.is_ascii_digit() {
            if !current_str.is_empty() {
                parts.push(NaturalSortPart::Str(current_str.to_lowercase()));
                current_str.clear();
            }
            current_num.push(c);
        } else {
            if !current_num.is_empty() {
                if let Ok(n) = current_num.parse::<u64>() {
                    parts.push(NaturalSortPart::Num(n));
                }
                current_num.clear();
            }
            current_str.push(c);
        }
    }

    if !current_num.is_empty() {
        if let Ok(n) = current_num.parse::<u64>() {
            parts.push(NaturalSortPart::Num(n));
        }
    }
    if !current_str.is_empty() {
        parts.push(NaturalSortPart::Str(current_str.to_lowercase()));
    }

    parts
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum NaturalSortPart {
    Num(u64),
    Str(String),
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}
