//! Media model: items, their kinds and the review filters

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use xxhash_rust::xxh3::xxh3_64;

const FILE_SCHEME: &str = "file://";

/// What kind of media an item is, fixed when the item is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Gif,
    Video,
}

impl MediaKind {
    /// Resolve kind and MIME type from a file extension
    pub fn from_extension(ext: &str) -> Option<(Self, &'static str)> {
        let found = match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => (MediaKind::Image, "image/jpeg"),
            "png" => (MediaKind::Image, "image/png"),
            "webp" => (MediaKind::Image, "image/webp"),
            "bmp" => (MediaKind::Image, "image/bmp"),
            "heic" | "heif" => (MediaKind::Image, "image/heif"),
            "gif" => (MediaKind::Gif, "image/gif"),
            "mp4" | "m4v" => (MediaKind::Video, "video/mp4"),
            "mov" => (MediaKind::Video, "video/quicktime"),
            "mkv" => (MediaKind::Video, "video/x-matroska"),
            "webm" => (MediaKind::Video, "video/webm"),
            "3gp" => (MediaKind::Video, "video/3gpp"),
            "avi" => (MediaKind::Video, "video/x-msvideo"),
            _ => return None,
        };
        Some(found)
    }

    pub fn is_video(self) -> bool {
        self == MediaKind::Video
    }
}

/// An opaque reference to a media resource.
///
/// Identity is the URI string; two items with the same URI are the same item
/// regardless of the kind recorded at load time.
#[derive(Debug, Clone)]
pub struct MediaItem {
    uri: String,
    kind: MediaKind,
    mime: &'static str,
}

impl MediaItem {
    pub fn new(uri: impl Into<String>, kind: MediaKind, mime: &'static str) -> Self {
        Self {
            uri: uri.into(),
            kind,
            mime,
        }
    }

    /// Build an item for a local file.
    ///
    /// `None` for unsupported extensions and for paths that are not valid
    /// UTF-8, which a URI could not map back to the file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let path = path.as_ref();
        let ext = path.extension()?.to_str()?;
        let (kind, mime) = MediaKind::from_extension(ext)?;
        let utf8 = path.to_str()?;
        Some(Self::new(format!("{}{}", FILE_SCHEME, utf8), kind, mime))
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    /// Hash-based ID, stable for the URI
    pub fn id(&self) -> u64 {
        xxh3_64(self.uri.as_bytes())
    }

    /// Local file path for `file://` items
    pub fn file_path(&self) -> Option<PathBuf> {
        self.uri.strip_prefix(FILE_SCHEME).map(PathBuf::from)
    }

    /// Display name (last path segment of the URI)
    pub fn name(&self) -> &str {
        self.uri.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(&self.uri)
    }
}

impl PartialEq for MediaItem {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

impl Eq for MediaItem {}

impl Hash for MediaItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
    }
}

impl fmt::Display for MediaItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

/// Media type filter offered by the review feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MediaFilter {
    /// Everything in the image store (stills and GIFs, no videos)
    #[default]
    #[serde(rename = "all")]
    All,
    /// JPEG and PNG stills
    #[serde(rename = "images")]
    Images,
    #[serde(rename = "gifs")]
    Gifs,
    #[serde(rename = "videos")]
    Videos,
}

impl MediaFilter {
    pub const ALL: [MediaFilter; 4] = [
        MediaFilter::All,
        MediaFilter::Images,
        MediaFilter::Gifs,
        MediaFilter::Videos,
    ];

    pub fn matches(self, item: &MediaItem) -> bool {
        match self {
            MediaFilter::All => matches!(item.kind(), MediaKind::Image | MediaKind::Gif),
            MediaFilter::Images => matches!(item.mime(), "image/jpeg" | "image/png"),
            MediaFilter::Gifs => item.kind() == MediaKind::Gif,
            MediaFilter::Videos => item.mime().starts_with("video/"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaFilter::All => "all",
            MediaFilter::Images => "images",
            MediaFilter::Gifs => "gifs",
            MediaFilter::Videos => "videos",
        }
    }
}

impl fmt::Display for MediaFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaFilter::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown filter '{}', expected all|images|gifs|videos", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_kind_detected_once_from_extension() {
        let jpg = MediaItem::from_path("/photos/a.JPG").unwrap();
        assert_eq!(jpg.kind(), MediaKind::Image);
        assert_eq!(jpg.mime(), "image/jpeg");

        let gif = MediaItem::from_path("/photos/b.gif").unwrap();
        assert_eq!(gif.kind(), MediaKind::Gif);

        let mov = MediaItem::from_path("/photos/c.mov").unwrap();
        assert!(mov.kind().is_video());

        assert!(MediaItem::from_path("/photos/notes.txt").is_none());
        assert!(MediaItem::from_path("/photos/no_extension").is_none());
    }

    #[test]
    fn test_identity_is_uri() {
        let a = MediaItem::new("file:///x/a.jpg", MediaKind::Image, "image/jpeg");
        let b = MediaItem::new("file:///x/a.jpg", MediaKind::Gif, "image/gif");
        assert_eq!(a, b);

        let set: HashSet<_> = [a.clone(), b].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert_eq!(a.id(), xxh3_64(b"file:///x/a.jpg"));
    }

    #[test]
    fn test_file_path_and_name() {
        let item = MediaItem::from_path("/x/y/photo.png").unwrap();
        assert_eq!(item.uri(), "file:///x/y/photo.png");
        assert_eq!(item.file_path(), Some(PathBuf::from("/x/y/photo.png")));
        assert_eq!(item.name(), "photo.png");

        let remote = MediaItem::new("content://media/external/images/42", MediaKind::Image, "image/jpeg");
        assert!(remote.file_path().is_none());
        assert_eq!(remote.name(), "42");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_path_is_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new("/x").join(OsStr::from_bytes(b"caf\xe9.jpg"));
        assert!(MediaItem::from_path(&path).is_none());
    }

    #[test]
    fn test_filters() {
        let jpg = MediaItem::from_path("/a.jpg").unwrap();
        let png = MediaItem::from_path("/a.png").unwrap();
        let webp = MediaItem::from_path("/a.webp").unwrap();
        let gif = MediaItem::from_path("/a.gif").unwrap();
        let mp4 = MediaItem::from_path("/a.mp4").unwrap();

        assert!(MediaFilter::All.matches(&jpg));
        assert!(MediaFilter::All.matches(&webp));
        assert!(MediaFilter::All.matches(&gif));
        assert!(!MediaFilter::All.matches(&mp4));

        assert!(MediaFilter::Images.matches(&jpg));
        assert!(MediaFilter::Images.matches(&png));
        assert!(!MediaFilter::Images.matches(&webp));
        assert!(!MediaFilter::Images.matches(&gif));

        assert!(MediaFilter::Gifs.matches(&gif));
        assert!(!MediaFilter::Gifs.matches(&jpg));

        assert!(MediaFilter::Videos.matches(&mp4));
        assert!(!MediaFilter::Videos.matches(&gif));
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!("Videos".parse::<MediaFilter>().unwrap(), MediaFilter::Videos);
        assert_eq!(" gifs ".parse::<MediaFilter>().unwrap(), MediaFilter::Gifs);
        assert!("movies".parse::<MediaFilter>().is_err());
    }
}
