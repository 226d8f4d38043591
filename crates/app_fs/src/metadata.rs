//! Best-effort metadata for media items
//!
//! Every field is independently optional: any extraction failure means the
//! field is absent, never an error.

use crate::{MediaItem, MediaKind};
use chrono::NaiveDateTime;
use std::fmt;
use std::io::{BufRead, BufReader, Cursor, Seek};
use std::path::Path;

const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";
const DISPLAY_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// GPS position in signed decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for GeoCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lat_dir = if self.latitude >= 0.0 { 'N' } else { 'S' };
        let lon_dir = if self.longitude >= 0.0 { 'E' } else { 'W' };
        write!(
            f,
            "{:.5}°{}, {:.5}°{}",
            self.latitude.abs(),
            lat_dir,
            self.longitude.abs(),
            lon_dir
        )
    }
}

/// Capture time as recorded in EXIF
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTime {
    Parsed(NaiveDateTime),
    /// Present but not in the EXIF layout, shown verbatim
    Raw(String),
}

impl CaptureTime {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim_end_matches('\0').trim();
        match NaiveDateTime::parse_from_str(trimmed, EXIF_DATETIME_FORMAT) {
            Ok(dt) => CaptureTime::Parsed(dt),
            Err(_) => CaptureTime::Raw(trimmed.to_string()),
        }
    }
}

impl fmt::Display for CaptureTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureTime::Parsed(dt) => write!(f, "{}", dt.format(DISPLAY_DATETIME_FORMAT)),
            CaptureTime::Raw(s) => f.write_str(s),
        }
    }
}

/// Everything the detail page shows about an item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaDetails {
    pub byte_size: Option<u64>,
    pub dimensions: Option<(u32, u32)>,
    pub captured_at: Option<CaptureTime>,
    pub location: Option<GeoCoordinates>,
}

impl MediaDetails {
    /// Human-readable lines for the fields that are present
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(size) = self.byte_size.filter(|s| *s > 0) {
            lines.push(format!("File Size: {}", format_file_size(size)));
        }
        if let Some((w, h)) = self.dimensions {
            lines.push(format!("Size: {} x {}", w, h));
        }
        if let Some(date) = &self.captured_at {
            lines.push(format!("Date: {}", date));
        }
        if let Some(location) = &self.location {
            lines.push(format!("Location: {}", location));
        }
        lines
    }
}

/// Metadata collaborator
pub trait MetadataReader: Send + Sync {
    fn byte_size(&self, item: &MediaItem) -> Option<u64>;
    fn pixel_dimensions(&self, item: &MediaItem) -> Option<(u32, u32)>;
    fn capture_timestamp(&self, item: &MediaItem) -> Option<CaptureTime>;
    fn geo_coordinates(&self, item: &MediaItem) -> Option<GeoCoordinates>;

    fn details(&self, item: &MediaItem) -> MediaDetails {
        MediaDetails {
            byte_size: self.byte_size(item),
            dimensions: self.pixel_dimensions(item),
            captured_at: self.capture_timestamp(item),
            location: self.geo_coordinates(item),
        }
    }
}

/// Reads metadata from local files: file size, decoded header dimensions and EXIF
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifMetadataReader;

impl ExifMetadataReader {
    pub fn new() -> Self {
        Self
    }

    fn read_exif(item: &MediaItem) -> Option<exif::Exif> {
        if item.kind() == MediaKind::Video {
            return None;
        }
        let path = item.file_path()?;
        let file = std::fs::File::open(&path).ok()?;
        read_exif_from(&mut BufReader::new(file))
    }
}

impl MetadataReader for ExifMetadataReader {
    fn byte_size(&self, item: &MediaItem) -> Option<u64> {
        let path = item.file_path()?;
        std::fs::metadata(path).ok().map(|m| m.len())
    }

    fn pixel_dimensions(&self, item: &MediaItem) -> Option<(u32, u32)> {
        if item.kind() == MediaKind::Video {
            return None;
        }
        let path = item.file_path()?;
        image_dimensions_at(&path).or_else(|| exif_dimensions(&Self::read_exif(item)?))
    }

    fn capture_timestamp(&self, item: &MediaItem) -> Option<CaptureTime> {
        exif_capture_time(&Self::read_exif(item)?)
    }

    fn geo_coordinates(&self, item: &MediaItem) -> Option<GeoCoordinates> {
        exif_coordinates(&Self::read_exif(item)?)
    }

    fn details(&self, item: &MediaItem) -> MediaDetails {
        // One EXIF parse for all fields
        let exif = Self::read_exif(item);
        let dimensions = item
            .file_path()
            .filter(|_| item.kind() != MediaKind::Video)
            .and_then(|p| image_dimensions_at(&p))
            .or_else(|| exif.as_ref().and_then(exif_dimensions));

        MediaDetails {
            byte_size: self.byte_size(item),
            dimensions,
            captured_at: exif.as_ref().and_then(exif_capture_time),
            location: exif.as_ref().and_then(exif_coordinates),
        }
    }
}

/// Extract details from an in-memory copy of the file
pub fn details_from_bytes(kind: MediaKind, bytes: &[u8]) -> MediaDetails {
    if kind == MediaKind::Video {
        return MediaDetails {
            byte_size: Some(bytes.len() as u64),
            ..Default::default()
        };
    }

    let exif = read_exif_from(&mut Cursor::new(bytes));
    let dimensions = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()
        .and_then(|r| r.into_dimensions().ok())
        .filter(|(w, h)| *w > 0 && *h > 0)
        .or_else(|| exif.as_ref().and_then(exif_dimensions));

    MediaDetails {
        byte_size: Some(bytes.len() as u64),
        dimensions,
        captured_at: exif.as_ref().and_then(exif_capture_time),
        location: exif.as_ref().and_then(exif_coordinates),
    }
}

/// Format a byte count the way the review UI shows it
pub fn format_file_size(size: u64) -> String {
    let kb = size / 1024;
    let mb = kb / 1024;
    if mb > 0 {
        format!("{} MB", mb)
    } else if kb > 0 {
        format!("{} KB", kb)
    } else {
        format!("{} Bytes", size)
    }
}

fn read_exif_from<R: BufRead + Seek>(reader: &mut R) -> Option<exif::Exif> {
    exif::Reader::new().read_from_container(reader).ok()
}

fn image_dimensions_at(path: &Path) -> Option<(u32, u32)> {
    image::image_dimensions(path)
        .ok()
        .filter(|(w, h)| *w > 0 && *h > 0)
}

fn exif_dimensions(exif: &exif::Exif) -> Option<(u32, u32)> {
    let dim = |primary: exif::Tag, fallback: exif::Tag| {
        exif.get_field(primary, exif::In::PRIMARY)
            .or_else(|| exif.get_field(fallback, exif::In::PRIMARY))
            .and_then(|f| f.value.get_uint(0))
    };
    let width = dim(exif::Tag::PixelXDimension, exif::Tag::ImageWidth)?;
    let height = dim(exif::Tag::PixelYDimension, exif::Tag::ImageLength)?;
    (width > 0 && height > 0).then_some((width, height))
}

fn exif_capture_time(exif: &exif::Exif) -> Option<CaptureTime> {
    let field = exif
        .get_field(exif::Tag::DateTimeOriginal, exif::In::PRIMARY)
        .or_else(|| exif.get_field(exif::Tag::DateTime, exif::In::PRIMARY))?;

    match field.value {
        exif::Value::Ascii(ref values) => values
            .first()
            .map(|raw| CaptureTime::parse(&String::from_utf8_lossy(raw))),
        _ => None,
    }
}

fn exif_coordinates(exif: &exif::Exif) -> Option<GeoCoordinates> {
    let coordinate = |value_tag: exif::Tag, ref_tag: exif::Tag, negative: char| -> Option<f64> {
        let value = exif.get_field(value_tag, exif::In::PRIMARY)?;
        let reference = exif.get_field(ref_tag, exif::In::PRIMARY)?;
        let degrees = parse_gps_coordinate(&value.value)?;
        let is_negative = reference.display_value().to_string().contains(negative);
        Some(if is_negative { -degrees } else { degrees })
    };

    Some(GeoCoordinates {
        latitude: coordinate(exif::Tag::GPSLatitude, exif::Tag::GPSLatitudeRef, 'S')?,
        longitude: coordinate(exif::Tag::GPSLongitude, exif::Tag::GPSLongitudeRef, 'W')?,
    })
}

/// Degrees/minutes/seconds rationals to decimal degrees
fn parse_gps_coordinate(value: &exif::Value) -> Option<f64> {
    match value {
        exif::Value::Rational(rationals) if rationals.len() >= 3 => {
            let degrees = rationals[0].to_f64();
            let minutes = rationals[1].to_f64();
            let seconds = rationals[2].to_f64();
            let decimal = degrees + minutes / 60.0 + seconds / 3600.0;
            decimal.is_finite().then_some(decimal)
        }
        _ => None,
    }
}
