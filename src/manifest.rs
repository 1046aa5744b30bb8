//! AIHub OCR label manifest schema and loading.
//!
//! The manifest is a single JSON document with two top-level arrays:
//! `images` (one record per image file, the source of truth for matching a
//! file on disk to its annotations) and `annotations` (one record per
//! labeled region, linked to its image via `image_id`).
//!
//! Parsing is deliberately permissive: `text`, `bbox` and `attributes.class`
//! are optional so that a malformed record still parses and can be rejected
//! by validation with a useful message, instead of aborting the whole load.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

/// A unique identifier for an image record in the manifest.
///
/// A newtype so image IDs can't be mixed up with plain counts or indices.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(pub u64);

impl ImageId {
    /// Creates a new ImageId.
    #[inline]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value.
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageId({})", self.0)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An entry in the manifest's `images` array.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Unique identifier referenced by annotations.
    pub id: ImageId,

    /// File name of the image on disk (no directory component).
    pub file_name: String,

    /// Declared width in pixels. May disagree with the actual file.
    pub width: u32,

    /// Declared height in pixels. May disagree with the actual file.
    pub height: u32,
}

/// An entry in the manifest's `annotations` array.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// ID of the image this annotation belongs to.
    pub image_id: ImageId,

    /// The transcribed text for this region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Region geometry as `[x, y, width, height]` in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBoxXYWH>,

    /// Additional attributes; only `class` is meaningful here.
    #[serde(default)]
    pub attributes: Attributes,
}

/// The `attributes` object of an annotation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Attributes {
    /// Text granularity tag ("character", "word" or "sentence").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

/// An axis-aligned box in `[x, y, width, height]` pixel format, `(x, y)`
/// being the top-left corner. This is the format the manifest uses on the
/// wire; it is serialized as a plain 4-element JSON array.
///
/// Like the rest of the schema this type does not enforce validity in the
/// constructor; validation reports bad geometry instead of refusing to
/// represent it.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BBoxXYWH {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BBoxXYWH {
    /// Creates a box from explicit components.
    #[inline]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns the maximum x coordinate (`x + width`).
    #[inline]
    pub fn xmax(&self) -> f64 {
        self.x + self.width
    }

    /// Returns the maximum y coordinate (`y + height`).
    #[inline]
    pub fn ymax(&self) -> f64 {
        self.y + self.height
    }

    /// Returns true if the box lies strictly inside an image of the given
    /// dimensions: positive origin and size, and no side touching or
    /// crossing the image boundary.
    pub fn fits_strictly_inside(&self, image_width: u32, image_height: u32) -> bool {
        let (w, h) = (image_width as f64, image_height as f64);
        self.x > 0.0
            && self.y > 0.0
            && self.width > 0.0
            && self.height > 0.0
            && self.x < w
            && self.y < h
            && self.xmax() < w
            && self.ymax() < h
    }

    /// Converts to an integer pixel rectangle `(x, y, width, height)` for
    /// cropping. Callers must have validated the box as in-bounds first.
    #[inline]
    pub fn to_pixel_rect(&self) -> (u32, u32, u32, u32) {
        (
            self.x as u32,
            self.y as u32,
            self.width as u32,
            self.height as u32,
        )
    }
}

impl From<[f64; 4]> for BBoxXYWH {
    fn from([x, y, width, height]: [f64; 4]) -> Self {
        Self::new(x, y, width, height)
    }
}

impl From<BBoxXYWH> for [f64; 4] {
    fn from(bbox: BBoxXYWH) -> Self {
        [bbox.x, bbox.y, bbox.width, bbox.height]
    }
}

impl fmt::Debug for BBoxXYWH {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.x, self.y, self.width, self.height
        )
    }
}

/// The complete label manifest.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// All image records.
    pub images: Vec<ImageRecord>,

    /// All annotation records, in original JSON order.
    pub annotations: Vec<AnnotationRecord>,
}

/// Reads a manifest from a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn read_manifest(path: &Path) -> Result<Manifest, ConvertError> {
    let file = File::open(path).map_err(ConvertError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| ConvertError::ManifestParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a manifest from a JSON string.
///
/// Useful for testing without file I/O.
pub fn from_manifest_str(json: &str) -> Result<Manifest, serde_json::Error> {
    serde_json::from_str(json)
}
