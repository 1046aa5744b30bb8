//! Per-annotation validation against manifest-declared image geometry.
//!
//! Validation rejects individual annotations without aborting anything:
//! callers collect the issues, count them, and write them to the run's
//! error log. A second, independent bounds check happens later at crop
//! time against the decoded image, because declared dimensions may not
//! match the actual file.

use std::fmt;

use crate::manifest::{AnnotationRecord, BBoxXYWH, ImageRecord};

/// Text granularity classes recognized in the source annotations.
///
/// The source data tags syllable-level boxes with the attribute value
/// `character`; both spellings map onto [`TextClass::Syllable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TextClass {
    Syllable,
    Word,
    Sentence,
}

impl TextClass {
    /// All classes, in output-directory order.
    pub const ALL: [TextClass; 3] = [TextClass::Syllable, TextClass::Word, TextClass::Sentence];

    /// Parses an `attributes.class` value. Returns `None` for anything
    /// outside the allowed set.
    pub fn from_attribute(raw: &str) -> Option<Self> {
        match raw {
            "character" | "syllable" => Some(TextClass::Syllable),
            "word" => Some(TextClass::Word),
            "sentence" => Some(TextClass::Sentence),
            _ => None,
        }
    }

    /// The name used for output directories and reporting.
    pub fn as_str(&self) -> &'static str {
        match self {
            TextClass::Syllable => "syllable",
            TextClass::Word => "word",
            TextClass::Sentence => "sentence",
        }
    }
}

impl fmt::Display for TextClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validated labeled sub-area of an image: the cropping unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub class: TextClass,
    pub text: String,
    pub bbox: BBoxXYWH,
}

/// A stable code identifying why an annotation was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegionIssueCode {
    /// The class attribute is missing or outside the allowed set.
    UnknownClass,
    /// The text label is missing or empty.
    EmptyText,
    /// The bbox is missing, degenerate, or not strictly inside the image.
    InvalidBBox,
}

/// One rejected annotation with a human-readable reason.
#[derive(Clone, Debug)]
pub struct RegionIssue {
    pub code: RegionIssueCode,
    pub message: String,
}

impl RegionIssue {
    fn new(code: RegionIssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for RegionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A rejected annotation as recorded in the error log, with the 1-based
/// sequential index it was assigned during index construction.
#[derive(Clone, Debug)]
pub struct RegionIssueRecord {
    pub index: usize,
    pub file_name: String,
    pub issue: RegionIssue,
}

impl fmt::Display for RegionIssueRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:5}] '{}': {}", self.index, self.file_name, self.issue)
    }
}

/// Validates one annotation against its image record.
///
/// Checks, in order: the class attribute parses to a [`TextClass`], the
/// text is present and non-empty, and the bbox is present and strictly
/// inside the declared image bounds (no side touching the boundary).
pub fn validate_region(
    annotation: &AnnotationRecord,
    image: &ImageRecord,
) -> Result<Region, RegionIssue> {
    let class = match annotation.attributes.class.as_deref() {
        Some(raw) => TextClass::from_attribute(raw).ok_or_else(|| {
            RegionIssue::new(
                RegionIssueCode::UnknownClass,
                format!("'{}' is not a valid class", raw),
            )
        })?,
        None => {
            return Err(RegionIssue::new(
                RegionIssueCode::UnknownClass,
                "annotation has no class attribute",
            ));
        }
    };

    let text = match annotation.text.as_deref() {
        Some(text) if !text.is_empty() => text,
        _ => {
            return Err(RegionIssue::new(
                RegionIssueCode::EmptyText,
                "text label is empty",
            ));
        }
    };

    let bbox = annotation.bbox.ok_or_else(|| {
        RegionIssue::new(RegionIssueCode::InvalidBBox, "annotation has no bbox")
    })?;

    if !bbox.fits_strictly_inside(image.width, image.height) {
        return Err(RegionIssue::new(
            RegionIssueCode::InvalidBBox,
            format!(
                "{:?} is invalid bbox info for a {}x{} image",
                bbox, image.width, image.height
            ),
        ));
    }

    Ok(Region {
        class,
        text: text.to_string(),
        bbox,
    })
}
