use std::path::PathBuf;
use thiserror::Error;

use crate::manifest::ImageId;

/// The main error type for aihubconv operations.
///
/// Every variant here is fatal: it propagates to the CLI boundary and
/// terminates the run with a non-zero exit. Recoverable per-annotation
/// problems are reported through the error log and summaries instead.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse label manifest from {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Can't find input directory {0}")]
    InputDirMissing(PathBuf),

    #[error("Can't find label file {0}")]
    LabelFileMissing(PathBuf),

    #[error("Output directory {0} already exists")]
    OutputDirExists(PathBuf),

    #[error("Manifest '{array}' array is not sorted; the indexed-copy strategy requires sorted input")]
    UnsortedManifest { array: &'static str },

    #[error("Can't find an image record for file '{file_name}' in the label manifest")]
    UnmatchedFile { file_name: String },

    #[error("Image record {image_id} for file '{file_name}' has no usable annotation")]
    UnmatchedAnnotation {
        file_name: String,
        image_id: ImageId,
    },

    #[error("Failed to decode image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write cropped image {path}: {source}")]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Validation failed with {invalid} invalid annotation(s)")]
    ValidationFailed { invalid: usize },
}
