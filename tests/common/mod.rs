use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};

/// Writes a solid-color PNG with the given dimensions, creating parent
/// directories as needed.
pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    RgbImage::from_pixel(width, height, Rgb([200, 200, 200]))
        .save(path)
        .expect("write png file");
}

/// A small two-image manifest used across the integration suites.
///
/// Image 1 (0001.png, 100x100) has a "word" and a "character" annotation;
/// image 2 (0002.png, 100x100) has a single "sentence" annotation.
pub fn sample_manifest_json() -> &'static str {
    r#"{
        "images": [
            {"id": 1, "file_name": "0001.png", "width": 100, "height": 100},
            {"id": 2, "file_name": "0002.png", "width": 100, "height": 100}
        ],
        "annotations": [
            {"image_id": 1, "text": "abc", "bbox": [10, 10, 20, 20],
             "attributes": {"class": "word"}},
            {"image_id": 1, "text": "a", "bbox": [40, 40, 8, 8],
             "attributes": {"class": "character"}},
            {"image_id": 2, "text": "hello there", "bbox": [5, 5, 60, 20],
             "attributes": {"class": "sentence"}}
        ]
    }"#
}
