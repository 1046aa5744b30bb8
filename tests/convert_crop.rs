//! Integration tests for the crop-and-split strategy.

use std::fs;
use std::path::Path;

use aihubconv::convert::{run_convert, ConvertOptions, Strategy};
use image::GenericImageView;

mod common;
use common::{sample_manifest_json, write_png};

fn setup(root: &Path) -> ConvertOptions {
    write_png(&root.join("input/group1/0001.png"), 100, 100);
    write_png(&root.join("input/group1/0002.png"), 100, 100);
    fs::write(root.join("input/labels.json"), sample_manifest_json()).expect("write manifest");

    ConvertOptions {
        input_path: root.join("input"),
        label_file: root.join("input/labels.json"),
        output_path: root.join("output"),
        strategy: Strategy::CropAndSplit,
    }
}

#[test]
fn crop_splits_regions_by_class() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let opts = setup(temp.path());

    let summary = run_convert(&opts).expect("conversion succeeds");

    assert_eq!(summary.groups.len(), 1);
    assert_eq!(summary.groups[0].lines, 3);
    assert_eq!(summary.invalid_annotations, 0);

    // 0001.png: region 0 is "word", region 1 is "character" -> syllable.
    assert!(opts.output_path.join("group1_word/0001_000.png").is_file());
    assert!(opts
        .output_path
        .join("group1_syllable/0001_001.png")
        .is_file());
    assert!(opts
        .output_path
        .join("group1_sentence/0002_000.png")
        .is_file());

    let word_labels =
        fs::read_to_string(opts.output_path.join("group1_word/labels.txt")).expect("read labels");
    assert_eq!(word_labels, "0001_000.png\tabc\n");

    let syllable_labels = fs::read_to_string(opts.output_path.join("group1_syllable/labels.txt"))
        .expect("read labels");
    assert_eq!(syllable_labels, "0001_001.png\ta\n");

    let sentence_labels = fs::read_to_string(opts.output_path.join("group1_sentence/labels.txt"))
        .expect("read labels");
    assert_eq!(sentence_labels, "0002_000.png\thello there\n");

    // No invalid annotations in the sample manifest.
    let errors = fs::read_to_string(opts.output_path.join("errors.txt")).expect("read errors");
    assert!(errors.is_empty());
}

#[test]
fn crops_have_the_bbox_dimensions() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let opts = setup(temp.path());

    run_convert(&opts).expect("conversion succeeds");

    let crop = image::open(opts.output_path.join("group1_word/0001_000.png"))
        .expect("decode cropped image");
    assert_eq!(crop.dimensions(), (20, 20));
}

#[test]
fn invalid_annotation_is_logged_not_written() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let mut opts = setup(temp.path());

    // x = 0 touches the image boundary: rejected at validation time.
    let manifest = r#"{
        "images": [{"id": 1, "file_name": "0001.png", "width": 100, "height": 100}],
        "annotations": [
            {"image_id": 1, "text": "edge", "bbox": [0, 10, 20, 20],
             "attributes": {"class": "word"}},
            {"image_id": 1, "text": "ok", "bbox": [30, 30, 20, 20],
             "attributes": {"class": "word"}}
        ]
    }"#;
    let label_file = temp.path().join("edge.json");
    fs::write(&label_file, manifest).expect("write manifest");
    opts.label_file = label_file;

    let summary = run_convert(&opts).expect("conversion succeeds");

    assert_eq!(summary.invalid_annotations, 1);
    // Only the valid region produced output; it got index 0.
    assert_eq!(summary.groups[0].lines, 1);
    assert!(opts.output_path.join("group1_word/0001_000.png").is_file());

    let labels =
        fs::read_to_string(opts.output_path.join("group1_word/labels.txt")).expect("read labels");
    assert_eq!(labels, "0001_000.png\tok\n");

    let errors = fs::read_to_string(opts.output_path.join("errors.txt")).expect("read errors");
    assert_eq!(errors.lines().count(), 1);
    assert!(errors.starts_with("[    1] '0001.png':"));

    // 0002.png doesn't exist in this manifest; the input file for it is
    // skipped with a warning rather than failing the run.
    assert_eq!(summary.groups[0].skipped_files, 1);
}

#[test]
fn region_exceeding_decoded_size_is_skipped() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let mut opts = setup(temp.path());

    // The manifest declares 200x200 but the actual file is 50x50. The bbox
    // passes validation against the declared size, then fails the decoded
    // bounds check.
    write_png(&temp.path().join("input/group2/0005.png"), 50, 50);
    let manifest = r#"{
        "images": [{"id": 5, "file_name": "0005.png", "width": 200, "height": 200}],
        "annotations": [
            {"image_id": 5, "text": "big", "bbox": [10, 10, 100, 100],
             "attributes": {"class": "word"}}
        ]
    }"#;
    let label_file = temp.path().join("oversize.json");
    fs::write(&label_file, manifest).expect("write manifest");
    opts.label_file = label_file;

    let summary = run_convert(&opts).expect("conversion succeeds");

    let group2 = summary
        .groups
        .iter()
        .find(|group| group.name == "group2")
        .expect("group2 summary");
    assert_eq!(group2.skipped_regions, 1);
    assert_eq!(group2.lines, 0);
    assert!(!opts.output_path.join("group2_word/0005_000.png").exists());

    let labels =
        fs::read_to_string(opts.output_path.join("group2_word/labels.txt")).expect("read labels");
    assert!(labels.is_empty());
}

#[test]
fn manifest_line_count_matches_valid_regions() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let opts = setup(temp.path());

    let summary = run_convert(&opts).expect("conversion succeeds");

    let mut total_lines = 0;
    for class in ["syllable", "word", "sentence"] {
        let labels = fs::read_to_string(
            opts.output_path.join(format!("group1_{}/labels.txt", class)),
        )
        .expect("read labels");
        for line in labels.lines() {
            let (name, _label) = line.split_once('\t').expect("tab-separated line");
            assert!(
                opts.output_path
                    .join(format!("group1_{}", class))
                    .join(name)
                    .is_file(),
                "missing output image for '{}'",
                name
            );
            total_lines += 1;
        }
    }
    assert_eq!(total_lines, summary.groups[0].lines);
}
