//! The conversion pipeline: scan, index, optionally crop, copy, manifest.
//!
//! One sequential pass per run, group by group, no backtracking. Fatal
//! conditions surface as [`ConvertError`] and leave any already-written
//! output in place (there is deliberately no rollback, and no merge with a
//! pre-existing output directory: re-running requires deleting the old
//! output first).

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::ValueEnum;
use image::GenericImageView;

use crate::error::ConvertError;
use crate::index::{FlatIndex, LinearIndex, RegionIndex, SortedIndex};
use crate::manifest::{self, Manifest};
use crate::scan;
use crate::validate::TextClass;

/// Name of the per-(group[,class]) label manifest file.
const LABELS_FILE: &str = "labels.txt";

/// Name of the run-level log of rejected annotations (crop strategy only).
const ERRORS_FILE: &str = "errors.txt";

/// How input files are matched to labels and materialized in the output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Copy whole images; match labels with a linear manifest scan.
    DirectCopy,
    /// Copy whole images; match labels by binary search over a sorted manifest.
    IndexedCopy,
    /// Crop one output image per labeled region, split by text class.
    CropAndSplit,
}

/// Options for one conversion run.
#[derive(Clone, Debug)]
pub struct ConvertOptions {
    /// Root directory of the input data, one subdirectory per group.
    pub input_path: PathBuf,
    /// Path of the JSON label manifest.
    pub label_file: PathBuf,
    /// Destination directory; must not exist yet.
    pub output_path: PathBuf,
    /// Conversion strategy.
    pub strategy: Strategy,
}

/// Outcome counts for one group.
#[derive(Clone, Debug, Default)]
pub struct GroupSummary {
    /// Group (subdirectory) name.
    pub name: String,
    /// Input files enumerated.
    pub files: usize,
    /// Manifest lines written, equal to the output files produced.
    pub lines: usize,
    /// Files skipped because they had no usable labels (crop strategy).
    pub skipped_files: usize,
    /// Regions skipped at crop time because the decoded image was smaller
    /// than the manifest declared.
    pub skipped_regions: usize,
    /// Wall-clock time spent on this group.
    pub elapsed: Duration,
}

/// Outcome of one conversion run.
#[derive(Clone, Debug, Default)]
pub struct ConvertSummary {
    pub groups: Vec<GroupSummary>,
    /// Annotations rejected at index-build time and written to errors.txt.
    pub invalid_annotations: usize,
}

impl fmt::Display for ConvertSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for group in &self.groups {
            writeln!(
                f,
                "group '{}': {} file(s), {} label line(s) written in {:.1}s",
                group.name,
                group.files,
                group.lines,
                group.elapsed.as_secs_f64()
            )?;
            if group.skipped_files > 0 {
                writeln!(f, "  {} file(s) skipped (no usable labels)", group.skipped_files)?;
            }
            if group.skipped_regions > 0 {
                writeln!(
                    f,
                    "  {} region(s) skipped (bbox outside decoded image)",
                    group.skipped_regions
                )?;
            }
        }
        if self.invalid_annotations > 0 {
            writeln!(
                f,
                "{} invalid annotation(s) recorded in {}",
                self.invalid_annotations, ERRORS_FILE
            )?;
        }
        Ok(())
    }
}

/// Runs one conversion end to end.
///
/// Preconditions (fatal on violation): the input directory and label file
/// exist, the output path does not. The label manifest is loaded and
/// indexed once, then every group is processed in sorted order.
pub fn run_convert(opts: &ConvertOptions) -> Result<ConvertSummary, ConvertError> {
    if !opts.input_path.is_dir() {
        return Err(ConvertError::InputDirMissing(opts.input_path.clone()));
    }
    if !opts.label_file.is_file() {
        return Err(ConvertError::LabelFileMissing(opts.label_file.clone()));
    }
    if opts.output_path.exists() {
        return Err(ConvertError::OutputDirExists(opts.output_path.clone()));
    }

    let groups = scan::list_groups(&opts.input_path)?;
    let manifest = manifest::read_manifest(&opts.label_file)?;

    match opts.strategy {
        Strategy::DirectCopy => {
            let index = FlatIndex::Linear(LinearIndex::new(&manifest));
            run_flat(opts, &groups, &index)
        }
        Strategy::IndexedCopy => {
            let index = FlatIndex::Sorted(SortedIndex::build(&manifest)?);
            run_flat(opts, &groups, &index)
        }
        Strategy::CropAndSplit => run_crop(opts, &groups, &manifest),
    }
}

/// Flat strategies: copy each file unchanged and write one label line per
/// file. A file without a matching image record or usable annotation is
/// fatal.
fn run_flat(
    opts: &ConvertOptions,
    groups: &[String],
    index: &FlatIndex<'_>,
) -> Result<ConvertSummary, ConvertError> {
    fs::create_dir_all(&opts.output_path)?;

    let mut summary = ConvertSummary::default();

    for group in groups {
        let start = Instant::now();
        let group_in = opts.input_path.join(group);
        let group_out = opts.output_path.join(group);
        fs::create_dir(&group_out)?;

        let files = scan::list_files(&group_in, Some(opts.label_file.as_path()))?;
        let mut labels = BufWriter::new(File::create(group_out.join(LABELS_FILE))?);
        let mut lines = 0usize;

        for file in &files {
            let label = index
                .lookup(file)
                .map_err(|miss| miss.into_error(file))?;
            fs::copy(group_in.join(file), group_out.join(file))?;
            writeln!(labels, "{}\t{}", file, label)?;
            lines += 1;
        }

        labels.flush()?;
        summary.groups.push(GroupSummary {
            name: group.clone(),
            files: files.len(),
            lines,
            elapsed: start.elapsed(),
            ..Default::default()
        });
    }

    Ok(summary)
}

/// Crop-and-split: one output image per validated region, dispatched into
/// `{group}_{class}` directories. Files without usable labels are skipped
/// with a warning; regions that don't fit the decoded image are skipped
/// and counted.
fn run_crop(
    opts: &ConvertOptions,
    groups: &[String],
    manifest: &Manifest,
) -> Result<ConvertSummary, ConvertError> {
    fs::create_dir_all(&opts.output_path)?;
    for group in groups {
        for class in TextClass::ALL {
            fs::create_dir(class_dir(&opts.output_path, group, class))?;
        }
    }

    let index = RegionIndex::build(manifest);

    let mut error_log = BufWriter::new(File::create(opts.output_path.join(ERRORS_FILE))?);
    for record in index.issues() {
        writeln!(error_log, "{}", record)?;
    }
    error_log.flush()?;

    let mut summary = ConvertSummary {
        invalid_annotations: index.issues().len(),
        ..Default::default()
    };

    for group in groups {
        let start = Instant::now();
        let group_in = opts.input_path.join(group);
        let mut writers = GroupWriters::open(&opts.output_path, group)?;

        let files = scan::list_files(&group_in, Some(opts.label_file.as_path()))?;
        let mut group_summary = GroupSummary {
            name: group.clone(),
            files: files.len(),
            ..Default::default()
        };

        for file in &files {
            let regions = match index.regions_for(file) {
                Some(regions) if !regions.is_empty() => regions,
                Some(_) => {
                    eprintln!("warning: '{}' has no valid annotations, skipping", file);
                    group_summary.skipped_files += 1;
                    continue;
                }
                None => {
                    eprintln!(
                        "warning: can't find '{}' in the label manifest, skipping",
                        file
                    );
                    group_summary.skipped_files += 1;
                    continue;
                }
            };

            let source = group_in.join(file);
            let img = image::open(&source).map_err(|err| ConvertError::ImageRead {
                path: source.clone(),
                source: err,
            })?;
            let (decoded_w, decoded_h) = img.dimensions();

            for (idx, region) in regions.iter().enumerate() {
                let output_name = region_file_name(file, idx);

                // The manifest's declared dimensions may not match the
                // actual file; re-check the crop window against the
                // decoded size before cutting.
                let (w, h) = (decoded_w as f64, decoded_h as f64);
                if region.bbox.x >= w
                    || region.bbox.y >= h
                    || region.bbox.xmax() >= w
                    || region.bbox.ymax() >= h
                {
                    eprintln!(
                        "warning: '{}' {} bbox {:?} exceeds decoded size {}x{}, skipping",
                        output_name, region.class, region.bbox, decoded_w, decoded_h
                    );
                    group_summary.skipped_regions += 1;
                    continue;
                }

                let (x, y, width, height) = region.bbox.to_pixel_rect();
                let crop = img.crop_imm(x, y, width, height);

                let target =
                    class_dir(&opts.output_path, group, region.class).join(&output_name);
                crop.save(&target).map_err(|err| ConvertError::ImageWrite {
                    path: target.clone(),
                    source: err,
                })?;

                writers.write_line(region.class, &output_name, &region.text)?;
                group_summary.lines += 1;
            }
        }

        writers.finish()?;
        group_summary.elapsed = start.elapsed();
        summary.groups.push(group_summary);
    }

    Ok(summary)
}

/// Output directory for one group and class: `{group}_{class}`.
fn class_dir(output_root: &Path, group: &str, class: TextClass) -> PathBuf {
    output_root.join(format!("{}_{}", group, class))
}

/// Output file name for the region at `idx` of `file`: `{stem}_{idx:03}.{ext}`.
/// The index runs across all of the file's regions, regardless of class.
fn region_file_name(file: &str, idx: usize) -> String {
    let path = Path::new(file);
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    match path.extension() {
        Some(ext) => format!("{}_{:03}.{}", stem, idx, ext.to_string_lossy()),
        None => format!("{}_{:03}", stem, idx),
    }
}

/// Scoped per-group label-file handles, one per text class.
///
/// Opened at the top of each group iteration and flushed before the next
/// group starts, so no manifest handle outlives the group it belongs to.
struct GroupWriters {
    writers: BTreeMap<TextClass, BufWriter<File>>,
}

impl GroupWriters {
    fn open(output_root: &Path, group: &str) -> Result<Self, ConvertError> {
        let mut writers = BTreeMap::new();
        for class in TextClass::ALL {
            let path = class_dir(output_root, group, class).join(LABELS_FILE);
            writers.insert(class, BufWriter::new(File::create(path)?));
        }
        Ok(Self { writers })
    }

    fn write_line(
        &mut self,
        class: TextClass,
        file_name: &str,
        label: &str,
    ) -> Result<(), ConvertError> {
        let writer = self
            .writers
            .get_mut(&class)
            .expect("a writer is opened for every class");
        writeln!(writer, "{}\t{}", file_name, label)?;
        Ok(())
    }

    fn finish(mut self) -> Result<(), ConvertError> {
        for writer in self.writers.values_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}
