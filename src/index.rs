//! Label lookup structures built from the manifest.
//!
//! Three builders cover the three conversion strategies:
//!
//! - [`LinearIndex`]: per-lookup linear scan. Correct for any input
//!   ordering, O(n·m) over a run.
//! - [`SortedIndex`]: binary search over the manifest's own array order.
//!   The sortedness precondition is checked once at build time and an
//!   unsorted manifest fails loudly, rather than silently matching the
//!   wrong records.
//! - [`RegionIndex`]: a complete `file_name -> regions` mapping built in
//!   one linear pass through a proper `image_id -> annotations` multimap,
//!   with no ordering assumptions about the source arrays.
//!
//! All indexes are built once per run and never mutated afterwards. When
//! several annotations share an `image_id`, the first record in original
//! JSON order wins (for flat lookups) or they are all kept in JSON order
//! (for the region index).

use std::collections::{BTreeMap, HashMap};

use crate::error::ConvertError;
use crate::manifest::{AnnotationRecord, ImageId, Manifest};
use crate::validate::{validate_region, Region, RegionIssueRecord};

/// Why a flat lookup found no label for a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupMiss {
    /// No image record carries this file name.
    ImageNotFound,
    /// The image record exists but has no annotation with usable text.
    AnnotationNotFound(ImageId),
}

impl LookupMiss {
    /// Attaches the file name that missed, producing the fatal error the
    /// flat strategies exit with.
    pub fn into_error(self, file_name: &str) -> ConvertError {
        match self {
            LookupMiss::ImageNotFound => ConvertError::UnmatchedFile {
                file_name: file_name.to_string(),
            },
            LookupMiss::AnnotationNotFound(image_id) => ConvertError::UnmatchedAnnotation {
                file_name: file_name.to_string(),
                image_id,
            },
        }
    }
}

/// Flat `file_name -> label` lookup with the strategy chosen at build time.
pub enum FlatIndex<'a> {
    Linear(LinearIndex<'a>),
    Sorted(SortedIndex<'a>),
}

impl<'a> FlatIndex<'a> {
    /// Returns the label text for a file, or why the lookup missed.
    pub fn lookup(&self, file_name: &str) -> Result<&'a str, LookupMiss> {
        match self {
            FlatIndex::Linear(index) => index.lookup(file_name),
            FlatIndex::Sorted(index) => index.lookup(file_name),
        }
    }
}

/// Linear-scan lookup over the raw manifest arrays.
pub struct LinearIndex<'a> {
    manifest: &'a Manifest,
}

impl<'a> LinearIndex<'a> {
    pub fn new(manifest: &'a Manifest) -> Self {
        Self { manifest }
    }

    /// Scans `images` for the file name, then `annotations` for the first
    /// record with that image ID and non-empty text.
    pub fn lookup(&self, file_name: &str) -> Result<&'a str, LookupMiss> {
        let image = self
            .manifest
            .images
            .iter()
            .find(|image| image.file_name == file_name)
            .ok_or(LookupMiss::ImageNotFound)?;

        self.manifest
            .annotations
            .iter()
            .filter(|ann| ann.image_id == image.id)
            .find_map(|ann| ann.text.as_deref().filter(|text| !text.is_empty()))
            .ok_or(LookupMiss::AnnotationNotFound(image.id))
    }
}

/// Binary-search lookup over the manifest's own array order.
///
/// Requires `images` sorted ascending by `file_name` and `annotations`
/// sorted ascending by `image_id`; [`SortedIndex::build`] verifies both
/// before any lookup can happen. Lookups take the element at the
/// lower-bound position, so ties resolve to the first record in array
/// order, matching the linear strategy.
pub struct SortedIndex<'a> {
    manifest: &'a Manifest,
}

impl<'a> SortedIndex<'a> {
    /// Checks the sortedness preconditions and wraps the manifest.
    pub fn build(manifest: &'a Manifest) -> Result<Self, ConvertError> {
        let images_sorted = manifest
            .images
            .windows(2)
            .all(|pair| pair[0].file_name <= pair[1].file_name);
        if !images_sorted {
            return Err(ConvertError::UnsortedManifest { array: "images" });
        }

        let annotations_sorted = manifest
            .annotations
            .windows(2)
            .all(|pair| pair[0].image_id <= pair[1].image_id);
        if !annotations_sorted {
            return Err(ConvertError::UnsortedManifest {
                array: "annotations",
            });
        }

        Ok(Self { manifest })
    }

    /// Floor-match binary search: images by file name, then annotations by
    /// image ID.
    pub fn lookup(&self, file_name: &str) -> Result<&'a str, LookupMiss> {
        let images = &self.manifest.images;
        let pos = images.partition_point(|image| image.file_name.as_str() < file_name);
        let image = images
            .get(pos)
            .filter(|image| image.file_name == file_name)
            .ok_or(LookupMiss::ImageNotFound)?;

        let annotations = &self.manifest.annotations;
        let pos = annotations.partition_point(|ann| ann.image_id < image.id);
        let annotation = annotations
            .get(pos)
            .filter(|ann| ann.image_id == image.id)
            .ok_or(LookupMiss::AnnotationNotFound(image.id))?;

        annotation
            .text
            .as_deref()
            .filter(|text| !text.is_empty())
            .ok_or(LookupMiss::AnnotationNotFound(image.id))
    }
}

/// Complete mapping from file name to its validated regions, for the
/// crop-and-split strategy.
///
/// Built once; read-only afterwards. Files whose annotations were all
/// rejected map to an empty slice, files with no annotations at all have
/// no entry. The distinction drives the two different skip warnings in
/// the pipeline.
pub struct RegionIndex {
    regions: BTreeMap<String, Vec<Region>>,
    issues: Vec<RegionIssueRecord>,
}

impl RegionIndex {
    /// Builds the index in one linear pass over the manifest.
    ///
    /// Rejected annotations are recorded with a 1-based sequential index
    /// in manifest image order; they never abort the build.
    pub fn build(manifest: &Manifest) -> Self {
        let mut by_image: HashMap<ImageId, Vec<&AnnotationRecord>> = HashMap::new();
        for annotation in &manifest.annotations {
            by_image
                .entry(annotation.image_id)
                .or_default()
                .push(annotation);
        }

        let mut regions = BTreeMap::new();
        let mut issues: Vec<RegionIssueRecord> = Vec::new();

        for image in &manifest.images {
            let Some(annotations) = by_image.get(&image.id) else {
                continue;
            };

            let mut valid = Vec::with_capacity(annotations.len());
            for annotation in annotations {
                match validate_region(annotation, image) {
                    Ok(region) => valid.push(region),
                    Err(issue) => issues.push(RegionIssueRecord {
                        index: issues.len() + 1,
                        file_name: image.file_name.clone(),
                        issue,
                    }),
                }
            }

            regions.insert(image.file_name.clone(), valid);
        }

        Self { regions, issues }
    }

    /// The validated regions for a file, in original JSON order.
    pub fn regions_for(&self, file_name: &str) -> Option<&[Region]> {
        self.regions.get(file_name).map(Vec::as_slice)
    }

    /// All rejected annotations, in the order they were assigned indices.
    pub fn issues(&self) -> &[RegionIssueRecord] {
        &self.issues
    }
}
