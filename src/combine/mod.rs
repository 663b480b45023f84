//! Dataset combination: the orchestration pass.
//!
//! Runs in two phases. The vocabulary phase reads every dataset's manifest
//! and fixes the unified vocabulary plus all class mappings; no file is
//! copied until it completes. The I/O phase then walks dataset → split →
//! image, validating and remapping each label file, copying images under
//! collision-free names, and accumulating the [`CombineSummary`].
//!
//! Per-image and per-line problems are counted and warned about, never
//! fatal. Manifest problems and filesystem errors abort the run; the
//! output directory may be left partially populated in that case.

mod report;

pub use report::{CombineSummary, DatasetSummary, SplitCounts, SplitSummary};

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::annotation::{validate_label_line, LineIssue};
use crate::error::MergeError;
use crate::vocab::{self, ClassMapping, SynonymTable, UnifiedVocabulary};

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "png", "jpeg", "bmp", "webp"];
const LABEL_EXTENSION: &str = "txt";
const IMAGES_DIR: &str = "images";
const LABELS_DIR: &str = "labels";

/// A named dataset partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    Train,
    Valid,
    Test,
}

impl Split {
    /// All splits, in processing order.
    pub const ALL: [Split; 3] = [Split::Train, Split::Valid, Split::Test];

    /// The split's directory name.
    pub fn as_str(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Valid => "valid",
            Split::Test => "test",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Split::Train => 0,
            Split::Valid => 1,
            Split::Test => 2,
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options controlling a combination run.
#[derive(Clone, Debug, Default)]
pub struct CombineOptions {
    /// Merge policy: which raw class names collapse into one canonical
    /// class.
    pub synonyms: SynonymTable,
}

/// The combined manifest written to the output root.
#[derive(Debug, Serialize)]
struct CombinedManifest {
    train: PathBuf,
    val: PathBuf,
    test: PathBuf,
    nc: usize,
    names: Vec<String>,
}

/// Combine the given datasets, in order, into one dataset at `output_root`.
///
/// Dataset order is significant: it determines unified-ID assignment and
/// the `dataset_index` used in destination filenames. Returns the
/// per-dataset, per-split accounting summary.
pub fn combine_datasets(
    dataset_paths: &[PathBuf],
    output_root: &Path,
    opts: &CombineOptions,
) -> Result<CombineSummary, MergeError> {
    // Vocabulary phase: every class mapping is fixed before any file I/O.
    let mut class_lists = Vec::with_capacity(dataset_paths.len());
    for dataset_path in dataset_paths {
        class_lists.push(vocab::read_class_names(dataset_path)?);
    }
    let (vocabulary, mappings) = vocab::unify_vocabularies(&class_lists, &opts.synonyms);

    for split in Split::ALL {
        let split_root = output_root.join(split.as_str());
        fs::create_dir_all(split_root.join(IMAGES_DIR)).map_err(MergeError::Io)?;
        fs::create_dir_all(split_root.join(LABELS_DIR)).map_err(MergeError::Io)?;
    }

    write_combined_manifest(output_root, &vocabulary)?;

    let mut summary = CombineSummary::new(dataset_paths);

    for (dataset_index, dataset_path) in dataset_paths.iter().enumerate() {
        for split in Split::ALL {
            combine_split(
                dataset_index,
                dataset_path,
                split,
                &mappings[dataset_index],
                vocabulary.len(),
                output_root,
                summary.counts_mut(dataset_index, split),
            )?;
        }
    }

    Ok(summary)
}

/// Process one (dataset, split) pair.
fn combine_split(
    dataset_index: usize,
    dataset_path: &Path,
    split: Split,
    mapping: &ClassMapping,
    num_classes: usize,
    output_root: &Path,
    counts: &mut SplitCounts,
) -> Result<(), MergeError> {
    let split_root = dataset_path.join(split.as_str());
    let images_dir = split_root.join(IMAGES_DIR);
    let labels_dir = split_root.join(LABELS_DIR);

    // A dataset may be missing a split entirely; skip, don't count.
    if !images_dir.is_dir() {
        eprintln!(
            "No images directory found for split '{}' in dataset: {}",
            split,
            dataset_path.display()
        );
        return Ok(());
    }
    if !labels_dir.is_dir() {
        eprintln!(
            "No labels directory found for split '{}' in dataset: {}",
            split,
            dataset_path.display()
        );
        return Ok(());
    }

    let images_output_dir = output_root.join(split.as_str()).join(IMAGES_DIR);
    let labels_output_dir = output_root.join(split.as_str()).join(LABELS_DIR);

    for image_path in list_files_with_extensions(&images_dir, &IMAGE_EXTENSIONS)? {
        let Some(image_name) = image_path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };

        let label_path = labels_dir.join(Path::new(image_name).with_extension(LABEL_EXTENSION));
        if !label_path.is_file() {
            eprintln!(
                "Warning: No label file found for image '{}' in dataset '{}', split '{}'. Skipping this image.",
                image_name,
                dataset_path.display(),
                split
            );
            counts.missing_labels += 1;
            continue;
        }

        let content = fs::read_to_string(&label_path).map_err(MergeError::Io)?;
        let rewritten = rewrite_label_lines(&content, &label_path, mapping, num_classes, counts);

        if rewritten.is_empty() {
            // An image with no usable annotations contributes nothing.
            eprintln!(
                "Warning: No valid labels found for image '{}' in dataset '{}', split '{}'. Skipping this image.",
                image_name,
                dataset_path.display(),
                split
            );
            counts.invalid_labels += 1;
            continue;
        }

        // dataset_index is unique per source dataset, so these names cannot
        // collide even when datasets share filenames.
        let dst_image_name = format!("{}_{}_{}", dataset_index, split, image_name);
        fs::copy(&image_path, images_output_dir.join(&dst_image_name)).map_err(MergeError::Io)?;
        counts.images += 1;

        let dst_label_name = Path::new(&dst_image_name).with_extension(LABEL_EXTENSION);
        let mut label_text = rewritten.join("\n");
        label_text.push('\n');
        fs::write(labels_output_dir.join(dst_label_name), label_text).map_err(MergeError::Io)?;
        counts.labels += 1;
    }

    Ok(())
}

/// Validate and remap every line of one label file, returning the
/// surviving rewritten lines. Invalid lines are counted and warned about.
fn rewrite_label_lines(
    content: &str,
    label_path: &Path,
    mapping: &ClassMapping,
    num_classes: usize,
    counts: &mut SplitCounts,
) -> Vec<String> {
    let mut rewritten = Vec::new();

    for (line_idx, line) in content.lines().enumerate() {
        let line_num = line_idx + 1;
        match validate_label_line(line, num_classes) {
            Ok(valid) => match mapping.get(valid.class_id) {
                Some(unified_id) => {
                    let mut out = unified_id.to_string();
                    for field in &valid.fields {
                        out.push(' ');
                        out.push_str(field);
                    }
                    rewritten.push(out);
                }
                // Reachable when a label references an ID beyond the
                // dataset's declared class list but inside the unified
                // range. Bad input, not a construction bug: skip, count.
                None => {
                    warn_invalid_line(
                        label_path,
                        line_num,
                        &LineIssue::UnmappedClassId {
                            class_id: valid.class_id,
                        },
                    );
                    counts.invalid_labels += 1;
                }
            },
            Err(issue) => {
                warn_invalid_line(label_path, line_num, &issue);
                counts.invalid_labels += 1;
            }
        }
    }

    rewritten
}

fn warn_invalid_line(label_path: &Path, line_num: usize, issue: &LineIssue) {
    eprintln!(
        "Warning: Invalid label in '{}' at line {}: {}",
        label_path.display(),
        line_num,
        issue
    );
}

/// Write the combined `data.yaml` describing the unified vocabulary and
/// the three split image directories.
fn write_combined_manifest(
    output_root: &Path,
    vocabulary: &UnifiedVocabulary,
) -> Result<(), MergeError> {
    let manifest = CombinedManifest {
        train: output_root.join(Split::Train.as_str()).join(IMAGES_DIR),
        val: output_root.join(Split::Valid.as_str()).join(IMAGES_DIR),
        test: output_root.join(Split::Test.as_str()).join(IMAGES_DIR),
        nc: vocabulary.len(),
        names: vocabulary.names().to_vec(),
    };

    let path = output_root.join(vocab::MANIFEST_FILE);
    let yaml = serde_yaml::to_string(&manifest).map_err(|source| MergeError::ManifestWrite {
        path: path.clone(),
        source,
    })?;
    fs::write(&path, yaml).map_err(MergeError::Io)
}

/// List the regular files directly inside `dir` whose extension matches,
/// case-insensitively. Sorted by name so warnings come out in a stable
/// order; outputs do not depend on this order.
fn list_files_with_extensions(
    dir: &Path,
    extensions: &[&str],
) -> Result<Vec<PathBuf>, MergeError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = entry.map_err(|source| MergeError::DirRead {
            path: dir.to_path_buf(),
            source,
        })?;

        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}
