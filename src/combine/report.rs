//! Combination summary types.
//!
//! Tracks per-dataset, per-split accounting for a combination run so users
//! can see exactly what was copied and what was skipped.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::Split;

/// The accounting result of a combination run.
///
/// One entry per source dataset, each with one counter set per split, in
/// the fixed split order. Accumulated during the single I/O pass and
/// read-only afterwards.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CombineSummary {
    pub datasets: Vec<DatasetSummary>,
}

impl CombineSummary {
    /// Create a zeroed summary covering the given datasets.
    pub fn new(dataset_paths: &[PathBuf]) -> Self {
        Self {
            datasets: dataset_paths
                .iter()
                .map(|path| DatasetSummary::new(path))
                .collect(),
        }
    }

    /// Counters for one (dataset, split) pair.
    pub fn counts(&self, dataset_index: usize, split: Split) -> &SplitCounts {
        &self.datasets[dataset_index].splits[split.index()].counts
    }

    pub(crate) fn counts_mut(&mut self, dataset_index: usize, split: Split) -> &mut SplitCounts {
        &mut self.datasets[dataset_index].splits[split.index()].counts
    }

    /// Total images copied across all datasets and splits.
    pub fn total_images(&self) -> usize {
        self.iter_counts().map(|c| c.images).sum()
    }

    /// Total label files written across all datasets and splits.
    pub fn total_labels(&self) -> usize {
        self.iter_counts().map(|c| c.labels).sum()
    }

    /// Total annotation lines and images skipped as invalid.
    pub fn total_invalid_labels(&self) -> usize {
        self.iter_counts().map(|c| c.invalid_labels).sum()
    }

    /// Total images skipped for a missing label file.
    pub fn total_missing_labels(&self) -> usize {
        self.iter_counts().map(|c| c.missing_labels).sum()
    }

    fn iter_counts(&self) -> impl Iterator<Item = &SplitCounts> {
        self.datasets
            .iter()
            .flat_map(|d| d.splits.iter().map(|s| &s.counts))
    }
}

impl fmt::Display for CombineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary of files in each dataset and split:")?;

        for dataset in &self.datasets {
            writeln!(f)?;
            writeln!(f, "Dataset: {}", dataset.path.display())?;
            for entry in &dataset.splits {
                writeln!(f, "  Split '{}':", entry.split)?;
                writeln!(f, "    Images processed: {}", entry.counts.images)?;
                writeln!(f, "    Labels processed: {}", entry.counts.labels)?;
                if entry.counts.missing_labels > 0 {
                    writeln!(
                        f,
                        "    Images skipped due to missing labels: {}",
                        entry.counts.missing_labels
                    )?;
                }
                if entry.counts.invalid_labels > 0 {
                    writeln!(
                        f,
                        "    Invalid labels skipped: {}",
                        entry.counts.invalid_labels
                    )?;
                }
            }
        }

        Ok(())
    }
}

/// Per-dataset accounting: one counter set per split.
#[derive(Clone, Debug, Serialize)]
pub struct DatasetSummary {
    pub path: PathBuf,
    pub splits: Vec<SplitSummary>,
}

impl DatasetSummary {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            splits: Split::ALL
                .iter()
                .map(|&split| SplitSummary {
                    split,
                    counts: SplitCounts::default(),
                })
                .collect(),
        }
    }
}

/// Counters for one split of one dataset.
#[derive(Clone, Debug, Serialize)]
pub struct SplitSummary {
    pub split: Split,
    #[serde(flatten)]
    pub counts: SplitCounts,
}

/// The four counters tracked per (dataset, split) pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SplitCounts {
    /// Images copied to the output.
    pub images: usize,
    /// Label files written to the output.
    pub labels: usize,
    /// Images skipped because no label file was found.
    pub missing_labels: usize,
    /// Annotation lines skipped as invalid, plus one per image dropped for
    /// having no valid lines left.
    pub invalid_labels: usize,
}
