//! Class vocabulary handling: reading per-dataset class lists, normalizing
//! label names through a synonym table, and unifying vocabularies across
//! datasets.
//!
//! Unification is a pure, deterministic pass that runs to completion before
//! any image or label file is touched. It produces the global
//! [`UnifiedVocabulary`] plus one [`ClassMapping`] per source dataset; both
//! are immutable once built.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::MergeError;

/// Name of the manifest file expected at each dataset root (and written to
/// the combined output root).
pub const MANIFEST_FILE: &str = "data.yaml";

#[derive(Debug, Deserialize)]
struct DataYaml {
    names: DataYamlNames,
}

/// `names` appears in the wild both as a sequence and as an index mapping.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DataYamlNames {
    Sequence(Vec<String>),
    Mapping(BTreeMap<usize, String>),
}

/// Read the declared ordered class-name list from a dataset's `data.yaml`.
///
/// A missing manifest is fatal for the whole combination run: without it the
/// dataset's numeric class IDs cannot be interpreted.
pub fn read_class_names(dataset_root: &Path) -> Result<Vec<String>, MergeError> {
    let path = dataset_root.join(MANIFEST_FILE);
    if !path.is_file() {
        return Err(MergeError::ManifestMissing { path });
    }

    let data = fs::read_to_string(&path).map_err(MergeError::Io)?;
    let parsed: DataYaml =
        serde_yaml::from_str(&data).map_err(|source| MergeError::ManifestParse {
            path: path.clone(),
            source,
        })?;

    let names = match parsed.names {
        DataYamlNames::Sequence(names) => names,
        DataYamlNames::Mapping(mapping) => {
            if mapping.is_empty() {
                Vec::new()
            } else {
                let max_index = *mapping.keys().max().expect("checked non-empty");
                let mut names = vec![String::new(); max_index + 1];
                for (index, name) in mapping {
                    names[index] = name;
                }
                for (index, name) in names.iter_mut().enumerate() {
                    if name.trim().is_empty() {
                        *name = format!("class_{}", index);
                    }
                }
                names
            }
        }
    };

    Ok(names)
}

/// Maps raw class-name spellings to canonical names.
///
/// Names absent from the table pass through unchanged, so two datasets only
/// merge a class when the table says their spellings mean the same thing.
#[derive(Clone, Debug)]
pub struct SynonymTable {
    entries: BTreeMap<String, String>,
}

impl SynonymTable {
    /// Build a table from raw-name/canonical-name pairs.
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// An empty table: every name is its own canonical form.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Load a table from a YAML file containing a flat `raw: canonical`
    /// mapping.
    pub fn from_yaml_file(path: &Path) -> Result<Self, MergeError> {
        let data = fs::read_to_string(path).map_err(MergeError::Io)?;
        let entries: BTreeMap<String, String> =
            serde_yaml::from_str(&data).map_err(|source| MergeError::SynonymTableParse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self { entries })
    }

    /// Resolve a raw class name to its canonical form.
    pub fn normalize<'a>(&'a self, raw: &'a str) -> &'a str {
        self.entries.get(raw).map(String::as_str).unwrap_or(raw)
    }
}

impl Default for SynonymTable {
    /// The built-in handball merge policy: casing variants and
    /// domain-specific compounds collapse into shared role names.
    fn default() -> Self {
        let pairs = [
            ("ball", "ball"),
            ("Ball", "ball"),
            ("handball", "ball"),
            ("goalkeeper", "goalkeeper"),
            ("handballgoalkeeper", "goalkeeper"),
            ("players", "players"),
            ("player", "players"),
            ("handballplayer", "players"),
            ("Player", "players"),
            ("referees", "referees"),
            ("referee", "referees"),
            ("handballreferee", "referees"),
            ("referi", "referees"),
        ];
        Self::new(pairs.map(|(raw, canonical)| (raw.to_string(), canonical.to_string())))
    }
}

/// The deduplicated, ordered class vocabulary of the combined dataset.
///
/// Order is first-seen order of canonical names across the datasets, in the
/// caller-supplied dataset order; a class's index here is its unified ID.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnifiedVocabulary {
    names: Vec<String>,
}

impl UnifiedVocabulary {
    /// The canonical class names, indexed by unified ID.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of unified classes.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when no dataset declared any class.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Per-dataset mapping from original class ID to unified class ID.
///
/// Original IDs are 0-based and contiguous, so the mapping is a plain
/// vector indexed by original ID. Construction guarantees every declared
/// original ID has an entry and every target is a valid unified ID.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassMapping {
    targets: Vec<usize>,
}

impl ClassMapping {
    /// Look up the unified ID for an original class ID.
    ///
    /// Returns `None` only when a label file references an ID beyond the
    /// dataset's declared class list.
    pub fn get(&self, original_id: usize) -> Option<usize> {
        self.targets.get(original_id).copied()
    }

    /// Number of declared original classes.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// True when the dataset declared no classes.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Build the unified vocabulary and one [`ClassMapping`] per dataset.
///
/// `class_lists` must be in the caller's chosen dataset order; that order
/// determines unified-ID assignment and is preserved. Two classes that
/// normalize to the same canonical name receive the same unified ID.
pub fn unify_vocabularies(
    class_lists: &[Vec<String>],
    synonyms: &SynonymTable,
) -> (UnifiedVocabulary, Vec<ClassMapping>) {
    let mut names: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut mappings = Vec::with_capacity(class_lists.len());

    for class_list in class_lists {
        let mut targets = Vec::with_capacity(class_list.len());
        for raw in class_list {
            let canonical = synonyms.normalize(raw);
            let unified_id = match index.get(canonical) {
                Some(&id) => id,
                None => {
                    let id = names.len();
                    names.push(canonical.to_string());
                    index.insert(canonical.to_string(), id);
                    id
                }
            };
            targets.push(unified_id);
        }
        mappings.push(ClassMapping { targets });
    }

    (UnifiedVocabulary { names }, mappings)
}
