//! Per-line label validation.
//!
//! A label line is `<class_id> <field_2> <field_3> <field_4> <field_5> ...`,
//! whitespace-separated. Validation checks structure and the class-ID range
//! against the unified vocabulary; geometry fields are passed through
//! verbatim and never interpreted.

use std::fmt;

/// A label line that passed validation.
#[derive(Debug, PartialEq)]
pub struct ValidLine<'a> {
    /// The original (per-dataset) class ID.
    pub class_id: usize,
    /// All tokens after the class ID, unchanged.
    pub fields: Vec<&'a str>,
}

/// Why a label line was rejected.
///
/// These are per-item skip conditions, never fatal; the combiner counts
/// them and surfaces each occurrence as a warning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineIssue {
    /// Fewer than 5 whitespace-separated fields.
    TooFewFields { found: usize },
    /// The first field did not parse as an integer.
    ClassIdNotInteger { token: String },
    /// The class ID is outside `[0, num_classes)`.
    ClassIdOutOfRange { class_id: i64, num_classes: usize },
    /// A declared-range check passed but the dataset's class mapping has no
    /// entry for this ID: the label references a class beyond the dataset's
    /// own declared list.
    UnmappedClassId { class_id: usize },
}

impl fmt::Display for LineIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineIssue::TooFewFields { found } => {
                write!(f, "line has {} field(s), at least 5 required", found)
            }
            LineIssue::ClassIdNotInteger { token } => {
                write!(f, "class ID '{}' is not an integer", token)
            }
            LineIssue::ClassIdOutOfRange {
                class_id,
                num_classes,
            } => write!(
                f,
                "class ID {} is outside the valid range 0..{}",
                class_id, num_classes
            ),
            LineIssue::UnmappedClassId { class_id } => write!(
                f,
                "class ID {} is not declared in the dataset's class list",
                class_id
            ),
        }
    }
}

/// Validate one label line against the unified vocabulary size.
///
/// On success returns the parsed original class ID plus the remaining
/// fields verbatim. Stateless; blank lines count as invalid (zero fields).
pub fn validate_label_line(line: &str, num_classes: usize) -> Result<ValidLine<'_>, LineIssue> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    if tokens.len() < 5 {
        return Err(LineIssue::TooFewFields {
            found: tokens.len(),
        });
    }

    let class_id: i64 = tokens[0]
        .parse()
        .map_err(|_| LineIssue::ClassIdNotInteger {
            token: tokens[0].to_string(),
        })?;

    if class_id < 0 || class_id as usize >= num_classes {
        return Err(LineIssue::ClassIdOutOfRange {
            class_id,
            num_classes,
        });
    }

    Ok(ValidLine {
        class_id: class_id as usize,
        fields: tokens[1..].to_vec(),
    })
}
