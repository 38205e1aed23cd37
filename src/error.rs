//! @ai:module:intent Define error types for parsing, aligning and merging annotated files
//! @ai:module:layer domain
//! @ai:module:public_api Error, Result, Side
//! @ai:module:stateless true

use serde::Serialize;
use std::fmt;
use std::ops::Range;
use std::path::PathBuf;
use thiserror::Error;

/// @ai:intent Which of the two file versions an index range refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Old,
    New,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Old => f.write_str("old"),
            Side::New => f.write_str("new"),
        }
    }
}

/// @ai:intent Unified error type for all extremedoc operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: input is not valid UTF-8 text")]
    Decode { path: PathBuf, line: usize },

    #[error("Invalid annotation pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("merge stage: `{tag}` operation range {range:?} is outside the {side} sequence of {len} units")]
    AlignmentOutOfBounds {
        tag: &'static str,
        side: Side,
        range: Range<usize>,
        len: usize,
    },

    #[error("merge stage: `equal` operation pairs old {old:?} with new {new:?} of different length")]
    MismatchedEqualRange { old: Range<usize>, new: Range<usize> },

    #[error("Invalid merge marker `{name}`: {reason}")]
    InvalidMarker { name: &'static str, reason: String },

    #[error("Old file line {line} still holds a marker from an unresolved merge: `{text}`")]
    UnresolvedMarker { line: usize, text: String },

    #[error("Invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds_names_stage_and_range() {
        let err = Error::AlignmentOutOfBounds {
            tag: "delete",
            side: Side::Old,
            range: 3..7,
            len: 5,
        };

        assert_eq!(
            err.to_string(),
            "merge stage: `delete` operation range 3..7 is outside the old sequence of 5 units"
        );
    }
}
