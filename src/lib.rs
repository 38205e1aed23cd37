//! @ai:module:intent Keep an annotated copy of a source file in step with its clean copy
//! @ai:module:layer infrastructure
//! @ai:module:public_api annotation, align, merge, forward, strip, tree, marker, config, output, error
//! @ai:module:stateless true
//!
//! # extremedoc
//!
//! An annotated file interleaves extra comment lines (`#E ` and `#N ` by
//! default) with the code of a clean file. When the clean file moves on, a
//! forward merge carries the annotations onto the new code and marks every
//! place where old and new code diverged, so a human can finish the job.
//! Stripping the annotations again yields the clean file.
//!
//! ## Example
//!
//! ```rust
//! use extremedoc::{forward_merge, MarkerPattern, MergeConfig};
//!
//! let old = ["#E Counts requests.", "count = 0"];
//! let new = ["count = 0", "limit = 10"];
//!
//! let report = forward_merge(old, new, &MarkerPattern::default(), &MergeConfig::default()).unwrap();
//! assert_eq!(report.lines()[..2], ["#E Counts requests.", "count = 0"]);
//! assert!(!report.is_clean());
//! ```

pub mod align;
pub mod annotation;
pub mod config;
pub mod error;
pub mod forward;
pub mod marker;
pub mod merge;
pub mod output;
pub mod strip;
pub mod textfile;
pub mod tree;

pub use align::{align, matching_blocks, MatchingBlock, OpTag, Opcode};
pub use annotation::{parse_lines, AnnotatedSequence, AnnotatedUnit};
pub use config::{MergeConfig, WhitespaceMode};
pub use error::{Error, Result, Side};
pub use forward::{forward_merge, merge_files, write_report};
pub use marker::{AnnotationPredicate, MarkerPattern, DEFAULT_ANNOTATION_PATTERN};
pub use merge::{synthesize, MergeBlock, MergeMarkers, MergeReport, MergeStats, NewAnnotationPolicy};
pub use output::{format_report, format_summary, format_tree_summary, format_units, OutputFormat};
pub use strip::{strip_file, strip_lines};
pub use tree::{forward_tree, strip_tree, FileOutcome, FileStatus, TreeSummary};
