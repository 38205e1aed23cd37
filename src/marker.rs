//! @ai:module:intent Recognize annotation lines by a caller-supplied predicate
//! @ai:module:layer domain
//! @ai:module:public_api AnnotationPredicate, MarkerPattern, DEFAULT_ANNOTATION_PATTERN
//! @ai:module:depends_on error
//! @ai:module:stateless true

use crate::error::Result;
use regex::Regex;

/// Extreme (`#E `) and negative (`#N `) comments, optionally indented.
pub const DEFAULT_ANNOTATION_PATTERN: &str = r"^\s*#[EN] ";

/// @ai:intent Decide whether a single line is an annotation rather than content
/// @ai:assumes implementations are pure functions of the line text
pub trait AnnotationPredicate {
    fn is_annotation(&self, line: &str) -> bool;
}

impl<F> AnnotationPredicate for F
where
    F: Fn(&str) -> bool,
{
    fn is_annotation(&self, line: &str) -> bool {
        self(line)
    }
}

/// @ai:intent Annotation predicate backed by a regular expression
#[derive(Debug, Clone)]
pub struct MarkerPattern {
    regex: Regex,
}

impl MarkerPattern {
    /// @ai:intent Compile an annotation pattern
    /// @ai:post Err(InvalidPattern) if the regex does not compile
    /// @ai:effects pure
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl Default for MarkerPattern {
    fn default() -> Self {
        Self {
            regex: Regex::new(DEFAULT_ANNOTATION_PATTERN).expect("Invalid regex"),
        }
    }
}

impl AnnotationPredicate for MarkerPattern {
    fn is_annotation(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }
}
