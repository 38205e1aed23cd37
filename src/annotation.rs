//! @ai:module:intent Group raw lines into units of leading annotations plus one content line
//! @ai:module:layer domain
//! @ai:module:public_api AnnotatedUnit, AnnotatedSequence, parse_lines
//! @ai:module:depends_on marker
//! @ai:module:stateless true

use crate::marker::AnnotationPredicate;
use serde::{Deserialize, Serialize};

/// @ai:intent One content line plus the annotation lines immediately above it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedUnit {
    pub annotations: Vec<String>,
    pub content: String,
}

impl AnnotatedUnit {
    pub fn new(annotations: Vec<String>, content: impl Into<String>) -> Self {
        Self {
            annotations,
            content: content.into(),
        }
    }

    /// @ai:intent Annotation lines followed by the content line, in source order
    /// @ai:effects pure
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.annotations
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.content.as_str()))
    }
}

/// @ai:intent An entire file version as an ordered list of annotated units
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotatedSequence {
    units: Vec<AnnotatedUnit>,
}

/// Unit under construction while lines are being consumed.
#[derive(Default)]
struct PendingUnit {
    annotations: Vec<String>,
}

impl PendingUnit {
    fn close(self, content: String) -> AnnotatedUnit {
        AnnotatedUnit {
            annotations: self.annotations,
            content,
        }
    }
}

/// @ai:intent Parse raw lines (newlines already stripped) into an annotated sequence
/// @ai:post every input line lands in exactly one unit, in order
/// @ai:post trailing annotations with no content line close a unit with empty content
/// @ai:example (["#E a", "x"]) -> [Unit{annotations: ["#E a"], content: "x"}]
/// @ai:example (["#E a"]) -> [Unit{annotations: ["#E a"], content: ""}]
/// @ai:effects pure
pub fn parse_lines<I, S, P>(lines: I, predicate: &P) -> AnnotatedSequence
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    P: AnnotationPredicate + ?Sized,
{
    let mut units = Vec::new();
    let mut pending: Option<PendingUnit> = None;

    for line in lines {
        let line = line.into();

        if predicate.is_annotation(&line) {
            pending
                .get_or_insert_with(PendingUnit::default)
                .annotations
                .push(line);
        } else {
            units.push(pending.take().unwrap_or_default().close(line));
        }
    }

    if let Some(unit) = pending {
        units.push(unit.close(String::new()));
    }

    AnnotatedSequence { units }
}

impl AnnotatedSequence {
    pub fn new(units: Vec<AnnotatedUnit>) -> Self {
        Self { units }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn units(&self) -> &[AnnotatedUnit] {
        &self.units
    }

    pub fn get(&self, index: usize) -> Option<&AnnotatedUnit> {
        self.units.get(index)
    }

    /// @ai:intent Project the sequence onto its content lines, index-aligned with the units
    /// @ai:post result.len() == self.len()
    /// @ai:effects pure
    pub fn contents(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.content.as_str()).collect()
    }

    /// @ai:intent Re-flatten units into raw lines (annotations before content)
    /// @ai:effects pure
    pub fn flatten(&self) -> Vec<String> {
        self.units
            .iter()
            .flat_map(AnnotatedUnit::lines)
            .map(str::to_string)
            .collect()
    }

    pub fn annotation_count(&self) -> usize {
        self.units.iter().map(|u| u.annotations.len()).sum()
    }
}
