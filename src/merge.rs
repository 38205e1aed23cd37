//! @ai:module:intent Render an alignment of two annotated sequences into a reviewable merged file
//! @ai:module:layer domain
//! @ai:module:public_api synthesize, MergeReport, MergeBlock, MergeStats, MergeMarkers, NewAnnotationPolicy
//! @ai:module:depends_on annotation, align, error
//! @ai:module:stateless true

use crate::align::{OpTag, Opcode};
use crate::annotation::{AnnotatedSequence, AnnotatedUnit};
use crate::error::{Error, Result, Side};
use crate::marker::AnnotationPredicate;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// @ai:intent Sentinel lines delimiting changed regions in the merged output
/// @ai:invariant none of these should be valid content or annotation lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeMarkers {
    pub delete_header: String,
    pub insert_header: String,
    pub replace_header: String,
    pub replace_divider: String,
    pub block_end: String,
    pub new_annotations: String,
}

impl Default for MergeMarkers {
    fn default() -> Self {
        Self {
            delete_header: "<<<<<<< extremedoc: deleted".to_string(),
            insert_header: "<<<<<<< extremedoc: inserted".to_string(),
            replace_header: "<<<<<<< extremedoc: replaced".to_string(),
            replace_divider: "=======".to_string(),
            block_end: ">>>>>>> extremedoc".to_string(),
            new_annotations: "||||||| extremedoc: new annotations".to_string(),
        }
    }
}

impl MergeMarkers {
    fn header(&self, tag: OpTag) -> Option<&str> {
        match tag {
            OpTag::Equal => None,
            OpTag::Delete => Some(self.delete_header.as_str()),
            OpTag::Insert => Some(self.insert_header.as_str()),
            OpTag::Replace => Some(self.replace_header.as_str()),
        }
    }

    fn named(&self) -> [(&'static str, &str); 6] {
        [
            ("delete_header", self.delete_header.as_str()),
            ("insert_header", self.insert_header.as_str()),
            ("replace_header", self.replace_header.as_str()),
            ("replace_divider", self.replace_divider.as_str()),
            ("block_end", self.block_end.as_str()),
            ("new_annotations", self.new_annotations.as_str()),
        ]
    }

    /// @ai:intent Check whether a line opens or closes a merge block
    /// @ai:post the divider and the new-annotations marker never count; they read as plain text
    /// @ai:effects pure
    pub fn is_block_boundary(&self, line: &str) -> bool {
        line == self.delete_header
            || line == self.insert_header
            || line == self.replace_header
            || line == self.block_end
    }

    /// @ai:intent Reject sentinels that could be mistaken for content or annotations
    /// @ai:post Err(InvalidMarker) for a blank, duplicated or annotation-like sentinel
    /// @ai:effects pure
    pub fn validate<P: AnnotationPredicate + ?Sized>(&self, predicate: &P) -> Result<()> {
        let named = self.named();

        for (idx, &(name, marker)) in named.iter().enumerate() {
            let reason = if marker.trim().is_empty() {
                Some("is blank".to_string())
            } else if predicate.is_annotation(marker) {
                Some("is matched by the annotation pattern".to_string())
            } else {
                named[..idx]
                    .iter()
                    .find(|(_, other)| *other == marker)
                    .map(|(other, _)| format!("duplicates `{}`", other))
            };

            if let Some(reason) = reason {
                return Err(Error::InvalidMarker { name, reason });
            }
        }

        Ok(())
    }

    /// @ai:intent Find a sentinel left over from an earlier, unresolved merge
    /// @ai:post Some((1-based line, text)) for the first content line that opens or closes a block
    /// @ai:effects pure
    pub fn first_unresolved<'a>(&self, seq: &'a AnnotatedSequence) -> Option<(usize, &'a str)> {
        let mut line = 0;

        for unit in seq.units() {
            line += unit.annotations.len() + 1;
            if self.is_block_boundary(&unit.content) {
                return Some((line, unit.content.as_str()));
            }
        }

        None
    }
}

/// @ai:intent Which annotations of a new-side unit get surfaced on an unchanged line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewAnnotationPolicy {
    /// Only lines not already present among the old unit's annotations.
    #[default]
    Novel,
    All,
}

impl NewAnnotationPolicy {
    fn select<'a>(&self, old: &AnnotatedUnit, new: &'a AnnotatedUnit) -> Vec<&'a str> {
        new.annotations
            .iter()
            .filter(|line| match self {
                NewAnnotationPolicy::All => true,
                NewAnnotationPolicy::Novel => !old.annotations.contains(line),
            })
            .map(String::as_str)
            .collect()
    }
}

/// @ai:intent Rendered output for one alignment opcode
#[derive(Debug, Clone, Serialize)]
pub struct MergeBlock {
    pub tag: OpTag,
    pub old: Range<usize>,
    pub new: Range<usize>,
    pub lines: Vec<String>,
    /// Annotation lines surfaced from the new side (equal blocks only).
    pub new_annotations: usize,
}

/// @ai:intent Counters describing a merge run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub equal: usize,
    pub insert: usize,
    pub delete: usize,
    pub replace: usize,
    pub old_units: usize,
    pub new_units: usize,
    pub carried_annotations: usize,
    pub new_annotations: usize,
}

impl MergeStats {
    fn count(&mut self, op: &Opcode) {
        match op.tag {
            OpTag::Equal => self.equal += 1,
            OpTag::Insert => self.insert += 1,
            OpTag::Delete => self.delete += 1,
            OpTag::Replace => self.replace += 1,
        }
        self.old_units += op.i2 - op.i1;
        self.new_units += op.j2 - op.j1;
    }

    pub fn conflicts(&self) -> usize {
        self.insert + self.delete + self.replace
    }
}

/// @ai:intent Complete forward-merge result: ordered blocks plus counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
    pub blocks: Vec<MergeBlock>,
    pub stats: MergeStats,
}

impl MergeReport {
    /// @ai:intent Flatten all blocks into the merged file's lines
    /// @ai:effects pure
    pub fn lines(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .flat_map(|b| b.lines.iter().map(String::as_str))
            .collect()
    }

    /// @ai:intent True when nothing needs human attention
    /// @ai:post true iff every block is equal and no new annotation was surfaced
    pub fn is_clean(&self) -> bool {
        self.stats.conflicts() == 0 && self.stats.new_annotations == 0
    }
}

/// @ai:intent Render a forward merge from an opcode list
/// @ai:pre opcodes come from align() over old.contents() and new.contents()
/// @ai:post Err(AlignmentOutOfBounds) when any range exceeds its sequence
/// @ai:post old annotations of every equal pair appear verbatim and in order
/// @ai:effects pure
pub fn synthesize(
    old: &AnnotatedSequence,
    new: &AnnotatedSequence,
    opcodes: &[Opcode],
    markers: &MergeMarkers,
    policy: NewAnnotationPolicy,
) -> Result<MergeReport> {
    let mut report = MergeReport::default();

    for op in opcodes {
        let old_units = units_in(old, op, Side::Old)?;
        let new_units = units_in(new, op, Side::New)?;

        let mut block = MergeBlock {
            tag: op.tag,
            old: op.old_range(),
            new: op.new_range(),
            lines: Vec::new(),
            new_annotations: 0,
        };

        match op.tag {
            OpTag::Equal => {
                if old_units.len() != new_units.len() {
                    return Err(Error::MismatchedEqualRange {
                        old: op.old_range(),
                        new: op.new_range(),
                    });
                }

                for (old_unit, new_unit) in old_units.iter().zip(new_units) {
                    block.lines.extend(old_unit.annotations.iter().cloned());
                    report.stats.carried_annotations += old_unit.annotations.len();

                    let surfaced = policy.select(old_unit, new_unit);
                    if !surfaced.is_empty() {
                        block.lines.push(markers.new_annotations.clone());
                        block.new_annotations += surfaced.len();
                        block.lines.extend(surfaced.into_iter().map(str::to_string));
                    }

                    block.lines.push(new_unit.content.clone());
                }
            }
            OpTag::Delete | OpTag::Insert | OpTag::Replace => {
                if let Some(header) = markers.header(op.tag) {
                    block.lines.push(header.to_string());
                }

                push_units(&mut block.lines, old_units);
                if op.tag == OpTag::Replace {
                    block.lines.push(markers.replace_divider.clone());
                }
                push_units(&mut block.lines, new_units);

                block.lines.push(markers.block_end.clone());
            }
        }

        report.stats.count(op);
        report.stats.new_annotations += block.new_annotations;
        report.blocks.push(block);
    }

    Ok(report)
}

/// Bounds-checked slice of the units an opcode covers on one side.
fn units_in<'a>(seq: &'a AnnotatedSequence, op: &Opcode, side: Side) -> Result<&'a [AnnotatedUnit]> {
    let range = match side {
        Side::Old => op.old_range(),
        Side::New => op.new_range(),
    };

    seq.units()
        .get(range.clone())
        .ok_or(Error::AlignmentOutOfBounds {
            tag: op.tag.name(),
            side,
            range,
            len: seq.len(),
        })
}

fn push_units(lines: &mut Vec<String>, units: &[AnnotatedUnit]) {
    for unit in units {
        lines.extend(unit.lines().map(str::to_string));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::align;
    use crate::annotation::parse_lines;
    use pretty_assertions::assert_eq;

    fn hash_doc(line: &str) -> bool {
        line.starts_with("# ")
    }

    fn run(old: &[&str], new: &[&str], policy: NewAnnotationPolicy) -> MergeReport {
        let old = parse_lines(old.iter().copied(), &hash_doc);
        let new = parse_lines(new.iter().copied(), &hash_doc);
        let ops = align(&old.contents(), &new.contents());
        synthesize(&old, &new, &ops, &MergeMarkers::default(), policy).unwrap()
    }

    #[test]
    fn test_identical_files_carry_annotations() {
        let report = run(&["# doc A", "x=1", "x=2"], &["x=1", "x=2"], NewAnnotationPolicy::Novel);

        assert_eq!(report.blocks.len(), 1);
        assert_eq!(report.blocks[0].tag, OpTag::Equal);
        assert_eq!(report.lines(), vec!["# doc A", "x=1", "x=2"]);
        assert!(report.is_clean());
        assert_eq!(report.stats.carried_annotations, 1);
    }

    #[test]
    fn test_pure_insertion() {
        let report = run(&["x=1"], &["x=1", "x=2"], NewAnnotationPolicy::Novel);

        assert_eq!(report.blocks.len(), 2);
        assert_eq!(report.blocks[0].tag, OpTag::Equal);
        assert_eq!(report.blocks[1].tag, OpTag::Insert);
        assert_eq!(
            report.blocks[1].lines,
            vec!["<<<<<<< extremedoc: inserted", "x=2", ">>>>>>> extremedoc"]
        );
        assert!(!report.is_clean());
    }

    #[test]
    fn test_pure_deletion() {
        let report = run(&["# why", "x=1", "x=2"], &["x=1"], NewAnnotationPolicy::Novel);

        assert_eq!(
            report.lines(),
            vec![
                "# why",
                "x=1",
                "<<<<<<< extremedoc: deleted",
                "x=2",
                ">>>>>>> extremedoc"
            ]
        );
        assert_eq!(report.stats.delete, 1);
    }

    #[test]
    fn test_replace_lists_old_then_new() {
        let report = run(&["# old doc", "x=1"], &["y=2"], NewAnnotationPolicy::Novel);

        assert_eq!(report.blocks.len(), 1);
        assert_eq!(report.blocks[0].tag, OpTag::Replace);
        assert_eq!(
            report.lines(),
            vec![
                "<<<<<<< extremedoc: replaced",
                "# old doc",
                "x=1",
                "=======",
                "y=2",
                ">>>>>>> extremedoc"
            ]
        );
    }

    #[test]
    fn test_new_annotations_surfaced_after_old() {
        let report = run(
            &["# old", "x=1"],
            &["# old", "# fresh", "x=1"],
            NewAnnotationPolicy::Novel,
        );

        assert_eq!(
            report.lines(),
            vec!["# old", "||||||| extremedoc: new annotations", "# fresh", "x=1"]
        );
        assert_eq!(report.stats.new_annotations, 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_all_policy_repeats_known_annotations() {
        let report = run(&["# old", "x=1"], &["# old", "x=1"], NewAnnotationPolicy::All);

        assert_eq!(
            report.lines(),
            vec!["# old", "||||||| extremedoc: new annotations", "# old", "x=1"]
        );
    }

    #[test]
    fn test_novel_policy_hides_known_annotations() {
        let report = run(&["# old", "x=1"], &["# old", "x=1"], NewAnnotationPolicy::Novel);

        assert_eq!(report.lines(), vec!["# old", "x=1"]);
        assert!(report.is_clean());
    }

    #[test]
    fn test_totals_match_sequence_lengths() {
        let old = ["# a", "1", "2", "# b", "3", "4", "5"];
        let new = ["0", "1", "3", "# c", "4", "6", "7"];
        let report = run(&old, &new, NewAnnotationPolicy::Novel);

        assert_eq!(report.stats.old_units, 5);
        assert_eq!(report.stats.new_units, 6);
    }

    #[test]
    fn test_out_of_bounds_opcode_fails() {
        let old = parse_lines(["x=1"], &hash_doc);
        let new = parse_lines(["x=1"], &hash_doc);
        let ops = [Opcode::new(OpTag::Delete, 0, 3, 0, 0)];

        let err = synthesize(&old, &new, &ops, &MergeMarkers::default(), NewAnnotationPolicy::Novel)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::AlignmentOutOfBounds { side: Side::Old, len: 1, .. }
        ));
    }

    #[test]
    fn test_mismatched_equal_fails() {
        let old = parse_lines(["x=1", "x=2"], &hash_doc);
        let new = parse_lines(["x=1"], &hash_doc);
        let ops = [Opcode::new(OpTag::Equal, 0, 2, 0, 1)];

        let err = synthesize(&old, &new, &ops, &MergeMarkers::default(), NewAnnotationPolicy::Novel)
            .unwrap_err();

        assert!(matches!(err, Error::MismatchedEqualRange { .. }));
    }

    #[test]
    fn test_default_markers_are_valid() {
        assert!(MergeMarkers::default().validate(&hash_doc).is_ok());
    }

    #[test]
    fn test_blank_divider_rejected() {
        let markers = MergeMarkers {
            replace_divider: String::new(),
            ..Default::default()
        };

        let err = markers.validate(&hash_doc).unwrap_err();
        assert!(matches!(err, Error::InvalidMarker { name: "replace_divider", .. }));
    }

    #[test]
    fn test_marker_matching_annotation_pattern_rejected() {
        let markers = MergeMarkers {
            new_annotations: "# new annotations".to_string(),
            ..Default::default()
        };

        let err = markers.validate(&hash_doc).unwrap_err();
        assert!(matches!(err, Error::InvalidMarker { name: "new_annotations", .. }));
    }

    #[test]
    fn test_duplicate_markers_rejected() {
        let markers = MergeMarkers {
            block_end: "=======".to_string(),
            ..Default::default()
        };

        let err = markers.validate(&hash_doc).unwrap_err();
        assert!(matches!(err, Error::InvalidMarker { name: "block_end", .. }));
        assert!(err.to_string().contains("duplicates `replace_divider`"));
    }

    #[test]
    fn test_first_unresolved_reports_raw_line() {
        let seq = parse_lines(
            ["# doc", "x=1", "<<<<<<< extremedoc: inserted", "y=2", ">>>>>>> extremedoc"],
            &hash_doc,
        );

        assert_eq!(
            MergeMarkers::default().first_unresolved(&seq),
            Some((3, "<<<<<<< extremedoc: inserted"))
        );
        assert_eq!(
            MergeMarkers::default().first_unresolved(&parse_lines(["x=1"], &hash_doc)),
            None
        );
    }

    #[test]
    fn test_is_block_boundary() {
        let markers = MergeMarkers::default();
        assert!(markers.is_block_boundary("<<<<<<< extremedoc: replaced"));
        assert!(markers.is_block_boundary(">>>>>>> extremedoc"));
        assert!(!markers.is_block_boundary("======="));
        assert!(!markers.is_block_boundary("x = 1"));
    }
}
